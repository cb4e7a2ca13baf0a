use crate::{Error, Result};

/// Cosine similarity of two vectors from the same embedding space.
///
/// Returns `0.0` when either vector has zero norm. Accumulates in `f64` so `cosine(v, v)` is
/// exactly `1.0` for any non-zero `v`.
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> Result<f32> {
	if left.len() != right.len() {
		return Err(Error::VectorLengthMismatch { left: left.len(), right: right.len() });
	}

	let mut dot = 0.0_f64;
	let mut left_norm = 0.0_f64;
	let mut right_norm = 0.0_f64;

	for (a, b) in left.iter().zip(right) {
		let (a, b) = (f64::from(*a), f64::from(*b));

		dot += a * b;
		left_norm += a * a;
		right_norm += b * b;
	}

	if left_norm == 0.0 || right_norm == 0.0 {
		return Ok(0.0);
	}

	Ok((dot / (left_norm * right_norm).sqrt()).clamp(-1.0, 1.0) as f32)
}

pub fn is_finite_vector(vec: &[f32]) -> bool {
	vec.iter().all(|value| value.is_finite())
}
