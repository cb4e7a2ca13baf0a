use serde::Serialize;

use crate::{candidate::SearchHit, query::ParsedQuery};

/// Signal weights applied to `(embedding, color, plate)`. Always sum to `1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Weights {
	pub embed: f32,
	pub color: f32,
	pub plate: f32,
}
impl Weights {
	/// Picks the weight row from which signals actually fired, not from what the query asked for.
	pub fn for_signals(color_score: f32, plate_score: f32) -> Self {
		match (color_score > 0.0, plate_score > 0.0) {
			(false, false) => Self { embed: 1.0, color: 0.0, plate: 0.0 },
			(true, false) => Self { embed: 0.6, color: 0.4, plate: 0.0 },
			(false, true) => Self { embed: 0.4, color: 0.0, plate: 0.6 },
			(true, true) => Self { embed: 0.4, color: 0.2, plate: 0.4 },
		}
	}
}

pub fn combine(embed_score: f32, color_score: f32, plate_score: f32) -> f32 {
	let weights = Weights::for_signals(color_score, plate_score);

	if weights.color == 0.0 && weights.plate == 0.0 {
		return embed_score;
	}

	weights.embed * embed_score + weights.color * color_score + weights.plate * plate_score
}

/// Acceptance predicate for scored hits. `embed_sim_min` and the signal-presence gates stay fixed
/// while `final_min` is relaxed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitFilter {
	pub embed_sim_min: f32,
	pub final_min: f32,
	pub require_color: bool,
	pub require_plate: bool,
}
impl HitFilter {
	pub fn for_query(query: &ParsedQuery, embed_sim_min: f32, final_min: f32) -> Self {
		Self {
			embed_sim_min,
			final_min,
			require_color: query.has_color(),
			require_plate: query.has_plate(),
		}
	}

	pub fn with_final_min(self, final_min: f32) -> Self {
		Self { final_min, ..self }
	}

	pub fn admits(&self, hit: &SearchHit) -> bool {
		if hit.embed_score < self.embed_sim_min {
			return false;
		}
		if self.require_color && hit.color_score <= 0.0 {
			return false;
		}
		if self.require_plate && hit.plate_score <= 0.0 {
			return false;
		}

		hit.final_score >= self.final_min
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn weight_rows_sum_to_one() {
		for (color, plate) in [(0.0, 0.0), (0.5, 0.0), (0.0, 0.5), (0.5, 0.5)] {
			let w = Weights::for_signals(color, plate);

			assert!((w.embed + w.color + w.plate - 1.0).abs() < 1e-6);
		}
	}

	#[test]
	fn embedding_only_passes_through_unchanged() {
		for embed in [0.0, 0.123_456, 0.3, 0.999_9, 1.0] {
			assert_eq!(combine(embed, 0.0, 0.0), embed);
		}
	}

	#[test]
	fn color_and_plate_use_the_joint_row() {
		let combined = combine(0.5, 1.0, 1.0);

		assert!((combined - (0.4 * 0.5 + 0.2 + 0.4)).abs() < 1e-6);
	}
}
