use std::cmp::Ordering;

use argus_domain::{
	candidate::{FrameCandidate, ObjectAttributes, ObjectCandidate, SearchHit},
	color::{self, ColorName, Hsv},
	plate,
	query::{ColorIntent, ParsedQuery},
	score::HitFilter,
	vector,
};

use crate::search::SearchStage;

// Relaxation levels are rounded to this many decimal places.
const LEVEL_SCALE: f64 = 1_000_000.0;
/// Upper bound on the number of relaxation levels tried after the requested threshold.
pub const MAX_RELAXATION_STEPS: u32 = 100;

/// A hit together with its unclamped cosine similarity. The reported `embed_score` is clamped to
/// [0,1]; the fallback orders on `similarity` so negative cosines keep their ranking.
#[derive(Debug, Clone)]
pub struct ScoredHit {
	pub hit: SearchHit,
	pub similarity: f32,
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

/// Thresholds tried, in order, after `final_min` itself admits nothing: `final_min - k * step` for
/// `k = 1, 2, ...` while the level stays at or above zero, at most [`MAX_RELAXATION_STEPS`] levels.
pub fn relaxation_levels(final_min: f32, step: f32) -> Vec<f32> {
	if !final_min.is_finite() || !step.is_finite() || final_min <= 0.0 || step <= 0.0 {
		return Vec::new();
	}

	let final_min = f64::from(final_min);
	let step = f64::from(step);
	let steps = ((final_min / step + 1e-6).floor() as u32).min(MAX_RELAXATION_STEPS);

	(1..=steps)
		.map(|k| {
			let level = final_min - f64::from(k) * step;

			((level * LEVEL_SCALE).round() / LEVEL_SCALE).max(0.0) as f32
		})
		.collect()
}

/// Scores frames by embedding similarity alone. Candidates whose vector is unusable are skipped.
pub fn score_frames(query_vec: &[f32], candidates: &[FrameCandidate]) -> Vec<ScoredHit> {
	let mut hits = Vec::with_capacity(candidates.len());

	for candidate in candidates {
		let Some(similarity) = embedding_score(query_vec, &candidate.vector) else {
			tracing::warn!(
				frame_id = %candidate.frame_id,
				query_dim = query_vec.len(),
				candidate_dim = candidate.vector.len(),
				"Skipping frame with unusable vector."
			);

			continue;
		};

		hits.push(ScoredHit { hit: SearchHit::frame(candidate, similarity), similarity });
	}

	hits
}

pub fn score_objects(
	parsed: &ParsedQuery,
	query_vec: &[f32],
	candidates: &[ObjectCandidate],
) -> Vec<ScoredHit> {
	let mut hits = Vec::with_capacity(candidates.len());

	for candidate in candidates {
		let Some(similarity) = embedding_score(query_vec, &candidate.vector) else {
			tracing::warn!(
				object_id = %candidate.object_id,
				query_dim = query_vec.len(),
				candidate_dim = candidate.vector.len(),
				"Skipping object with unusable vector."
			);

			continue;
		};
		let color = color_score(&parsed.color, &candidate.attributes);
		let plate = plate_score(parsed.plate.as_deref(), &candidate.attributes);

		hits.push(ScoredHit {
			hit: SearchHit::object(candidate, similarity, color, plate),
			similarity,
		});
	}

	hits
}

/// Color agreement between the query intent and stored attributes. Missing or malformed HSV
/// values contribute nothing.
///
/// Person colors average over the garment regions that have a usable stored value: both regions
/// for a generic color, the requested ones for a split color.
pub fn color_score(intent: &ColorIntent, attributes: &ObjectAttributes) -> f32 {
	match (intent, attributes) {
		(ColorIntent::None, _) => 0.0,
		(ColorIntent::Generic { color }, ObjectAttributes::Transport { color_hsv, .. }) =>
			region_score(*color, color_hsv.as_deref()).unwrap_or(0.0),
		(ColorIntent::Generic { color }, ObjectAttributes::Person { upper_hsv, lower_hsv }) =>
			average_regions([
				region_score(*color, upper_hsv.as_deref()),
				region_score(*color, lower_hsv.as_deref()),
			]),
		(ColorIntent::Split { upper, lower }, ObjectAttributes::Person { upper_hsv, lower_hsv }) =>
			average_regions([
				upper.and_then(|color| region_score(color, upper_hsv.as_deref())),
				lower.and_then(|color| region_score(color, lower_hsv.as_deref())),
			]),
		(ColorIntent::Split { .. }, ObjectAttributes::Transport { .. }) => 0.0,
	}
}

pub fn plate_score(query_plate: Option<&str>, attributes: &ObjectAttributes) -> f32 {
	match (query_plate, attributes) {
		(Some(query), ObjectAttributes::Transport { plate: Some(stored), .. }) =>
			plate::plate_score(query, stored),
		_ => 0.0,
	}
}

/// Applies `filter`, then each relaxation level, and finally the embedding-only fallback.
///
/// Filtered results are sorted by final score descending and the fallback by raw similarity
/// descending. Sorts are stable, so ties keep candidate arrival order.
pub fn select(
	hits: &[ScoredHit],
	filter: HitFilter,
	levels: &[f32],
	fallback_top_k: usize,
) -> (Vec<SearchHit>, SearchStage) {
	if hits.is_empty() {
		return (Vec::new(), SearchStage::Empty);
	}

	let strict = admitted(hits, filter);

	if !strict.is_empty() {
		return (strict, SearchStage::Strict);
	}

	for &level in levels {
		let relaxed = admitted(hits, filter.with_final_min(level));

		if !relaxed.is_empty() {
			return (relaxed, SearchStage::Relaxed { final_min: level });
		}
	}

	let mut fallback = hits.to_vec();

	fallback.sort_by(|a, b| cmp_f32_desc(a.similarity, b.similarity));
	fallback.truncate(fallback_top_k);

	(fallback.into_iter().map(|scored| scored.hit).collect(), SearchStage::Fallback)
}

fn admitted(hits: &[ScoredHit], filter: HitFilter) -> Vec<SearchHit> {
	let mut out: Vec<SearchHit> = hits
		.iter()
		.filter(|scored| filter.admits(&scored.hit))
		.map(|scored| scored.hit.clone())
		.collect();

	out.sort_by(|a, b| cmp_f32_desc(a.final_score, b.final_score));

	out
}

fn embedding_score(query_vec: &[f32], candidate_vec: &[f32]) -> Option<f32> {
	if candidate_vec.is_empty() || !vector::is_finite_vector(candidate_vec) {
		return None;
	}

	vector::cosine_similarity(query_vec, candidate_vec).ok()
}

fn average_regions(scores: [Option<f32>; 2]) -> f32 {
	let usable: Vec<f32> = scores.into_iter().flatten().collect();

	if usable.is_empty() { 0.0 } else { usable.iter().sum::<f32>() / usable.len() as f32 }
}

fn region_score(color: ColorName, raw_hsv: Option<&str>) -> Option<f32> {
	let hsv = Hsv::parse(raw_hsv?)?;

	Some(color::score_color(color, hsv))
}

#[cfg(test)]
mod tests {
	use uuid::Uuid;

	use super::*;

	fn frame_hit(similarity: f32) -> ScoredHit {
		let frame = FrameCandidate { frame_id: Uuid::new_v4(), timestamp_sec: 0.0, vector: vec![] };

		ScoredHit { hit: SearchHit::frame(&frame, similarity), similarity }
	}

	fn person(upper: Option<&str>, lower: Option<&str>) -> ObjectAttributes {
		ObjectAttributes::Person {
			upper_hsv: upper.map(str::to_string),
			lower_hsv: lower.map(str::to_string),
		}
	}

	fn filter(final_min: f32) -> HitFilter {
		HitFilter { embed_sim_min: 0.0, final_min, require_color: false, require_plate: false }
	}

	#[test]
	fn default_relaxation_reaches_zero_in_three_steps() {
		assert_eq!(relaxation_levels(0.30, 0.10), vec![0.2, 0.1, 0.0]);
	}

	#[test]
	fn relaxation_stops_before_going_negative() {
		assert_eq!(relaxation_levels(0.35, 0.10), vec![0.25, 0.15, 0.05]);
		assert!(relaxation_levels(0.05, 0.10).is_empty());
		assert!(relaxation_levels(0.0, 0.10).is_empty());
		assert!(relaxation_levels(0.3, 0.0).is_empty());
	}

	#[test]
	fn tiny_steps_are_capped() {
		let levels = relaxation_levels(0.3, 0.001);

		assert_eq!(levels.len(), MAX_RELAXATION_STEPS as usize);
		assert!(levels.windows(2).all(|pair| pair[0] > pair[1]));
		assert!((levels[0] - 0.299).abs() < 1e-6);
		assert!((levels[99] - 0.2).abs() < 1e-6);
		assert_eq!(relaxation_levels(0.3, 1e-9).len(), MAX_RELAXATION_STEPS as usize);
	}

	#[test]
	fn nan_sorts_last() {
		let mut scores = vec![0.2, f32::NAN, 0.9, 0.5];

		scores.sort_by(|a, b| cmp_f32_desc(*a, *b));

		assert_eq!(&scores[..3], &[0.9, 0.5, 0.2]);
		assert!(scores[3].is_nan());
	}

	#[test]
	fn split_colors_average_available_regions() {
		let intent = ColorIntent::Split { upper: Some(ColorName::Red), lower: Some(ColorName::Blue) };
		let both = color_score(&intent, &person(Some("0,0.9,0.6"), Some("220,0.9,0.6")));
		let upper_only = color_score(&intent, &person(Some("0,0.9,0.6"), Some("garbage")));
		let mismatched = color_score(&intent, &person(Some("0,0.9,0.6"), Some("120,0.9,0.6")));

		assert!((both - 1.0).abs() < 1e-6, "{both}");
		assert!((upper_only - 1.0).abs() < 1e-6, "{upper_only}");
		assert!((mismatched - 0.5).abs() < 1e-6, "{mismatched}");
		assert_eq!(color_score(&intent, &person(None, None)), 0.0);
	}

	#[test]
	fn generic_person_color_averages_garments() {
		let intent = ColorIntent::Generic { color: ColorName::Black };
		let mixed = color_score(&intent, &person(Some("0,0.1,0.9"), Some("0,0.1,0.05")));
		let lower_only = color_score(&intent, &person(Some("not,a,color"), Some("0,0.1,0.05")));

		assert!((mixed - 0.5).abs() < 1e-6, "{mixed}");
		assert_eq!(lower_only, 1.0);
		assert_eq!(color_score(&intent, &person(None, None)), 0.0);
	}

	#[test]
	fn plate_only_scores_transport() {
		let car = ObjectAttributes::Transport { color_hsv: None, plate: Some("A123BC77".into()) };

		assert_eq!(plate_score(Some("А123ВС77"), &car), 1.0);
		assert_eq!(plate_score(None, &car), 0.0);
		assert_eq!(plate_score(Some("A123BC77"), &person(None, None)), 0.0);
	}

	#[test]
	fn mismatched_candidate_vectors_are_skipped() {
		let frames = [
			FrameCandidate { frame_id: Uuid::new_v4(), timestamp_sec: 0.0, vector: vec![1.0, 0.0] },
			FrameCandidate { frame_id: Uuid::new_v4(), timestamp_sec: 1.0, vector: vec![1.0] },
			FrameCandidate {
				frame_id: Uuid::new_v4(),
				timestamp_sec: 2.0,
				vector: vec![f32::NAN, 1.0],
			},
		];
		let hits = score_frames(&[1.0, 0.0], &frames);

		assert_eq!(hits.len(), 1);
		assert_eq!(hits[0].hit.frame_id, frames[0].frame_id);
	}

	#[test]
	fn ties_keep_arrival_order() {
		let hits = [frame_hit(0.5), frame_hit(0.7), frame_hit(0.5)];
		let (selected, stage) = select(&hits, filter(0.3), &[], 5);

		assert_eq!(stage, SearchStage::Strict);
		assert_eq!(
			selected.iter().map(|hit| hit.frame_id).collect::<Vec<_>>(),
			vec![hits[1].hit.frame_id, hits[0].hit.frame_id, hits[2].hit.frame_id]
		);
	}

	#[test]
	fn falls_back_to_top_embeddings() {
		let hits: Vec<ScoredHit> = [0.1, 0.4, 0.2, 0.3].into_iter().map(frame_hit).collect();
		let strict = HitFilter { embed_sim_min: 0.9, ..filter(0.3) };
		let (selected, stage) = select(&hits, strict, &relaxation_levels(0.3, 0.1), 2);

		assert_eq!(stage, SearchStage::Fallback);
		assert_eq!(selected.iter().map(|hit| hit.embed_score).collect::<Vec<_>>(), vec![0.4, 0.3]);
	}

	#[test]
	fn fallback_orders_negative_similarities() {
		let hits: Vec<ScoredHit> = [-0.9, -0.1, -0.5].into_iter().map(frame_hit).collect();
		let strict = HitFilter { embed_sim_min: 0.3, ..filter(0.3) };
		let (selected, stage) = select(&hits, strict, &relaxation_levels(0.3, 0.1), 5);

		assert_eq!(stage, SearchStage::Fallback);
		assert_eq!(
			selected.iter().map(|hit| hit.frame_id).collect::<Vec<_>>(),
			vec![hits[1].hit.frame_id, hits[2].hit.frame_id, hits[0].hit.frame_id]
		);
		assert!(selected.iter().all(|hit| hit.embed_score == 0.0));
	}
}
