//! Raw candidate rows and their conversion into domain candidates.

use uuid::Uuid;

use argus_domain::candidate::{FrameCandidate, ObjectAttributes, ObjectCandidate, ObjectType};

#[derive(Debug, sqlx::FromRow)]
pub struct FrameRow {
	pub frame_id: Uuid,
	pub timestamp_sec: f64,
	pub vector: Option<String>,
}
impl FrameRow {
	/// `None` when the stored vector cannot be parsed.
	pub fn into_candidate(self) -> Option<FrameCandidate> {
		let vector = parse_vector(self.vector.as_deref()?)?;

		Some(FrameCandidate { frame_id: self.frame_id, timestamp_sec: self.timestamp_sec, vector })
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct ObjectRow {
	pub object_id: Uuid,
	pub frame_id: Uuid,
	pub object_type: String,
	pub track_id: Option<i64>,
	pub timestamp_sec: f64,
	pub vector: Option<String>,
	pub color_hsv: Option<String>,
	pub license_plate: Option<String>,
	pub upper_color_hsv: Option<String>,
	pub lower_color_hsv: Option<String>,
}
impl ObjectRow {
	/// `None` when the stored vector cannot be parsed or the object type is unknown.
	pub fn into_candidate(self) -> Option<ObjectCandidate> {
		let vector = parse_vector(self.vector.as_deref()?)?;
		let attributes = match ObjectType::parse(&self.object_type)? {
			ObjectType::Transport => ObjectAttributes::Transport {
				color_hsv: self.color_hsv,
				plate: self.license_plate,
			},
			ObjectType::Person => ObjectAttributes::Person {
				upper_hsv: self.upper_color_hsv,
				lower_hsv: self.lower_color_hsv,
			},
		};

		Some(ObjectCandidate {
			object_id: self.object_id,
			frame_id: self.frame_id,
			timestamp_sec: self.timestamp_sec,
			track_id: self.track_id,
			vector,
			attributes,
		})
	}
}

/// Parses the textual vector encoding (`[0.1, 0.2, ...]`), which is both the JSON array form and
/// the pgvector text output. Empty and non-finite vectors are rejected.
pub fn parse_vector(raw: &str) -> Option<Vec<f32>> {
	let values: Vec<f64> = serde_json::from_str(raw.trim()).ok()?;

	if values.is_empty() {
		return None;
	}

	let vector: Vec<f32> = values.into_iter().map(|value| value as f32).collect();

	argus_domain::vector::is_finite_vector(&vector).then_some(vector)
}
