use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::score::{self, Weights};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectType {
	Person,
	Transport,
}
impl ObjectType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Person => "PERSON",
			Self::Transport => "TRANSPORT",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim() {
			"PERSON" => Some(Self::Person),
			"TRANSPORT" => Some(Self::Transport),
			_ => None,
		}
	}
}

/// A whole frame, matched by its scene embedding only.
#[derive(Debug, Clone)]
pub struct FrameCandidate {
	pub frame_id: Uuid,
	pub timestamp_sec: f64,
	pub vector: Vec<f32>,
}

/// Raw stored attributes of a detected object. HSV values keep the `"h,s,v"` storage encoding and
/// are parsed while scoring, so a malformed value only degrades its own signal.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectAttributes {
	Transport { color_hsv: Option<String>, plate: Option<String> },
	Person { upper_hsv: Option<String>, lower_hsv: Option<String> },
}
impl ObjectAttributes {
	pub fn object_type(&self) -> ObjectType {
		match self {
			Self::Transport { .. } => ObjectType::Transport,
			Self::Person { .. } => ObjectType::Person,
		}
	}
}

#[derive(Debug, Clone)]
pub struct ObjectCandidate {
	pub object_id: Uuid,
	pub frame_id: Uuid,
	pub timestamp_sec: f64,
	pub track_id: Option<i64>,
	pub vector: Vec<f32>,
	pub attributes: ObjectAttributes,
}
impl ObjectCandidate {
	pub fn object_type(&self) -> ObjectType {
		self.attributes.object_type()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
	Frame,
	Object,
}

/// One ranked result. Construct through [`SearchHit::frame`] or [`SearchHit::object`], which
/// derive `final_score` from the signal scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
	pub target: TargetKind,
	pub frame_id: Uuid,
	pub object_id: Option<Uuid>,
	pub track_id: Option<i64>,
	pub timestamp_sec: f64,
	pub final_score: f32,
	pub embed_score: f32,
	pub color_score: f32,
	pub plate_score: f32,
}
impl SearchHit {
	/// Frames carry no attributes, so color and plate are fixed at zero.
	pub fn frame(candidate: &FrameCandidate, embed_score: f32) -> Self {
		let embed_score = embed_score.clamp(0.0, 1.0);

		Self {
			target: TargetKind::Frame,
			frame_id: candidate.frame_id,
			object_id: None,
			track_id: None,
			timestamp_sec: candidate.timestamp_sec,
			final_score: score::combine(embed_score, 0.0, 0.0),
			embed_score,
			color_score: 0.0,
			plate_score: 0.0,
		}
	}

	pub fn object(
		candidate: &ObjectCandidate,
		embed_score: f32,
		color_score: f32,
		plate_score: f32,
	) -> Self {
		let embed_score = embed_score.clamp(0.0, 1.0);
		let color_score = color_score.clamp(0.0, 1.0);
		let plate_score = plate_score.clamp(0.0, 1.0);

		Self {
			target: TargetKind::Object,
			frame_id: candidate.frame_id,
			object_id: Some(candidate.object_id),
			track_id: candidate.track_id,
			timestamp_sec: candidate.timestamp_sec,
			final_score: score::combine(embed_score, color_score, plate_score),
			embed_score,
			color_score,
			plate_score,
		}
	}

	pub fn weights(&self) -> Weights {
		Weights::for_signals(self.color_score, self.plate_score)
	}
}
