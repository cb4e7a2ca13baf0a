//! Perceptual color matching over dominant-region HSV attributes.
//!
//! Achromatic targets (white, gray, black) are judged from saturation and value only. Chromatic
//! targets combine a circular hue distance with saturation and value membership curves that
//! tolerate the shadows and glare of outdoor footage.

use serde::{Deserialize, Serialize};

const HUE_FALLOFF_DEG: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorName {
	Black,
	White,
	Gray,
	Red,
	Orange,
	Yellow,
	Green,
	Blue,
	Brown,
	Purple,
	Pink,
}
impl ColorName {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Black => "black",
			Self::White => "white",
			Self::Gray => "gray",
			Self::Red => "red",
			Self::Orange => "orange",
			Self::Yellow => "yellow",
			Self::Green => "green",
			Self::Blue => "blue",
			Self::Brown => "brown",
			Self::Purple => "purple",
			Self::Pink => "pink",
		}
	}

	pub fn parse(name: &str) -> Option<Self> {
		match name.trim().to_ascii_lowercase().as_str() {
			"black" => Some(Self::Black),
			"white" => Some(Self::White),
			"gray" | "grey" => Some(Self::Gray),
			"red" => Some(Self::Red),
			"orange" => Some(Self::Orange),
			"yellow" => Some(Self::Yellow),
			"green" => Some(Self::Green),
			"blue" => Some(Self::Blue),
			"brown" => Some(Self::Brown),
			"purple" => Some(Self::Purple),
			"pink" => Some(Self::Pink),
			_ => None,
		}
	}

	/// Reference hue in degrees. `None` for achromatic colors and for colors the matcher does not
	/// score.
	pub fn reference_hue(self) -> Option<f32> {
		match self {
			Self::Red => Some(0.0),
			Self::Orange => Some(30.0),
			Self::Yellow => Some(55.0),
			Self::Green => Some(120.0),
			Self::Blue => Some(220.0),
			Self::Purple => Some(275.0),
			Self::Brown => Some(25.0),
			Self::Black | Self::White | Self::Gray | Self::Pink => None,
		}
	}
}

/// Hue in degrees, saturation and value in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsv {
	pub hue: f32,
	pub saturation: f32,
	pub value: f32,
}
impl Hsv {
	pub fn new(hue: f32, saturation: f32, value: f32) -> Self {
		Self { hue, saturation, value }
	}

	/// Parses the stored `"h,s,v"` attribute encoding. Anything other than exactly three finite
	/// comma-separated numbers yields `None`.
	pub fn parse(raw: &str) -> Option<Self> {
		let mut parts = raw.split(',');
		let hue = parse_component(parts.next()?)?;
		let saturation = parse_component(parts.next()?)?;
		let value = parse_component(parts.next()?)?;

		if parts.next().is_some() {
			return None;
		}

		Some(Self { hue, saturation, value })
	}

	fn clamped(self) -> Self {
		Self {
			hue: self.hue.clamp(0.0, 360.0),
			saturation: self.saturation.clamp(0.0, 1.0),
			value: self.value.clamp(0.0, 1.0),
		}
	}
}

/// Scores `(h, s, v)` against a color name. Unknown names score `0.0`.
pub fn score(target: &str, hue: f32, saturation: f32, value: f32) -> f32 {
	let Some(color) = ColorName::parse(target) else { return 0.0 };

	score_color(color, Hsv::new(hue, saturation, value))
}

pub fn score_color(color: ColorName, hsv: Hsv) -> f32 {
	if !hsv.hue.is_finite() || !hsv.saturation.is_finite() || !hsv.value.is_finite() {
		return 0.0;
	}

	let Hsv { hue, saturation, value } = hsv.clamped();
	let score = match color {
		ColorName::Black => black_score(value),
		ColorName::White => white_score(saturation, value),
		ColorName::Gray => gray_score(saturation, value),
		ColorName::Brown => {
			let Some(reference) = color.reference_hue() else { return 0.0 };

			hue_score(circular_hue_distance(hue, reference))
				* unit(brown_saturation_score(saturation))
				* unit(brown_value_score(value))
		},
		_ => {
			let Some(reference) = color.reference_hue() else { return 0.0 };
			let sv = (unit(chromatic_saturation_score(saturation))
				+ unit(chromatic_value_score(value)))
				/ 2.0;

			hue_score(circular_hue_distance(hue, reference)) * sv
		},
	};

	unit(score)
}

/// Distance on the hue circle, in `[0, 180]`.
pub fn circular_hue_distance(hue: f32, reference: f32) -> f32 {
	let raw = (hue - reference).abs();

	raw.min(360.0 - raw)
}

fn parse_component(raw: &str) -> Option<f32> {
	let value: f32 = raw.trim().parse().ok()?;

	value.is_finite().then_some(value)
}

fn unit(value: f32) -> f32 {
	value.clamp(0.0, 1.0)
}

fn ramp_up(x: f32, low: f32, high: f32) -> f32 {
	if x <= low {
		0.0
	} else if x >= high {
		1.0
	} else {
		(x - low) / (high - low)
	}
}

fn ramp_down(x: f32, low: f32, high: f32) -> f32 {
	1.0 - ramp_up(x, low, high)
}

fn triangle(x: f32, low: f32, peak: f32, high: f32) -> f32 {
	if x <= low || x >= high {
		0.0
	} else if x <= peak {
		(x - low) / (peak - low)
	} else {
		(high - x) / (high - peak)
	}
}

fn hue_score(distance: f32) -> f32 {
	unit(ramp_down(distance, 0.0, HUE_FALLOFF_DEG))
}

fn chromatic_saturation_score(saturation: f32) -> f32 {
	ramp_up(saturation, 0.05, 0.5)
}

// Dark and blown-out regions still carry some hue, so value only dampens the score.
fn chromatic_value_score(value: f32) -> f32 {
	if value <= 0.1 {
		0.4
	} else if value <= 0.4 {
		0.4 + (value - 0.1) * (1.0 - 0.4) / (0.4 - 0.1)
	} else if value <= 0.8 {
		1.0
	} else if value <= 0.95 {
		1.0 - (value - 0.8) * (1.0 - 0.5) / (0.95 - 0.8)
	} else {
		0.5
	}
}

fn brown_saturation_score(saturation: f32) -> f32 {
	ramp_up(saturation, 0.3, 0.8)
}

fn brown_value_score(value: f32) -> f32 {
	triangle(value, 0.1, 0.4, 0.8)
}

fn black_score(value: f32) -> f32 {
	unit(ramp_down(value, 0.12, 0.50))
}

fn white_score(saturation: f32, value: f32) -> f32 {
	unit(ramp_down(saturation, 0.1, 0.4)) * unit(ramp_up(value, 0.4, 0.7))
}

fn gray_score(saturation: f32, value: f32) -> f32 {
	unit(ramp_down(saturation, 0.0, 0.4)) * unit(triangle(value, 0.2, 0.5, 0.9))
}
