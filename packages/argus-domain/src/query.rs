//! Free-text query understanding.
//!
//! Queries arrive in English or Russian ("red car", "человек в красной куртке и синих джинсах",
//! "а123вс77"). Parsing is keyword and stem based and never fails: an unrecognized query yields an
//! intent with only `cleaned_text` set.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::{candidate::ObjectType, color::ColorName};

/// Maximum token distance between a garment keyword and the color it claims.
pub const GARMENT_COLOR_WINDOW: usize = 3;

const TOKEN_PUNCTUATION: &[char] = &[',', '.', '!', '?', ';', ':'];

const PERSON_KEYWORDS: &[&str] = &[
	"person",
	"people",
	"human",
	"man",
	"woman",
	"boy",
	"girl",
	"человек",
	"человека",
	"мужчина",
	"женщина",
	"парень",
	"девушка",
	"пешеход",
];

const TRANSPORT_KEYWORDS: &[&str] = &[
	"car",
	"cars",
	"auto",
	"vehicle",
	"truck",
	"bus",
	"машина",
	"авто",
	"тачка",
	"грузовик",
	"автобус",
	"легковая",
	"фура",
	"микроавтобус",
	"транспорт",
];

const UPPER_GARMENT_STEMS: &[&str] = &[
	"jacket", "shirt", "hoodie", "top", "coat", "sweater", "blouse", "vest", "куртк", "футболк",
	"кофт", "пиджак", "пальт", "жилет", "худи", "толстовк", "свитер", "верх",
];

const LOWER_GARMENT_STEMS: &[&str] = &[
	"pants", "jeans", "skirt", "shorts", "trousers", "штон", "штам", "штан", "джинс", "брюк",
	"юбк", "шорт", "низ",
];

// Table order decides which family wins when a token contains stems of several colors.
const COLOR_STEMS: &[(ColorName, &[&str])] = &[
	(ColorName::Black, &["черн", "чёрн", "black"]),
	(ColorName::White, &["бел", "white"]),
	(ColorName::Gray, &["сер", "grey", "gray"]),
	(ColorName::Red, &["красн", "бордов", "red"]),
	(ColorName::Orange, &["оранжев", "orange"]),
	(ColorName::Yellow, &["желт", "жёлт", "yellow"]),
	(ColorName::Green, &["зелен", "зелён", "green"]),
	(ColorName::Blue, &["син", "голуб", "blue"]),
	(ColorName::Brown, &["коричнев", "brown"]),
	(ColorName::Purple, &["фиолет", "пурпур", "purple"]),
	(ColorName::Pink, &["розов", "pink"]),
];

// Letter, three digits, two letters, region code. Letters are limited to the Latin/Cyrillic
// look-alike alphabet used on plates. Input is already lowercased.
const PLATE_PATTERN: &str = r"\b([abekmhopctyxавекмнорстухё])[ -]?([0-9]{3})[ -]?([abekmhopctyxавекмнорстухё]{2})[ -]?([0-9]{2,3})\b";

static PLATE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(PLATE_PATTERN).ok());

/// Requested color, either for the whole object or per garment region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColorIntent {
	#[default]
	None,
	Generic { color: ColorName },
	/// At least one side is set.
	Split { upper: Option<ColorName>, lower: Option<ColorName> },
}
impl ColorIntent {
	pub fn is_none(&self) -> bool {
		matches!(self, Self::None)
	}

	pub fn generic(&self) -> Option<ColorName> {
		match self {
			Self::Generic { color } => Some(*color),
			_ => None,
		}
	}

	pub fn upper(&self) -> Option<ColorName> {
		match self {
			Self::Split { upper, .. } => *upper,
			_ => None,
		}
	}

	pub fn lower(&self) -> Option<ColorName> {
		match self {
			Self::Split { lower, .. } => *lower,
			_ => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedQuery {
	pub object_type: Option<ObjectType>,
	pub color: ColorIntent,
	pub plate: Option<String>,
	pub cleaned_text: String,
}
impl ParsedQuery {
	pub fn has_color(&self) -> bool {
		!self.color.is_none()
	}

	pub fn has_plate(&self) -> bool {
		self.plate.is_some()
	}
}

pub fn parse(text: &str) -> ParsedQuery {
	let normalized = normalize_text(text);
	let (plate, without_plate) = extract_plate(&normalized);
	let object_type = detect_type(&normalized);
	let tokens: Vec<&str> = without_plate.split(' ').filter(|token| !token.is_empty()).collect();
	let colors = detect_colors(&tokens);
	let color = assign_colors(&colors, &tokens, object_type);
	let cleaned_text = clean_text(&tokens, &colors, object_type);

	ParsedQuery { object_type, color, plate, cleaned_text }
}

pub fn normalize_text(text: &str) -> String {
	text.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_plate(text: &str) -> (Option<String>, String) {
	let Some(re) = PLATE_RE.as_ref() else { return (None, text.to_string()) };
	let Some(caps) = re.captures(text) else { return (None, text.to_string()) };
	let Some(whole) = caps.get(0) else { return (None, text.to_string()) };
	let mut plate = String::with_capacity(whole.len());

	for group in caps.iter().skip(1).flatten() {
		plate.push_str(group.as_str());
	}

	let plate = plate.to_uppercase().replace('Ё', "Е");
	let rest = format!("{} {}", &text[..whole.start()], &text[whole.end()..]);

	(Some(plate), normalize_text(&rest))
}

fn detect_type(text: &str) -> Option<ObjectType> {
	let person = count_keyword_hits(text, PERSON_KEYWORDS);
	let transport = count_keyword_hits(text, TRANSPORT_KEYWORDS);

	match person.cmp(&transport) {
		std::cmp::Ordering::Greater => Some(ObjectType::Person),
		std::cmp::Ordering::Less => Some(ObjectType::Transport),
		// Covers both "no keywords" and "as many person as vehicle keywords".
		std::cmp::Ordering::Equal => None,
	}
}

fn count_keyword_hits(text: &str, keywords: &[&str]) -> usize {
	keywords.iter().filter(|keyword| text.contains(*keyword)).count()
}

fn strip_token(token: &str) -> &str {
	token.trim_matches(TOKEN_PUNCTUATION)
}

fn detect_colors(tokens: &[&str]) -> Vec<(usize, ColorName)> {
	tokens
		.iter()
		.enumerate()
		.filter_map(|(idx, token)| match_color(strip_token(token)).map(|color| (idx, color)))
		.collect()
}

fn match_color(token: &str) -> Option<ColorName> {
	if token.is_empty() {
		return None;
	}

	COLOR_STEMS
		.iter()
		.find(|(_, stems)| stems.iter().any(|stem| token.contains(stem)))
		.map(|(color, _)| *color)
}

fn matches_any(token: &str, stems: &[&str]) -> bool {
	!token.is_empty() && stems.iter().any(|stem| token.contains(stem))
}

fn assign_colors(
	colors: &[(usize, ColorName)],
	tokens: &[&str],
	object_type: Option<ObjectType>,
) -> ColorIntent {
	let Some(&(_, first)) = colors.first() else { return ColorIntent::None };

	if object_type != Some(ObjectType::Person) {
		return ColorIntent::Generic { color: first };
	}

	let mut upper = None;
	let mut lower = None;

	for (idx, token) in tokens.iter().enumerate() {
		let token = strip_token(token);

		if upper.is_none() && matches_any(token, UPPER_GARMENT_STEMS) {
			upper = closest_color(colors, idx);
		}
		if lower.is_none() && matches_any(token, LOWER_GARMENT_STEMS) {
			lower = closest_color(colors, idx);
		}
	}

	if upper.is_none() && lower.is_none() {
		ColorIntent::Generic { color: first }
	} else {
		ColorIntent::Split { upper, lower }
	}
}

fn closest_color(colors: &[(usize, ColorName)], index: usize) -> Option<ColorName> {
	let mut best: Option<(usize, ColorName)> = None;

	for &(color_idx, color) in colors {
		let distance = color_idx.abs_diff(index);

		if distance > GARMENT_COLOR_WINDOW {
			continue;
		}
		if best.map(|(best_distance, _)| distance < best_distance).unwrap_or(true) {
			best = Some((distance, color));
		}
	}

	best.map(|(_, color)| color)
}

// Typed queries score color through attributes, so color words are dropped from the embedding
// text. Frame queries keep them: the embedding is their only signal.
fn clean_text(
	tokens: &[&str],
	colors: &[(usize, ColorName)],
	object_type: Option<ObjectType>,
) -> String {
	let all = tokens.join(" ");

	if object_type.is_none() || colors.is_empty() {
		return all;
	}

	let kept: Vec<&str> = tokens
		.iter()
		.enumerate()
		.filter(|(idx, _)| !colors.iter().any(|(color_idx, _)| color_idx == idx))
		.map(|(_, token)| *token)
		.collect();

	if kept.is_empty() { all } else { kept.join(" ") }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn closest_color_prefers_the_earliest_on_ties() {
		let colors = [(1, ColorName::Red), (5, ColorName::Blue)];

		assert_eq!(closest_color(&colors, 3), Some(ColorName::Red));
		assert_eq!(closest_color(&colors, 4), Some(ColorName::Blue));
		assert_eq!(closest_color(&colors, 9), None);
	}

	#[test]
	fn punctuation_is_stripped_from_both_ends() {
		assert_eq!(strip_token("red,"), "red");
		assert_eq!(strip_token("...blue!"), "blue");
		assert_eq!(strip_token(",;"), "");
	}

	#[test]
	fn plate_pattern_compiles() {
		assert!(PLATE_RE.is_some());
	}
}
