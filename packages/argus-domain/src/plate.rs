//! License-plate normalization and fuzzy matching.

/// Characters that survive normalization: the Latin letters shared with the Cyrillic plate
/// alphabet, plus digits.
pub const ALLOWED_PLATE_CHARS: &str = "ABEKMHOPCTYX0123456789";

/// Scores below this are treated as coincidental overlap.
pub const MIN_PLATE_SIMILARITY: f32 = 0.4;

/// Normalizes raw plate text (user input or OCR output) onto the plate alphabet.
///
/// Returns `None` when nothing usable remains.
pub fn normalize_plate(raw: &str) -> Option<String> {
	let mut out = String::with_capacity(raw.len());

	for ch in raw.chars().flat_map(char::to_uppercase) {
		if ch.is_ascii_digit() {
			out.push(ch);

			continue;
		}
		if !ch.is_alphanumeric() {
			continue;
		}

		let Some(ch) = fold_cyrillic(ch) else { continue };
		let ch = fold_ocr_confusion(ch);

		if ALLOWED_PLATE_CHARS.contains(ch) {
			out.push(ch);
		}
	}

	if out.is_empty() { None } else { Some(out) }
}

/// Scores a query plate against a stored plate in `[0, 1]`.
pub fn plate_score(query: &str, stored: &str) -> f32 {
	let (Some(query), Some(stored)) = (normalize_plate(query), normalize_plate(stored)) else {
		return 0.0;
	};

	if query == stored {
		return 1.0;
	}

	let ratio = similarity_ratio(&query, &stored);

	if ratio < MIN_PLATE_SIMILARITY { 0.0 } else { ratio }
}

/// Indel similarity: `2 * lcs / (len_a + len_b)`, so one substituted character in an eight
/// character plate scores `0.875`.
pub fn similarity_ratio(left: &str, right: &str) -> f32 {
	let left: Vec<char> = left.chars().collect();
	let right: Vec<char> = right.chars().collect();
	let total = left.len() + right.len();

	if total == 0 {
		return 1.0;
	}

	let lcs = longest_common_subsequence(&left, &right);

	(2 * lcs) as f32 / total as f32
}

fn longest_common_subsequence(left: &[char], right: &[char]) -> usize {
	let mut prev = vec![0_usize; right.len() + 1];
	let mut row = vec![0_usize; right.len() + 1];

	for a in left {
		for (j, b) in right.iter().enumerate() {
			row[j + 1] = if a == b { prev[j] + 1 } else { row[j].max(prev[j + 1]) };
		}

		std::mem::swap(&mut prev, &mut row);
	}

	prev[right.len()]
}

fn fold_cyrillic(ch: char) -> Option<char> {
	if !('А'..='Я').contains(&ch) && ch != 'Ё' {
		return Some(ch);
	}

	match ch {
		'А' => Some('A'),
		'В' => Some('B'),
		'Е' | 'Ё' => Some('E'),
		'К' => Some('K'),
		'М' => Some('M'),
		'Н' => Some('H'),
		'О' => Some('O'),
		'Р' => Some('P'),
		'С' => Some('C'),
		'Т' => Some('T'),
		'У' => Some('Y'),
		'Х' => Some('X'),
		_ => None,
	}
}

fn fold_ocr_confusion(ch: char) -> char {
	match ch {
		'O' | 'Q' => 'O',
		'I' | 'L' => '1',
		'Z' => '2',
		'S' => '5',
		other => other,
	}
}
