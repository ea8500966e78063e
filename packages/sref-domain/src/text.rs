use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

pub const MIN_TERM_CHARS: usize = 2;

/// Splits a free-text query into lowercase prefix terms.
///
/// Any non-alphanumeric character ends a term, the same way the Postgres `simple` parser splits
/// `Anime's` into `anime` and `s`. Terms shorter than [`MIN_TERM_CHARS`] are dropped, duplicates
/// keep their first position, and at most `max_terms` survive.
pub fn tokenize_query(query: &str, max_terms: usize) -> Vec<String> {
	let normalized: String = query.nfkc().collect();
	let mut terms: Vec<String> = Vec::new();
	let pieces = normalized
		.unicode_words()
		.flat_map(|word| word.split(|ch: char| !ch.is_alphanumeric()))
		.filter(|piece| !piece.is_empty());

	for piece in pieces {
		let term: String = piece.chars().flat_map(char::to_lowercase).collect();

		if term.chars().count() < MIN_TERM_CHARS || terms.contains(&term) {
			continue;
		}

		terms.push(term);

		if terms.len() >= max_terms {
			break;
		}
	}

	terms
}

/// Renders terms as a Postgres `to_tsquery` expression where every term is a prefix and all
/// terms must match.
pub fn prefix_tsquery(terms: &[String]) -> Option<String> {
	if terms.is_empty() {
		return None;
	}

	Some(terms.iter().map(|term| format!("{term}:*")).collect::<Vec<_>>().join(" & "))
}

pub fn escape_like(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());

	for ch in raw.chars() {
		if matches!(ch, '\\' | '%' | '_') {
			out.push('\\');
		}

		out.push(ch);
	}

	out
}

/// True when every term prefixes at least one word of `haystack`.
pub fn matches_prefix_terms(haystack: &str, terms: &[String]) -> bool {
	let words = tokenize_query(haystack, usize::MAX);

	terms.iter().all(|term| words.iter().any(|word| word.starts_with(term.as_str())))
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
	haystack.to_lowercase().contains(&needle.to_lowercase())
}
