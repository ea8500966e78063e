//! Filter Builder: turns caller criteria into a predicate over catalog items.

use std::{
	fmt::{Display, Formatter},
	str::FromStr,
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	access::{AccessLevel, Caller},
	catalog::CatalogStatus,
	facets::FacetDimension,
	text,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextMode {
	/// Tokenized prefix terms combined with AND, backed by a full-text index.
	FullText,
	/// Case-insensitive substring over title, description and code.
	Substring,
}
impl FromStr for TextMode {
	type Err = String;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"full_text" => Ok(Self::FullText),
			"substring" => Ok(Self::Substring),
			other => Err(format!("unknown text mode '{other}'.")),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
	Views,
	Likes,
	Favorites,
	Downloads,
	PopularityScore,
}
impl NumericField {
	pub fn column(self) -> &'static str {
		match self {
			Self::Views => "views",
			Self::Likes => "likes",
			Self::Favorites => "favorites",
			Self::Downloads => "downloads",
			Self::PopularityScore => "popularity_score",
		}
	}

	pub fn value(self, item: &ItemFacts) -> f64 {
		match self {
			Self::Views => item.views as f64,
			Self::Likes => item.likes as f64,
			Self::Favorites => item.favorites as f64,
			Self::Downloads => item.downloads as f64,
			Self::PopularityScore => item.popularity_score,
		}
	}
}
impl FromStr for NumericField {
	type Err = String;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"views" => Ok(Self::Views),
			"likes" => Ok(Self::Likes),
			"favorites" => Ok(Self::Favorites),
			"downloads" => Ok(Self::Downloads),
			"popularity_score" | "popularityScore" => Ok(Self::PopularityScore),
			other => Err(format!(
				"unsupported numeric field '{other}'; expected one of views, likes, favorites, downloads, popularity_score."
			)),
		}
	}
}

/// Inclusive bounds. A missing side is unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
	pub field: NumericField,
	pub min: Option<f64>,
	pub max: Option<f64>,
}
impl NumericRange {
	pub fn contains(&self, value: f64) -> bool {
		self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
	pub from: Option<OffsetDateTime>,
	pub to: Option<OffsetDateTime>,
}

/// Structured criteria after transport-level parsing.
#[derive(Clone, Debug, Default)]
pub struct SearchCriteria {
	pub text: String,
	pub categories: Vec<String>,
	pub tags: Vec<String>,
	pub premium: Option<bool>,
	pub featured: Option<bool>,
	pub verified: Option<bool>,
	pub date_range: DateRange,
	pub numeric_ranges: Vec<NumericRange>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TextFilter {
	Prefix { terms: Vec<String> },
	Substring { needle: String },
}

/// A composed predicate over ACTIVE catalog items. Status is not a field: every predicate
/// implicitly requires [`CatalogStatus::Active`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchPredicate {
	pub text: Option<TextFilter>,
	/// Any of these category slugs.
	pub categories: Vec<String>,
	/// Any of these tag names.
	pub tags: Vec<String>,
	pub premium: Option<bool>,
	pub featured: Option<bool>,
	pub verified: Option<bool>,
	pub created_from: Option<OffsetDateTime>,
	pub created_to: Option<OffsetDateTime>,
	pub numeric_ranges: Vec<NumericRange>,
}
impl SearchPredicate {
	pub const REQUIRED_STATUS: CatalogStatus = CatalogStatus::Active;

	/// The same predicate with one facet dimension's constraint removed.
	pub fn without(&self, dimension: FacetDimension) -> Self {
		let mut relaxed = self.clone();

		match dimension {
			FacetDimension::Category => relaxed.categories.clear(),
			FacetDimension::Tag => relaxed.tags.clear(),
			FacetDimension::Premium => relaxed.premium = None,
		}

		relaxed
	}

	pub fn matches(&self, item: &ItemFacts) -> bool {
		if item.status != Self::REQUIRED_STATUS {
			return false;
		}

		match &self.text {
			Some(TextFilter::Prefix { terms }) => {
				let haystack = format!("{} {} {}", item.title, item.description, item.code);

				if !text::matches_prefix_terms(&haystack, terms) {
					return false;
				}
			},
			Some(TextFilter::Substring { needle }) => {
				let hit = [&item.title, &item.description, &item.code]
					.iter()
					.any(|field| text::contains_ignore_case(field, needle));

				if !hit {
					return false;
				}
			},
			None => {},
		}

		if !self.categories.is_empty()
			&& !item.categories.iter().any(|slug| self.categories.contains(slug))
		{
			return false;
		}
		if !self.tags.is_empty() && !item.tags.iter().any(|tag| self.tags.contains(tag)) {
			return false;
		}

		for (wanted, actual) in [
			(self.premium, item.premium),
			(self.featured, item.featured),
			(self.verified, item.verified),
		] {
			if wanted.is_some_and(|wanted| wanted != actual) {
				return false;
			}
		}

		if self.created_from.is_some_and(|from| item.created_at < from)
			|| self.created_to.is_some_and(|to| item.created_at > to)
		{
			return false;
		}

		self.numeric_ranges.iter().all(|range| range.contains(range.field.value(item)))
	}
}

/// The columns of a catalog item the in-memory evaluators need.
#[derive(Clone, Debug)]
pub struct ItemFacts {
	pub item_id: Uuid,
	pub code: String,
	pub title: String,
	pub description: String,
	pub status: CatalogStatus,
	pub featured: bool,
	pub premium: bool,
	pub verified: bool,
	pub views: i64,
	pub likes: i64,
	pub favorites: i64,
	pub downloads: i64,
	pub popularity_score: f64,
	pub created_at: OffsetDateTime,
	pub categories: Vec<String>,
	pub tags: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterError {
	Invalid { path: String, message: String },
	Unauthorized { message: String },
}
impl Display for FilterError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Invalid { path, message } => write!(f, "{path}: {message}"),
			Self::Unauthorized { message } => f.write_str(message),
		}
	}
}
impl std::error::Error for FilterError {}

/// Checks list values and range bounds. Runs before any caller-dependent work.
pub fn validate_criteria(criteria: &SearchCriteria) -> Result<(), FilterError> {
	for (path, values) in
		[("$.filters.categories", &criteria.categories), ("$.filters.tags", &criteria.tags)]
	{
		if values.iter().any(|value| value.trim().is_empty()) {
			return Err(FilterError::Invalid {
				path: path.to_string(),
				message: "values must not be blank.".to_string(),
			});
		}
	}

	if let (Some(from), Some(to)) = (criteria.date_range.from, criteria.date_range.to)
		&& from > to
	{
		return Err(FilterError::Invalid {
			path: "$.filters.dateRange".to_string(),
			message: "dateRange.from must not be after dateRange.to.".to_string(),
		});
	}

	for range in &criteria.numeric_ranges {
		let path = format!("$.filters.numericRanges.{}", range.field.column());

		if range.min.is_some_and(|v| !v.is_finite()) || range.max.is_some_and(|v| !v.is_finite()) {
			return Err(FilterError::Invalid { path, message: "bounds must be finite.".to_string() });
		}
		if let (Some(min), Some(max)) = (range.min, range.max)
			&& min > max
		{
			return Err(FilterError::Invalid {
				path,
				message: "min must not be greater than max.".to_string(),
			});
		}
	}

	Ok(())
}

pub fn build_predicate(
	criteria: &SearchCriteria,
	caller: &Caller,
	mode: TextMode,
	max_terms: usize,
) -> Result<SearchPredicate, FilterError> {
	validate_criteria(criteria)?;

	let premium = resolve_premium(criteria.premium, caller.access_level())?;
	let mut numeric_ranges: Vec<NumericRange> = criteria
		.numeric_ranges
		.iter()
		.filter(|range| range.min.is_some() || range.max.is_some())
		.copied()
		.collect();

	numeric_ranges.sort_by_key(|range| range.field);

	let tags: Vec<String> = criteria.tags.iter().map(|tag| tag.to_lowercase()).collect();

	Ok(SearchPredicate {
		text: build_text_filter(&criteria.text, mode, max_terms),
		categories: normalize_list(&criteria.categories),
		tags: normalize_list(&tags),
		premium,
		featured: criteria.featured,
		verified: criteria.verified,
		created_from: criteria.date_range.from,
		created_to: criteria.date_range.to,
		numeric_ranges,
	})
}

/// Trims, drops blanks, sorts and dedupes a list filter.
pub fn normalize_list(values: &[String]) -> Vec<String> {
	let mut out: Vec<String> = values
		.iter()
		.map(|value| value.trim())
		.filter(|value| !value.is_empty())
		.map(str::to_string)
		.collect();

	out.sort();
	out.dedup();

	out
}

fn build_text_filter(raw: &str, mode: TextMode, max_terms: usize) -> Option<TextFilter> {
	let trimmed = raw.trim();

	if trimmed.is_empty() {
		return None;
	}

	match mode {
		TextMode::FullText => {
			let terms = text::tokenize_query(trimmed, max_terms);

			if terms.is_empty() { None } else { Some(TextFilter::Prefix { terms }) }
		},
		TextMode::Substring => Some(TextFilter::Substring { needle: trimmed.to_lowercase() }),
	}
}

fn resolve_premium(
	requested: Option<bool>,
	access: AccessLevel,
) -> Result<Option<bool>, FilterError> {
	match (access, requested) {
		(AccessLevel::Anonymous, Some(true)) => Err(FilterError::Unauthorized {
			message: "Premium content requires a signed-in premium account.".to_string(),
		}),
		(AccessLevel::Anonymous, _) => Ok(Some(false)),
		(AccessLevel::Authenticated, Some(true)) => Err(FilterError::Unauthorized {
			message: "Premium content requires a premium or admin account.".to_string(),
		}),
		(_, requested) => Ok(requested),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::access::Role;

	fn member(is_premium: bool) -> Caller {
		Caller::Member { user_id: Uuid::nil(), role: Role::User, is_premium }
	}

	#[test]
	fn anonymous_callers_are_pinned_to_free_items() {
		let predicate = build_predicate(
			&SearchCriteria::default(),
			&Caller::Anonymous,
			TextMode::FullText,
			10,
		)
		.expect("Anonymous search must be allowed.");

		assert_eq!(predicate.premium, Some(false));

		let criteria = SearchCriteria { premium: Some(false), ..Default::default() };
		let predicate = build_predicate(&criteria, &Caller::Anonymous, TextMode::FullText, 10)
			.expect("Explicit free filter must be allowed.");

		assert_eq!(predicate.premium, Some(false));
	}

	#[test]
	fn explicit_premium_requests_need_entitlement() {
		let criteria = SearchCriteria { premium: Some(true), ..Default::default() };

		assert!(matches!(
			build_predicate(&criteria, &Caller::Anonymous, TextMode::FullText, 10),
			Err(FilterError::Unauthorized { .. })
		));
		assert!(matches!(
			build_predicate(&criteria, &member(false), TextMode::FullText, 10),
			Err(FilterError::Unauthorized { .. })
		));

		let predicate = build_predicate(&criteria, &member(true), TextMode::FullText, 10)
			.expect("Premium member must be allowed.");

		assert_eq!(predicate.premium, Some(true));
	}

	#[test]
	fn authenticated_callers_without_premium_filter_are_unrestricted() {
		let predicate =
			build_predicate(&SearchCriteria::default(), &member(false), TextMode::FullText, 10)
				.expect("Member search must be allowed.");

		assert_eq!(predicate.premium, None);
	}

	#[test]
	fn text_that_tokenizes_to_nothing_is_dropped() {
		let criteria = SearchCriteria { text: " a ! ".to_string(), ..Default::default() };
		let predicate = build_predicate(&criteria, &member(true), TextMode::FullText, 10)
			.expect("Search must be allowed.");

		assert_eq!(predicate.text, None);
	}

	#[test]
	fn substring_mode_keeps_the_lowercased_needle() {
		let criteria = SearchCriteria { text: " Neon ".to_string(), ..Default::default() };
		let predicate = build_predicate(&criteria, &member(true), TextMode::Substring, 10)
			.expect("Search must be allowed.");

		assert_eq!(predicate.text, Some(TextFilter::Substring { needle: "neon".to_string() }));
	}

	#[test]
	fn inverted_ranges_are_rejected_with_a_path() {
		let criteria = SearchCriteria {
			numeric_ranges: vec![NumericRange {
				field: NumericField::Likes,
				min: Some(10.0),
				max: Some(1.0),
			}],
			..Default::default()
		};
		let err = build_predicate(&criteria, &member(true), TextMode::FullText, 10)
			.expect_err("Inverted range must fail.");

		assert_eq!(
			err,
			FilterError::Invalid {
				path: "$.filters.numericRanges.likes".to_string(),
				message: "min must not be greater than max.".to_string(),
			}
		);
	}

	#[test]
	fn list_filters_are_trimmed_sorted_and_deduped() {
		let values = vec![" y ".to_string(), "x".to_string(), "".to_string(), "y".to_string()];

		assert_eq!(normalize_list(&values), vec!["x".to_string(), "y".to_string()]);
	}

	#[test]
	fn blank_list_values_are_rejected() {
		let criteria = SearchCriteria { categories: vec![" ".to_string()], ..Default::default() };
		let err = build_predicate(&criteria, &member(true), TextMode::FullText, 10)
			.expect_err("Blank category must fail.");

		assert!(matches!(
			err,
			FilterError::Invalid { ref path, .. } if path == "$.filters.categories"
		));

		let criteria =
			SearchCriteria { tags: vec!["p".to_string(), "".to_string()], ..Default::default() };
		let err = build_predicate(&criteria, &member(true), TextMode::FullText, 10)
			.expect_err("Blank tag must fail.");

		assert!(matches!(
			err,
			FilterError::Invalid { ref path, .. } if path == "$.filters.tags"
		));
	}

	#[test]
	fn tag_filters_are_lowercased() {
		let criteria = SearchCriteria {
			tags: vec!["Neon".to_string(), "neon".to_string(), " P ".to_string()],
			..Default::default()
		};
		let predicate = build_predicate(&criteria, &member(true), TextMode::FullText, 10)
			.expect("Search must be allowed.");

		assert_eq!(predicate.tags, vec!["neon".to_string(), "p".to_string()]);
	}
}
