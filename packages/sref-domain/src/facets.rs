//! Facet Aggregator. Each dimension is counted under the predicate with that dimension's own
//! constraint removed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::search::{ItemFacts, SearchPredicate};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FacetDimension {
	Category,
	Tag,
	Premium,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFacet {
	pub slug: String,
	pub name: String,
	pub count: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFacet {
	pub name: String,
	pub count: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumSplit {
	pub free: i64,
	pub premium: i64,
}
impl PremiumSplit {
	pub fn total(&self) -> i64 {
		self.free + self.premium
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facets {
	pub categories: Vec<CategoryFacet>,
	pub tags: Vec<TagFacet>,
	pub premium_split: PremiumSplit,
}

/// Count descending, key ascending, truncated to `limit`.
pub fn top_buckets(counts: HashMap<String, i64>, limit: usize) -> Vec<(String, i64)> {
	let mut buckets: Vec<(String, i64)> = counts.into_iter().filter(|(_, n)| *n > 0).collect();

	buckets.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
	buckets.truncate(limit);

	buckets
}

/// In-memory facet pass over `items`. `category_names` maps slug to display name.
pub fn tally(
	items: &[ItemFacts],
	predicate: &SearchPredicate,
	category_names: &HashMap<String, String>,
	limit: usize,
) -> Facets {
	let by_category = predicate.without(FacetDimension::Category);
	let by_tag = predicate.without(FacetDimension::Tag);
	let by_premium = predicate.without(FacetDimension::Premium);
	let mut category_counts: HashMap<String, i64> = HashMap::new();
	let mut tag_counts: HashMap<String, i64> = HashMap::new();
	let mut premium_split = PremiumSplit::default();

	for item in items {
		if by_category.matches(item) {
			for slug in &item.categories {
				*category_counts.entry(slug.clone()).or_default() += 1;
			}
		}
		if by_tag.matches(item) {
			for tag in &item.tags {
				*tag_counts.entry(tag.clone()).or_default() += 1;
			}
		}
		if by_premium.matches(item) {
			if item.premium {
				premium_split.premium += 1;
			} else {
				premium_split.free += 1;
			}
		}
	}

	Facets {
		categories: top_buckets(category_counts, limit)
			.into_iter()
			.map(|(slug, count)| CategoryFacet {
				name: category_names.get(&slug).cloned().unwrap_or_else(|| slug.clone()),
				slug,
				count,
			})
			.collect(),
		tags: top_buckets(tag_counts, limit)
			.into_iter()
			.map(|(name, count)| TagFacet { name, count })
			.collect(),
		premium_split,
	}
}
