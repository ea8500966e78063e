//! Sort/Rank Resolver.

use std::{cmp::Ordering, collections::HashMap};

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::search::ItemFacts;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
	Relevance,
	Popularity,
	Newest,
	Views,
	Likes,
	Trending,
}
impl SortKey {
	/// A missing key means relevance. An unrecognized key falls back to popularity; sort
	/// selection is never an error.
	pub fn resolve(raw: Option<&str>) -> Self {
		let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
			return Self::Relevance;
		};

		match raw.to_ascii_lowercase().as_str() {
			"relevance" => Self::Relevance,
			"popularity" => Self::Popularity,
			"newest" => Self::Newest,
			"views" => Self::Views,
			"likes" => Self::Likes,
			"trending" => Self::Trending,
			_ => Self::Popularity,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Relevance => "relevance",
			Self::Popularity => "popularity",
			Self::Newest => "newest",
			Self::Views => "views",
			Self::Likes => "likes",
			Self::Trending => "trending",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortColumn {
	CreatedAt,
	Views,
	Likes,
	PopularityScore,
	Featured,
	Verified,
	GrowthRate,
	RecentWindow,
	ItemId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
	Asc,
	Desc,
}
impl Direction {
	pub fn as_sql(self) -> &'static str {
		match self {
			Self::Asc => "ASC",
			Self::Desc => "DESC",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderTerm {
	pub column: SortColumn,
	pub direction: Direction,
}

const fn desc(column: SortColumn) -> OrderTerm {
	OrderTerm { column, direction: Direction::Desc }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortPlan {
	pub key: SortKey,
	/// Always ends with `item_id ASC` so equal rows have a stable order.
	pub terms: Vec<OrderTerm>,
}
impl SortPlan {
	pub fn for_key(key: SortKey) -> Self {
		let mut terms = match key {
			SortKey::Newest => vec![desc(SortColumn::CreatedAt)],
			SortKey::Views => vec![desc(SortColumn::Views), desc(SortColumn::CreatedAt)],
			SortKey::Likes => vec![desc(SortColumn::Likes), desc(SortColumn::CreatedAt)],
			SortKey::Popularity => vec![desc(SortColumn::PopularityScore), desc(SortColumn::Views)],
			SortKey::Relevance => vec![
				desc(SortColumn::Featured),
				desc(SortColumn::Verified),
				desc(SortColumn::PopularityScore),
			],
			SortKey::Trending => vec![desc(SortColumn::GrowthRate), desc(SortColumn::RecentWindow)],
		};

		terms.push(OrderTerm { column: SortColumn::ItemId, direction: Direction::Asc });

		Self { key, terms }
	}

	/// Trending plans need the two-window aggregation and drop items with no recent activity.
	pub fn requires_trend_windows(&self) -> bool {
		self.key == SortKey::Trending
	}
}

/// `prior == 0` yields `recent`; otherwise the relative change. Not clamped.
pub fn growth_rate(recent: i64, prior: i64) -> f64 {
	if prior == 0 { recent as f64 } else { (recent - prior) as f64 / prior as f64 }
}

/// Event counts for one item in the recent and prior windows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrendWindows {
	pub recent: i64,
	pub prior: i64,
}
impl TrendWindows {
	pub fn growth_rate(&self) -> f64 {
		growth_rate(self.recent, self.prior)
	}

	pub fn is_trending(&self) -> bool {
		self.recent > 0
	}
}

/// Recent window is `(recent_start, now]`, prior window is `(prior_start, recent_start]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowBounds {
	pub prior_start: OffsetDateTime,
	pub recent_start: OffsetDateTime,
	pub now: OffsetDateTime,
}
impl WindowBounds {
	pub fn ending_at(now: OffsetDateTime, window_hours: i64) -> Self {
		let width = Duration::hours(window_hours);

		Self { prior_start: now - width - width, recent_start: now - width, now }
	}

	pub fn classify(&self, at: OffsetDateTime) -> Option<Window> {
		if at > self.recent_start && at <= self.now {
			Some(Window::Recent)
		} else if at > self.prior_start && at <= self.recent_start {
			Some(Window::Prior)
		} else {
			None
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Window {
	Recent,
	Prior,
}

/// Counts events per item into their windows. Events outside both windows are ignored.
pub fn tally_windows(
	bounds: &WindowBounds,
	events: impl IntoIterator<Item = (Uuid, OffsetDateTime)>,
) -> HashMap<Uuid, TrendWindows> {
	let mut out: HashMap<Uuid, TrendWindows> = HashMap::new();

	for (item_id, at) in events {
		match bounds.classify(at) {
			Some(Window::Recent) => out.entry(item_id).or_default().recent += 1,
			Some(Window::Prior) => out.entry(item_id).or_default().prior += 1,
			None => {},
		}
	}

	out
}

/// Orders items by `plan`. Under a trending plan items without recent activity are removed.
pub fn rank_items<'a>(
	items: impl IntoIterator<Item = &'a ItemFacts>,
	plan: &SortPlan,
	trends: &HashMap<Uuid, TrendWindows>,
) -> Vec<&'a ItemFacts> {
	let window = |item: &ItemFacts| trends.get(&item.item_id).copied().unwrap_or_default();
	let mut ranked: Vec<&ItemFacts> = items
		.into_iter()
		.filter(|item| !plan.requires_trend_windows() || window(*item).is_trending())
		.collect();

	ranked.sort_by(|a, b| {
		for term in &plan.terms {
			let ordering = compare_column(term.column, a, b, &window);
			let ordering = match term.direction {
				Direction::Asc => ordering,
				Direction::Desc => ordering.reverse(),
			};

			if ordering != Ordering::Equal {
				return ordering;
			}
		}

		Ordering::Equal
	});

	ranked
}

fn compare_column(
	column: SortColumn,
	a: &ItemFacts,
	b: &ItemFacts,
	window: &impl Fn(&ItemFacts) -> TrendWindows,
) -> Ordering {
	match column {
		SortColumn::CreatedAt => a.created_at.cmp(&b.created_at),
		SortColumn::Views => a.views.cmp(&b.views),
		SortColumn::Likes => a.likes.cmp(&b.likes),
		SortColumn::PopularityScore => a.popularity_score.total_cmp(&b.popularity_score),
		SortColumn::Featured => a.featured.cmp(&b.featured),
		SortColumn::Verified => a.verified.cmp(&b.verified),
		SortColumn::GrowthRate => window(a).growth_rate().total_cmp(&window(b).growth_rate()),
		SortColumn::RecentWindow => window(a).recent.cmp(&window(b).recent),
		SortColumn::ItemId => a.item_id.cmp(&b.item_id),
	}
}
