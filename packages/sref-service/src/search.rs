mod analytics;
mod cache;
mod facets;
mod filter;
mod ranking;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use sref_domain::{
	access::Caller,
	catalog::InteractionKind,
	facets::Facets,
	pagination::Pagination,
	ranking::{SortKey, SortPlan, WindowBounds},
	search::{self as domain_search, DateRange, NumericField, NumericRange, SearchCriteria, TextMode},
};
use sref_storage::models::{CATALOG_ITEM_COLUMNS, CatalogItem};

use self::{
	analytics::SearchEvent,
	cache::CacheKeyInput,
	filter::SearchScope,
	ranking::TrendScope,
};
use crate::{Error, Requester, Result, SrefService};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
	#[serde(default)]
	pub query: String,
	#[serde(default)]
	pub filters: SearchFilters,
	#[serde(default)]
	pub facets: bool,
	pub page: Option<i64>,
	pub limit: Option<i64>,
	pub sort: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
	pub categories: Option<Vec<String>>,
	pub tags: Option<Vec<String>>,
	pub premium: Option<bool>,
	pub featured: Option<bool>,
	pub verified: Option<bool>,
	pub date_range: Option<DateRangeFilter>,
	/// Keyed by field name: `views`, `likes`, `favorites`, `downloads`, `popularity_score`.
	pub numeric_ranges: Option<BTreeMap<String, RangeBounds>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DateRangeFilter {
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub from: Option<OffsetDateTime>,
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub to: Option<OffsetDateTime>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct RangeBounds {
	pub min: Option<f64>,
	pub max: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
	pub results: Vec<CatalogItemSummary>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub facets: Option<Facets>,
	pub pagination: Pagination,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItemSummary {
	pub item_id: Uuid,
	pub code: String,
	pub title: String,
	pub description: String,
	pub featured: bool,
	pub premium: bool,
	pub verified: bool,
	pub views: i64,
	pub likes: i64,
	pub favorites: i64,
	pub downloads: i64,
	pub popularity_score: f64,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	pub categories: Vec<String>,
	pub tags: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub trend: Option<TrendSummary>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
	pub recent_window: i64,
	pub prior_window: i64,
	pub growth_rate: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingResponse {
	pub results: Vec<CatalogItemSummary>,
	pub window_hours: i64,
}

/// A request that passed shape validation. No storage has been touched yet.
#[derive(Debug)]
struct ValidatedSearch {
	criteria: SearchCriteria,
	plan: SortPlan,
	page: u32,
	limit: u32,
	facets: bool,
}

#[derive(sqlx::FromRow)]
struct SearchRow {
	#[sqlx(flatten)]
	item: CatalogItem,
	recent_window: Option<i64>,
	prior_window: Option<i64>,
	growth_rate: Option<f64>,
}

impl SrefService {
	pub async fn search(&self, requester: &Requester, req: SearchRequest) -> Result<SearchResponse> {
		let validated = self.validate_search(&req)?;
		let caller = self.resolve_caller(requester).await?;
		let predicate = domain_search::build_predicate(
			&validated.criteria,
			&caller,
			self.text_mode()?,
			self.cfg.search.max_query_terms as usize,
		)?;
		let cache_key = if self.cfg.search.cache.enabled {
			match cache::build_cache_key(&CacheKeyInput {
				raw_query: &req.query,
				predicate: &predicate,
				sort: validated.plan.key,
				page: validated.page,
				limit: validated.limit,
				facets: validated.facets,
				caller: &caller,
			}) {
				Ok(key) => Some(key),
				Err(err) => {
					tracing::warn!(error = %err, "Cache key build failed.");

					None
				},
			}
		} else {
			None
		};

		if let Some(key) = cache_key.as_deref()
			&& let Some(cached) = self.read_cached_search(key).await
		{
			self.record_search(requester, &caller, &req, &validated, cached.pagination.total, true);

			return Ok(cached);
		}

		let response = self
			.run_search(&predicate, &validated.plan, validated.page, validated.limit, validated.facets)
			.await
			.inspect_err(|err| {
				tracing::error!(
					error = %err,
					query = req.query.as_str(),
					filters = %filters_json(&req.filters),
					user_id = ?caller.user_id(),
					"Search failed."
				);
			})
			.map_err(|_| Error::Storage { message: "Search is temporarily unavailable.".to_string() })?;

		if let Some(key) = cache_key.as_deref() {
			self.write_cached_search(key, &response).await;
		}

		self.record_search(requester, &caller, &req, &validated, response.pagination.total, false);

		Ok(response)
	}

	/// Items ranked by growth between the two activity windows, visible at the caller's level.
	pub async fn trending(
		&self,
		requester: &Requester,
		limit: Option<i64>,
	) -> Result<TrendingResponse> {
		let limit = self.resolve_limit(limit)?;
		let caller = self.resolve_caller(requester).await?;
		let predicate = domain_search::build_predicate(
			&SearchCriteria::default(),
			&caller,
			self.text_mode()?,
			self.cfg.search.max_query_terms as usize,
		)?;
		let plan = SortPlan::for_key(SortKey::Trending);
		let response = self
			.run_search(&predicate, &plan, 1, limit, false)
			.await
			.inspect_err(|err| {
				tracing::error!(
					error = %err,
					limit,
					window_hours = self.cfg.trending.window_hours,
					user_id = ?caller.user_id(),
					"Trending failed."
				);
			})
			.map_err(|_| Error::Storage { message: "Trending is temporarily unavailable.".to_string() })?;

		Ok(TrendingResponse {
			results: response.results,
			window_hours: self.cfg.trending.window_hours,
		})
	}

	fn validate_search(&self, req: &SearchRequest) -> Result<ValidatedSearch> {
		let search_cfg = &self.cfg.search;
		let page = match req.page {
			None => 1,
			Some(page) if page >= 1 => u32::try_from(page)
				.map_err(|_| Error::invalid("$.page", "page is too large."))?,
			Some(_) => return Err(Error::invalid("$.page", "page must be 1 or greater.")),
		};
		let limit = self.resolve_limit(req.limit)?;

		if req.query.chars().count() > search_cfg.max_query_chars as usize {
			return Err(Error::invalid(
				"$.query",
				format!("query must be at most {} characters.", search_cfg.max_query_chars),
			));
		}

		let filters = &req.filters;
		let max_values = search_cfg.max_filter_values as usize;

		for (path, values) in [
			("$.filters.categories", &filters.categories),
			("$.filters.tags", &filters.tags),
		] {
			if values.as_ref().is_some_and(|values| values.len() > max_values) {
				return Err(Error::invalid(
					path,
					format!("at most {max_values} values are allowed."),
				));
			}
		}

		let mut numeric_ranges = Vec::new();

		for (name, bounds) in filters.numeric_ranges.iter().flatten() {
			let field: NumericField = name
				.parse()
				.map_err(|message: String| {
					Error::invalid(format!("$.filters.numericRanges.{name}"), message)
				})?;

			numeric_ranges.push(NumericRange { field, min: bounds.min, max: bounds.max });
		}

		let date_range = filters
			.date_range
			.as_ref()
			.map(|range| DateRange { from: range.from, to: range.to })
			.unwrap_or_default();

		let criteria = SearchCriteria {
			text: req.query.clone(),
			categories: filters.categories.clone().unwrap_or_default(),
			tags: filters.tags.clone().unwrap_or_default(),
			premium: filters.premium,
			featured: filters.featured,
			verified: filters.verified,
			date_range,
			numeric_ranges,
		};

		domain_search::validate_criteria(&criteria)?;

		Ok(ValidatedSearch {
			criteria,
			plan: SortPlan::for_key(SortKey::resolve(req.sort.as_deref())),
			page,
			limit,
			facets: req.facets,
		})
	}

	fn resolve_limit(&self, limit: Option<i64>) -> Result<u32> {
		let max = self.cfg.search.max_limit;

		match limit {
			None => Ok(self.cfg.search.default_limit),
			Some(limit) if (1..=i64::from(max)).contains(&limit) => Ok(limit as u32),
			Some(_) =>
				Err(Error::invalid("$.limit", format!("limit must be between 1 and {max}."))),
		}
	}

	fn text_mode(&self) -> Result<TextMode> {
		self.cfg
			.search
			.text_mode
			.parse()
			.map_err(|message: String| Error::Storage { message })
	}

	fn trend_kind(&self) -> Result<InteractionKind> {
		self.cfg
			.trending
			.event_kind
			.parse()
			.map_err(|message: String| Error::Storage { message })
	}

	async fn run_search(
		&self,
		predicate: &domain_search::SearchPredicate,
		plan: &SortPlan,
		page: u32,
		limit: u32,
		with_facets: bool,
	) -> Result<SearchResponse> {
		let trend = if plan.requires_trend_windows() {
			Some(TrendScope {
				bounds: WindowBounds::ending_at(
					OffsetDateTime::now_utc(),
					self.cfg.trending.window_hours,
				),
				kind: self.trend_kind()?,
			})
		} else {
			None
		};
		let scope = SearchScope { predicate, trend };
		let pool = &self.db.pool;
		let facet_limit = self.cfg.search.facet_limit;
		let (total, rows, facets) = tokio::try_join!(
			async {
				let total: i64 = count_query(&scope).build_query_scalar().fetch_one(pool).await?;

				Ok::<_, Error>(total)
			},
			async {
				let rows: Vec<SearchRow> =
					page_query(&scope, plan, page, limit).build_query_as().fetch_all(pool).await?;

				Ok::<_, Error>(rows)
			},
			async {
				if with_facets {
					facets::aggregate(pool, &scope, facet_limit).await.map(Some)
				} else {
					Ok(None)
				}
			},
		)?;
		let results = self.summarize(rows).await?;
		let total = u64::try_from(total).unwrap_or_default();

		Ok(SearchResponse { results, facets, pagination: Pagination::new(page, limit, total) })
	}

	async fn summarize(&self, rows: Vec<SearchRow>) -> Result<Vec<CatalogItemSummary>> {
		let ids: Vec<Uuid> = rows.iter().map(|row| row.item.item_id).collect();
		let mut labels: HashMap<Uuid, (Vec<String>, Vec<String>)> = HashMap::new();

		if !ids.is_empty() {
			for (item_id, kind, value) in
				sref_storage::taxonomy::labels_for_items(&self.db.pool, &ids).await?
			{
				let entry = labels.entry(item_id).or_default();

				if kind == "category" {
					entry.0.push(value);
				} else {
					entry.1.push(value);
				}
			}
		}

		Ok(rows
			.into_iter()
			.map(|row| {
				let (categories, tags) = labels.remove(&row.item.item_id).unwrap_or_default();
				let trend = match (row.recent_window, row.prior_window, row.growth_rate) {
					(Some(recent_window), Some(prior_window), Some(growth_rate)) =>
						Some(TrendSummary { recent_window, prior_window, growth_rate }),
					_ => None,
				};

				summary_from_item(row.item, categories, tags, trend)
			})
			.collect())
	}

	fn record_search(
		&self,
		requester: &Requester,
		caller: &Caller,
		req: &SearchRequest,
		validated: &ValidatedSearch,
		results_count: u64,
		cache_hit: bool,
	) {
		analytics::spawn_record(
			self.db.pool.clone(),
			SearchEvent {
				query: req.query.clone(),
				filters: filters_json(&req.filters),
				sort: validated.plan.key.as_str(),
				user_id: caller.user_id(),
				ip: requester.ip.clone(),
				results_count,
				cache_hit,
			},
		);
	}
}

pub(crate) fn summary_from_item(
	item: CatalogItem,
	categories: Vec<String>,
	tags: Vec<String>,
	trend: Option<TrendSummary>,
) -> CatalogItemSummary {
	CatalogItemSummary {
		item_id: item.item_id,
		code: item.code,
		title: item.title,
		description: item.description,
		featured: item.featured,
		premium: item.premium,
		verified: item.verified,
		views: item.views,
		likes: item.likes,
		favorites: item.favorites,
		downloads: item.downloads,
		popularity_score: item.popularity_score,
		created_at: item.created_at,
		categories,
		tags,
		trend,
	}
}

fn filters_json(filters: &SearchFilters) -> Value {
	serde_json::to_value(filters).unwrap_or(Value::Null)
}

fn count_query(scope: &SearchScope<'_>) -> QueryBuilder<'static, Postgres> {
	let mut qb = QueryBuilder::new("");

	filter::push_with(&mut qb, scope);
	qb.push("SELECT count(*)");
	filter::push_from_where(&mut qb, scope, "");

	qb
}

fn page_query(
	scope: &SearchScope<'_>,
	plan: &SortPlan,
	page: u32,
	limit: u32,
) -> QueryBuilder<'static, Postgres> {
	let mut qb = QueryBuilder::new("");

	filter::push_with(&mut qb, scope);
	qb.push("SELECT ");
	qb.push(CATALOG_ITEM_COLUMNS);
	qb.push(ranking::trend_columns(scope.trend.is_some()));
	filter::push_from_where(&mut qb, scope, "");
	ranking::push_order_by(&mut qb, plan);
	qb.push(" LIMIT ");
	qb.push_bind(i64::from(limit));
	qb.push(" OFFSET ");
	qb.push_bind(i64::try_from(Pagination::offset(page, limit)).unwrap_or(i64::MAX));

	qb
}
