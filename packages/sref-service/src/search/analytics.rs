use serde_json::Value;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use sref_storage::models::SearchAnalytic;

pub(crate) struct SearchEvent {
	pub(crate) query: String,
	pub(crate) filters: Value,
	pub(crate) sort: &'static str,
	pub(crate) user_id: Option<Uuid>,
	pub(crate) ip: Option<String>,
	pub(crate) results_count: u64,
	pub(crate) cache_hit: bool,
}

/// Records the search on a detached task. Failures are logged and never reach the caller.
pub(crate) fn spawn_record(pool: PgPool, event: SearchEvent) {
	let row = SearchAnalytic {
		search_id: Uuid::new_v4(),
		query: event.query,
		filters: event.filters,
		sort: event.sort.to_string(),
		user_id: event.user_id,
		ip: event.ip,
		results_count: i64::try_from(event.results_count).unwrap_or(i64::MAX),
		cache_hit: event.cache_hit,
		created_at: OffsetDateTime::now_utc(),
	};

	tokio::spawn(async move {
		if let Err(err) = sref_storage::events::insert_search_analytic(&pool, &row).await {
			tracing::warn!(error = %err, search_id = %row.search_id, "Search analytics write failed.");
		}
	});
}
