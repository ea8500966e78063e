//! Read-through cache for whole search responses, keyed by the normalized request and caller.

use serde_json::{Value, json};
use time::{Duration, OffsetDateTime};

use sref_domain::{
	access::Caller,
	ranking::SortKey,
	search::{SearchPredicate, TextFilter},
};

use crate::{Error, Result, SrefService, search::SearchResponse};

const CACHE_SCHEMA: &str = "search_cache/v1";

/// Inputs that determine a cached response.
pub(crate) struct CacheKeyInput<'a> {
	pub(crate) raw_query: &'a str,
	pub(crate) predicate: &'a SearchPredicate,
	pub(crate) sort: SortKey,
	pub(crate) page: u32,
	pub(crate) limit: u32,
	pub(crate) facets: bool,
	pub(crate) caller: &'a Caller,
}

pub(crate) fn build_cache_key(input: &CacheKeyInput<'_>) -> Result<String> {
	let text = match &input.predicate.text {
		Some(TextFilter::Prefix { terms }) => json!({ "prefix": terms }),
		Some(TextFilter::Substring { needle }) => json!({ "substring": needle }),
		None => Value::Null,
	};
	let numeric: Vec<Value> = input
		.predicate
		.numeric_ranges
		.iter()
		.map(|range| json!([range.field.column(), range.min, range.max]))
		.collect();
	let payload = json!({
		"schema": CACHE_SCHEMA,
		"query": input.raw_query.trim().to_lowercase(),
		"text": text,
		"categories": input.predicate.categories,
		"tags": input.predicate.tags,
		"premium": input.predicate.premium,
		"featured": input.predicate.featured,
		"verified": input.predicate.verified,
		"created_from": input.predicate.created_from.map(|ts| ts.unix_timestamp_nanos().to_string()),
		"created_to": input.predicate.created_to.map(|ts| ts.unix_timestamp_nanos().to_string()),
		"numeric_ranges": numeric,
		"sort": input.sort.as_str(),
		"page": input.page,
		"limit": input.limit,
		"facets": input.facets,
		"user": input.caller.user_id().map(|id| id.to_string()).unwrap_or_else(|| "anonymous".to_string()),
		"access": input.caller.access_level().as_str(),
	});

	hash_cache_key(&payload)
}

fn hash_cache_key(payload: &Value) -> Result<String> {
	let raw = serde_json::to_vec(payload).map_err(|err| Error::Storage {
		message: format!("Failed to encode cache key payload: {err}"),
	})?;

	Ok(blake3::hash(&raw).to_hex().to_string())
}

pub(crate) fn cache_key_prefix(key: &str) -> &str {
	&key[..key.len().min(12)]
}

impl SrefService {
	/// Cache failures are logged and treated as a miss.
	pub(crate) async fn read_cached_search(&self, key: &str) -> Option<SearchResponse> {
		let now = OffsetDateTime::now_utc();
		let payload =
			match sref_storage::cache::fetch_cache_payload(&self.db.pool, key, now).await {
				Ok(Some(payload)) => payload,
				Ok(None) => {
					tracing::debug!(cache_key_prefix = cache_key_prefix(key), "Cache miss.");

					return None;
				},
				Err(err) => {
					tracing::warn!(
						error = %err,
						cache_key_prefix = cache_key_prefix(key),
						"Cache read failed."
					);

					return None;
				},
			};

		match serde_json::from_value(payload) {
			Ok(response) => {
				tracing::debug!(cache_key_prefix = cache_key_prefix(key), "Cache hit.");

				Some(response)
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					cache_key_prefix = cache_key_prefix(key),
					"Cache payload decode failed."
				);

				None
			},
		}
	}

	pub(crate) async fn write_cached_search(&self, key: &str, response: &SearchResponse) {
		let cache_cfg = &self.cfg.search.cache;
		let payload = match serde_json::to_value(response) {
			Ok(value) => value,
			Err(err) => {
				tracing::warn!(
					error = %err,
					cache_key_prefix = cache_key_prefix(key),
					"Cache payload encode failed."
				);

				return;
			},
		};

		if let Some(max) = cache_cfg.max_payload_bytes {
			let size = serde_json::to_vec(&payload).map(|raw| raw.len() as u64).unwrap_or(u64::MAX);

			if size > max {
				tracing::warn!(
					cache_key_prefix = cache_key_prefix(key),
					payload_size = size,
					max_payload_bytes = max,
					"Cache payload too large; skipping store."
				);

				return;
			}
		}

		let stored_at = OffsetDateTime::now_utc();
		let expires_at = stored_at + Duration::seconds(cache_cfg.ttl_seconds);

		if let Err(err) = sref_storage::cache::store_cache_payload(
			&self.db.pool,
			key,
			&payload,
			stored_at,
			expires_at,
		)
		.await
		{
			tracing::warn!(
				error = %err,
				cache_key_prefix = cache_key_prefix(key),
				"Cache write failed."
			);
		}
	}
}
