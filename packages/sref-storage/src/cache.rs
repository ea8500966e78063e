use serde_json::Value;
use sqlx::PgExecutor;
use time::OffsetDateTime;

use crate::Result;

/// Returns the payload for a live entry and records the hit.
pub async fn fetch_cache_payload<'e, E>(
	executor: E,
	cache_key: &str,
	now: OffsetDateTime,
) -> Result<Option<Value>>
where
	E: PgExecutor<'e>,
{
	let payload: Option<Value> = sqlx::query_scalar(
		"\
UPDATE search_cache
SET hit_count = hit_count + 1, last_accessed_at = $2
WHERE cache_key = $1 AND expires_at > $2
RETURNING payload",
	)
	.bind(cache_key)
	.bind(now)
	.fetch_optional(executor)
	.await?;

	Ok(payload)
}

pub async fn store_cache_payload<'e, E>(
	executor: E,
	cache_key: &str,
	payload: &Value,
	now: OffsetDateTime,
	expires_at: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO search_cache (cache_key, payload, created_at, expires_at, hit_count, last_accessed_at)
VALUES ($1,$2,$3,$4,0,$3)
ON CONFLICT (cache_key) DO UPDATE
SET
\tpayload = EXCLUDED.payload,
\tcreated_at = EXCLUDED.created_at,
\texpires_at = EXCLUDED.expires_at,
\thit_count = 0,
\tlast_accessed_at = EXCLUDED.last_accessed_at",
	)
	.bind(cache_key)
	.bind(payload)
	.bind(now)
	.bind(expires_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn purge_expired<'e, E>(executor: E, now: OffsetDateTime) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM search_cache WHERE expires_at <= $1")
		.bind(now)
		.execute(executor)
		.await?;

	Ok(result.rows_affected())
}
