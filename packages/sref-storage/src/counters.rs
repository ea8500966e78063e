//! Periodic recomputation of denormalized counters. Runs outside request transactions, so the
//! values may lag behind the join tables between runs.

use sqlx::PgExecutor;

use crate::Result;

pub async fn recompute_category_counts<'e, E>(executor: E) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE categories c
SET sref_count = counts.n
FROM (
\tSELECT c2.category_id, count(i.item_id) AS n
\tFROM categories c2
\tLEFT JOIN catalog_item_categories ic ON ic.category_id = c2.category_id
\tLEFT JOIN catalog_items i ON i.item_id = ic.item_id AND i.status = 'ACTIVE'
\tGROUP BY c2.category_id
) counts
WHERE counts.category_id = c.category_id AND c.sref_count IS DISTINCT FROM counts.n",
	)
	.execute(executor)
	.await?;

	Ok(result.rows_affected())
}

pub async fn recompute_tag_counts<'e, E>(executor: E) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE tags t
SET usage_count = counts.n
FROM (
\tSELECT t2.tag_id, count(i.item_id) AS n
\tFROM tags t2
\tLEFT JOIN catalog_item_tags it ON it.tag_id = t2.tag_id
\tLEFT JOIN catalog_items i ON i.item_id = it.item_id AND i.status = 'ACTIVE'
\tGROUP BY t2.tag_id
) counts
WHERE counts.tag_id = t.tag_id AND t.usage_count IS DISTINCT FROM counts.n",
	)
	.execute(executor)
	.await?;

	Ok(result.rows_affected())
}

/// Sets `popularity_score` to the weighted sum of the item counters.
pub async fn recompute_popularity<'e, E>(
	executor: E,
	weights: &sref_config::Popularity,
) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE catalog_items
SET popularity_score = scored.score
FROM (
\tSELECT
\t\titem_id,
\t\tviews * $1::float8 + likes * $2::float8 + favorites * $3::float8 + downloads * $4::float8 AS score
\tFROM catalog_items
\tWHERE status <> 'DELETED'
) scored
WHERE scored.item_id = catalog_items.item_id
\tAND catalog_items.popularity_score IS DISTINCT FROM scored.score",
	)
	.bind(weights.view_weight)
	.bind(weights.like_weight)
	.bind(weights.favorite_weight)
	.bind(weights.download_weight)
	.execute(executor)
	.await?;

	Ok(result.rows_affected())
}
