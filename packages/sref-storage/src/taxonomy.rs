use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{
	Result,
	models::{Category, Tag},
};

pub async fn upsert_category<'e, E>(executor: E, category: &Category) -> Result<Uuid>
where
	E: PgExecutor<'e>,
{
	let category_id: Uuid = sqlx::query_scalar(
		"\
INSERT INTO categories (category_id, name, slug, icon, color, sref_count)
VALUES ($1,$2,$3,$4,$5,0)
ON CONFLICT (slug) DO UPDATE
SET name = EXCLUDED.name, icon = EXCLUDED.icon, color = EXCLUDED.color
RETURNING category_id",
	)
	.bind(category.category_id)
	.bind(category.name.as_str())
	.bind(category.slug.as_str())
	.bind(category.icon.as_deref())
	.bind(category.color.as_deref())
	.fetch_one(executor)
	.await?;

	Ok(category_id)
}

/// Categories for the given slugs. Unknown slugs are simply absent from the result.
pub async fn categories_by_slugs<'e, E>(executor: E, slugs: &[String]) -> Result<Vec<Category>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, Category>(
		"\
SELECT category_id, name, slug, icon, color, sref_count
FROM categories
WHERE slug = ANY($1)
ORDER BY slug ASC",
	)
	.bind(slugs)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn list_categories<'e, E>(executor: E) -> Result<Vec<Category>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, Category>(
		"\
SELECT category_id, name, slug, icon, color, sref_count
FROM categories
ORDER BY sref_count DESC, name ASC, slug ASC",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Returns the tag id for `name`, creating the tag when it does not exist yet.
pub async fn get_or_create_tag<'e, E>(executor: E, name: &str) -> Result<Uuid>
where
	E: PgExecutor<'e>,
{
	let tag_id: Uuid = sqlx::query_scalar(
		"\
INSERT INTO tags (tag_id, name, usage_count)
VALUES ($1,$2,0)
ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
RETURNING tag_id",
	)
	.bind(Uuid::new_v4())
	.bind(name)
	.fetch_one(executor)
	.await?;

	Ok(tag_id)
}

pub async fn list_tags<'e, E>(executor: E, limit: i64) -> Result<Vec<Tag>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, Tag>(
		"\
SELECT tag_id, name, usage_count
FROM tags
ORDER BY usage_count DESC, name ASC
LIMIT $1",
	)
	.bind(limit)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn link_category<'e, E>(executor: E, item_id: Uuid, category_id: Uuid) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO catalog_item_categories (item_id, category_id)
VALUES ($1,$2)
ON CONFLICT DO NOTHING",
	)
	.bind(item_id)
	.bind(category_id)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn link_tag<'e, E>(executor: E, item_id: Uuid, tag_id: Uuid) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO catalog_item_tags (item_id, tag_id)
VALUES ($1,$2)
ON CONFLICT DO NOTHING",
	)
	.bind(item_id)
	.bind(tag_id)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn item_categories<'e, E>(executor: E, item_id: Uuid) -> Result<Vec<Category>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, Category>(
		"\
SELECT c.category_id, c.name, c.slug, c.icon, c.color, c.sref_count
FROM categories c
JOIN catalog_item_categories ic ON ic.category_id = c.category_id
WHERE ic.item_id = $1
ORDER BY c.name ASC, c.slug ASC",
	)
	.bind(item_id)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn item_tags<'e, E>(executor: E, item_id: Uuid) -> Result<Vec<Tag>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, Tag>(
		"\
SELECT t.tag_id, t.name, t.usage_count
FROM tags t
JOIN catalog_item_tags it ON it.tag_id = t.tag_id
WHERE it.item_id = $1
ORDER BY t.name ASC",
	)
	.bind(item_id)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Category slugs and tag names for a batch of items as `(item_id, kind, value)` rows, where
/// `kind` is `category` or `tag`.
pub async fn labels_for_items<'e, E>(
	executor: E,
	item_ids: &[Uuid],
) -> Result<Vec<(Uuid, String, String)>>
where
	E: PgExecutor<'e>,
{
	let rows: Vec<(Uuid, String, String)> = sqlx::query_as(
		"\
SELECT ic.item_id, 'category' AS kind, c.slug AS value
FROM catalog_item_categories ic
JOIN categories c ON c.category_id = ic.category_id
WHERE ic.item_id = ANY($1)
UNION ALL
SELECT it.item_id, 'tag' AS kind, t.name AS value
FROM catalog_item_tags it
JOIN tags t ON t.tag_id = it.tag_id
WHERE it.item_id = ANY($1)
ORDER BY 1, 2, 3",
	)
	.bind(item_ids)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}
