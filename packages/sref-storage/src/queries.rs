use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Error, Result,
	error::is_unique_violation,
	models::{CATALOG_ITEM_COLUMNS, CatalogImage, CatalogItem, User},
};

pub async fn insert_user<'e, E>(executor: E, user: &User) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO users (user_id, email, display_name, role, is_premium, created_at)
VALUES ($1,$2,$3,$4,$5,$6)",
	)
	.bind(user.user_id)
	.bind(user.email.as_str())
	.bind(user.display_name.as_str())
	.bind(user.role.as_str())
	.bind(user.is_premium)
	.bind(user.created_at)
	.execute(executor)
	.await
	.map_err(|err| {
		if is_unique_violation(&err) {
			Error::Conflict(format!("user {} already exists", user.email))
		} else {
			Error::Sqlx(err)
		}
	})?;

	Ok(())
}

pub async fn get_user<'e, E>(executor: E, user_id: Uuid) -> Result<Option<User>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, User>(
		"\
SELECT user_id, email, display_name, role, is_premium, created_at
FROM users
WHERE user_id = $1",
	)
	.bind(user_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

/// Inserts a new item. A duplicate `code` is reported as [`Error::Conflict`].
pub async fn insert_item<'e, E>(executor: E, item: &CatalogItem) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO catalog_items (
\titem_id,
\tcode,
\ttitle,
\tdescription,
\tprompt_examples,
\tfeatured,
\tpremium,
\tverified,
\tviews,
\tlikes,
\tfavorites,
\tdownloads,
\tpopularity_score,
\tstatus,
\tsubmitted_by,
\tcreated_at,
\tupdated_at,
\tdeleted_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18)",
	)
	.bind(item.item_id)
	.bind(item.code.as_str())
	.bind(item.title.as_str())
	.bind(item.description.as_str())
	.bind(&item.prompt_examples)
	.bind(item.featured)
	.bind(item.premium)
	.bind(item.verified)
	.bind(item.views)
	.bind(item.likes)
	.bind(item.favorites)
	.bind(item.downloads)
	.bind(item.popularity_score)
	.bind(item.status.as_str())
	.bind(item.submitted_by)
	.bind(item.created_at)
	.bind(item.updated_at)
	.bind(item.deleted_at)
	.execute(executor)
	.await
	.map_err(|err| {
		if is_unique_violation(&err) {
			Error::Conflict(format!("code {} already exists", item.code))
		} else {
			Error::Sqlx(err)
		}
	})?;

	Ok(())
}

pub async fn get_item_by_code<'e, E>(executor: E, code: &str) -> Result<Option<CatalogItem>>
where
	E: PgExecutor<'e>,
{
	let sql = format!("SELECT {CATALOG_ITEM_COLUMNS} FROM catalog_items i WHERE i.code = $1");
	let row = sqlx::query_as::<_, CatalogItem>(&sql).bind(code).fetch_optional(executor).await?;

	Ok(row)
}

/// Locks the row for the rest of the transaction.
pub async fn get_item_by_code_for_update<'e, E>(
	executor: E,
	code: &str,
) -> Result<Option<CatalogItem>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"SELECT {CATALOG_ITEM_COLUMNS} FROM catalog_items i WHERE i.code = $1 FOR UPDATE"
	);
	let row = sqlx::query_as::<_, CatalogItem>(&sql).bind(code).fetch_optional(executor).await?;

	Ok(row)
}

pub async fn set_item_status<'e, E>(
	executor: E,
	item_id: Uuid,
	status: &str,
	now: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE catalog_items
SET
\tstatus = $1,
\tupdated_at = $2,
\tdeleted_at = CASE WHEN $1 = 'DELETED' THEN $2 ELSE deleted_at END
WHERE item_id = $3",
	)
	.bind(status)
	.bind(now)
	.bind(item_id)
	.execute(executor)
	.await?;

	if result.rows_affected() == 0 {
		return Err(Error::NotFound(format!("catalog item {item_id}")));
	}

	Ok(())
}

/// Updates curation flags. `None` leaves the stored value alone.
pub async fn set_item_flags<'e, E>(
	executor: E,
	item_id: Uuid,
	featured: Option<bool>,
	verified: Option<bool>,
	premium: Option<bool>,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
UPDATE catalog_items
SET
\tfeatured = COALESCE($1, featured),
\tverified = COALESCE($2, verified),
\tpremium = COALESCE($3, premium)
WHERE item_id = $4",
	)
	.bind(featured)
	.bind(verified)
	.bind(premium)
	.bind(item_id)
	.execute(executor)
	.await?;

	Ok(())
}

/// Adds one to a counter column. `column` must come from a fixed allowlist.
pub async fn increment_counter<'e, E>(executor: E, item_id: Uuid, column: &str) -> Result<()>
where
	E: PgExecutor<'e>,
{
	if !matches!(column, "views" | "likes" | "favorites" | "downloads") {
		return Err(Error::InvalidArgument(format!("unknown counter column {column:?}")));
	}

	let sql = format!("UPDATE catalog_items SET {column} = {column} + 1 WHERE item_id = $1");

	sqlx::query(&sql).bind(item_id).execute(executor).await?;

	Ok(())
}

pub async fn insert_image<'e, E>(executor: E, image: &CatalogImage) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO catalog_images (image_id, item_id, position, url, thumbnail_url, width, height, format)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8)",
	)
	.bind(image.image_id)
	.bind(image.item_id)
	.bind(image.position)
	.bind(image.url.as_str())
	.bind(image.thumbnail_url.as_deref())
	.bind(image.width)
	.bind(image.height)
	.bind(image.format.as_deref())
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn list_images<'e, E>(executor: E, item_id: Uuid) -> Result<Vec<CatalogImage>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, CatalogImage>(
		"\
SELECT image_id, item_id, position, url, thumbnail_url, width, height, format
FROM catalog_images
WHERE item_id = $1
ORDER BY position ASC, image_id ASC",
	)
	.bind(item_id)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}
