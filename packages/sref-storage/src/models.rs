use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
	pub user_id: Uuid,
	pub email: String,
	pub display_name: String,
	pub role: String,
	pub is_premium: bool,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CatalogItem {
	pub item_id: Uuid,
	pub code: String,
	pub title: String,
	pub description: String,
	pub prompt_examples: Vec<String>,
	pub featured: bool,
	pub premium: bool,
	pub verified: bool,
	pub views: i64,
	pub likes: i64,
	pub favorites: i64,
	pub downloads: i64,
	pub popularity_score: f64,
	pub status: String,
	pub submitted_by: Option<Uuid>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub deleted_at: Option<OffsetDateTime>,
}

/// Column list matching [`CatalogItem`], qualified with the `i` alias.
pub const CATALOG_ITEM_COLUMNS: &str = "\
i.item_id, i.code, i.title, i.description, i.prompt_examples, i.featured, i.premium, \
i.verified, i.views, i.likes, i.favorites, i.downloads, i.popularity_score, i.status, \
i.submitted_by, i.created_at, i.updated_at, i.deleted_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Category {
	pub category_id: Uuid,
	pub name: String,
	pub slug: String,
	pub icon: Option<String>,
	pub color: Option<String>,
	pub sref_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Tag {
	pub tag_id: Uuid,
	pub name: String,
	pub usage_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CatalogImage {
	pub image_id: Uuid,
	pub item_id: Uuid,
	pub position: i32,
	pub url: String,
	pub thumbnail_url: Option<String>,
	pub width: Option<i32>,
	pub height: Option<i32>,
	pub format: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InteractionEvent {
	pub event_id: Uuid,
	pub item_id: Uuid,
	pub user_id: Option<Uuid>,
	pub kind: String,
	pub occurred_at: OffsetDateTime,
	pub referrer: Option<String>,
	pub ip: Option<String>,
	pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SearchAnalytic {
	pub search_id: Uuid,
	pub query: String,
	pub filters: Value,
	pub sort: String,
	pub user_id: Option<Uuid>,
	pub ip: Option<String>,
	pub results_count: i64,
	pub cache_hit: bool,
	pub created_at: OffsetDateTime,
}
