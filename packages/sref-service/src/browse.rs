use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sref_storage::taxonomy;

use crate::{Result, SrefService};

const DEFAULT_TAG_LIMIT: u32 = 50;
const MAX_TAG_LIMIT: u32 = 200;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
	pub category_id: Uuid,
	pub slug: String,
	pub name: String,
	pub icon: Option<String>,
	pub color: Option<String>,
	pub sref_count: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSummary {
	pub tag_id: Uuid,
	pub name: String,
	pub usage_count: i64,
}

impl SrefService {
	/// Categories with their denormalized ACTIVE item counts, largest first.
	pub async fn list_categories(&self) -> Result<Vec<CategorySummary>> {
		let rows = taxonomy::list_categories(&self.db.pool).await?;

		Ok(rows
			.into_iter()
			.map(|row| CategorySummary {
				category_id: row.category_id,
				slug: row.slug,
				name: row.name,
				icon: row.icon,
				color: row.color,
				sref_count: row.sref_count,
			})
			.collect())
	}

	pub async fn list_tags(&self, limit: Option<i64>) -> Result<Vec<TagSummary>> {
		let limit = clamp_tag_limit(limit);
		let rows = taxonomy::list_tags(&self.db.pool, i64::from(limit)).await?;

		Ok(rows
			.into_iter()
			.map(|row| TagSummary { tag_id: row.tag_id, name: row.name, usage_count: row.usage_count })
			.collect())
	}
}

fn clamp_tag_limit(limit: Option<i64>) -> u32 {
	match limit {
		None => DEFAULT_TAG_LIMIT,
		Some(value) if value < 1 => 1,
		Some(value) => u32::try_from(value).unwrap_or(MAX_TAG_LIMIT).min(MAX_TAG_LIMIT),
	}
}
