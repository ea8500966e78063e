use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use sref_storage::{cache, counters};

use crate::{Requester, Result, SrefService};

/// Rows touched by one recompute pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeReport {
	pub categories: u64,
	pub tags: u64,
	pub items: u64,
	pub cache_purged: u64,
}

impl SrefService {
	/// Refreshes denormalized counts and popularity scores, then drops expired cache rows.
	pub async fn recompute(&self) -> Result<RecomputeReport> {
		let mut tx = self.db.pool.begin().await?;
		let categories = counters::recompute_category_counts(&mut *tx).await?;
		let tags = counters::recompute_tag_counts(&mut *tx).await?;
		let items = counters::recompute_popularity(&mut *tx, &self.cfg.popularity).await?;

		tx.commit().await?;

		let cache_purged = cache::purge_expired(&self.db.pool, OffsetDateTime::now_utc()).await?;
		let report = RecomputeReport { categories, tags, items, cache_purged };

		tracing::info!(
			categories = report.categories,
			tags = report.tags,
			items = report.items,
			cache_purged = report.cache_purged,
			"Recompute finished."
		);

		Ok(report)
	}

	pub async fn admin_recompute(&self, requester: &Requester) -> Result<RecomputeReport> {
		self.require_admin(requester).await?;
		self.recompute().await
	}
}
