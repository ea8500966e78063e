use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use sref_domain::{
	access::{AccessLevel, Caller},
	catalog::{self, CatalogStatus, LifecycleAction},
};
use sref_storage::{
	models::{CatalogImage, CatalogItem},
	queries, taxonomy,
};

use crate::{Error, Requester, Result, SrefService, search::CatalogItemSummary};

const MAX_LABELS_PER_ITEM: usize = 20;
const MAX_IMAGES_PER_ITEM: usize = 20;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitItemRequest {
	pub code: String,
	pub title: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub prompt_examples: Vec<String>,
	#[serde(default)]
	pub categories: Vec<String>,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default)]
	pub images: Vec<ImageInput>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInput {
	pub url: String,
	pub thumbnail_url: Option<String>,
	pub width: Option<i32>,
	pub height: Option<i32>,
	pub format: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitItemResponse {
	pub item_id: Uuid,
	pub code: String,
	pub status: CatalogStatus,
}

/// Curation flags an admin may set while approving.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ApproveRequest {
	pub featured: Option<bool>,
	pub verified: Option<bool>,
	pub premium: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleResponse {
	pub code: String,
	pub status: CatalogStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItemDetail {
	#[serde(flatten)]
	pub summary: CatalogItemSummary,
	pub prompt_examples: Vec<String>,
	pub category_names: Vec<String>,
	pub images: Vec<ImageView>,
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageView {
	pub image_id: Uuid,
	pub position: i32,
	pub url: String,
	pub thumbnail_url: Option<String>,
	pub width: Option<i32>,
	pub height: Option<i32>,
	pub format: Option<String>,
}

impl SrefService {
	/// Public detail view. Anything not ACTIVE, or premium for anonymous callers, is NotFound.
	pub async fn get_item(&self, requester: &Requester, code: &str) -> Result<CatalogItemDetail> {
		let caller = self.resolve_caller(requester).await?;
		let item = self.visible_item(&caller, code).await?;
		let (categories, tags, images) = tokio::try_join!(
			taxonomy::item_categories(&self.db.pool, item.item_id),
			taxonomy::item_tags(&self.db.pool, item.item_id),
			queries::list_images(&self.db.pool, item.item_id),
		)?;
		let prompt_examples = item.prompt_examples.clone();
		let updated_at = item.updated_at;
		let category_names = categories.iter().map(|category| category.name.clone()).collect();
		let summary = crate::search::summary_from_item(
			item,
			categories.into_iter().map(|category| category.slug).collect(),
			tags.into_iter().map(|tag| tag.name).collect(),
			None,
		);

		Ok(CatalogItemDetail {
			summary,
			prompt_examples,
			category_names,
			images: images.into_iter().map(image_view).collect(),
			updated_at,
		})
	}

	pub async fn submit_item(
		&self,
		requester: &Requester,
		req: SubmitItemRequest,
	) -> Result<SubmitItemResponse> {
		let code = req.code.trim().to_string();
		let title = req.title.trim().to_string();

		catalog::validate_code(&code).map_err(|message| Error::invalid("$.code", message))?;
		catalog::validate_title(&title).map_err(|message| Error::invalid("$.title", message))?;

		let categories = sref_domain::search::normalize_list(&req.categories);
		let tags = sref_domain::search::normalize_list(
			&req.tags.iter().map(|tag| tag.to_lowercase()).collect::<Vec<_>>(),
		);

		for (path, len, max) in [
			("$.categories", categories.len(), MAX_LABELS_PER_ITEM),
			("$.tags", tags.len(), MAX_LABELS_PER_ITEM),
			("$.images", req.images.len(), MAX_IMAGES_PER_ITEM),
		] {
			if len > max {
				return Err(Error::invalid(path, format!("at most {max} entries are allowed.")));
			}
		}
		for (idx, image) in req.images.iter().enumerate() {
			if image.url.trim().is_empty() {
				return Err(Error::invalid(format!("$.images[{idx}].url"), "url is required."));
			}
		}

		let caller = self.require_member(requester).await?;
		let now = OffsetDateTime::now_utc();
		let item = CatalogItem {
			item_id: Uuid::new_v4(),
			code: code.clone(),
			title,
			description: req.description.trim().to_string(),
			prompt_examples: req
				.prompt_examples
				.iter()
				.map(|example| example.trim().to_string())
				.filter(|example| !example.is_empty())
				.collect(),
			featured: false,
			premium: false,
			verified: false,
			views: 0,
			likes: 0,
			favorites: 0,
			downloads: 0,
			popularity_score: 0.0,
			status: CatalogStatus::Pending.as_str().to_string(),
			submitted_by: caller.user_id(),
			created_at: now,
			updated_at: now,
			deleted_at: None,
		};
		let mut tx = self.db.pool.begin().await?;
		let known = taxonomy::categories_by_slugs(&mut *tx, &categories).await?;

		if let Some(missing) =
			categories.iter().find(|slug| !known.iter().any(|category| &category.slug == *slug))
		{
			return Err(Error::invalid("$.categories", format!("unknown category '{missing}'.")));
		}

		queries::insert_item(&mut *tx, &item).await?;

		for category in &known {
			taxonomy::link_category(&mut *tx, item.item_id, category.category_id).await?;
		}
		for name in &tags {
			let tag_id = taxonomy::get_or_create_tag(&mut *tx, name).await?;

			taxonomy::link_tag(&mut *tx, item.item_id, tag_id).await?;
		}
		for (position, image) in req.images.into_iter().enumerate() {
			let image = CatalogImage {
				image_id: Uuid::new_v4(),
				item_id: item.item_id,
				position: i32::try_from(position).unwrap_or(i32::MAX),
				url: image.url.trim().to_string(),
				thumbnail_url: image.thumbnail_url,
				width: image.width,
				height: image.height,
				format: image.format,
			};

			queries::insert_image(&mut *tx, &image).await?;
		}

		tx.commit().await?;

		tracing::info!(item_id = %item.item_id, code = code.as_str(), "Catalog item submitted.");

		Ok(SubmitItemResponse { item_id: item.item_id, code, status: CatalogStatus::Pending })
	}

	pub async fn approve_item(
		&self,
		requester: &Requester,
		code: &str,
		req: ApproveRequest,
	) -> Result<LifecycleResponse> {
		self.require_admin(requester).await?;

		let mut tx = self.db.pool.begin().await?;
		let item = queries::get_item_by_code_for_update(&mut *tx, code)
			.await?
			.ok_or_else(|| Error::not_found(format!("No item with code {code}.")))?;
		let status = next_status(&item, LifecycleAction::Approve)?;
		let now = OffsetDateTime::now_utc();

		queries::set_item_status(&mut *tx, item.item_id, status.as_str(), now).await?;
		queries::set_item_flags(&mut *tx, item.item_id, req.featured, req.verified, req.premium)
			.await?;

		tx.commit().await?;

		tracing::info!(code, status = status.as_str(), "Catalog item approved.");

		Ok(LifecycleResponse { code: item.code, status })
	}

	pub async fn archive_item(&self, requester: &Requester, code: &str) -> Result<LifecycleResponse> {
		self.require_admin(requester).await?;
		self.transition(code, LifecycleAction::Archive, |_| true).await
	}

	/// Soft delete. The row stays so images and events keep their references.
	pub async fn delete_item(&self, requester: &Requester, code: &str) -> Result<LifecycleResponse> {
		let caller = if requester.operator { None } else { Some(self.require_member(requester).await?) };

		self.transition(code, LifecycleAction::Delete, |item| {
			caller.is_none_or(|caller| caller.can_manage(item.submitted_by))
		})
		.await
	}

	async fn transition(
		&self,
		code: &str,
		action: LifecycleAction,
		allowed: impl FnOnce(&CatalogItem) -> bool,
	) -> Result<LifecycleResponse> {
		let mut tx = self.db.pool.begin().await?;
		let item = queries::get_item_by_code_for_update(&mut *tx, code)
			.await?
			.filter(|item| item.status != CatalogStatus::Deleted.as_str())
			.ok_or_else(|| Error::not_found(format!("No item with code {code}.")))?;

		if !allowed(&item) {
			return Err(Error::Unauthorized {
				message: "Only the submitter or an admin may change this item.".to_string(),
			});
		}

		let status = next_status(&item, action)?;

		queries::set_item_status(&mut *tx, item.item_id, status.as_str(), OffsetDateTime::now_utc())
			.await?;

		tx.commit().await?;

		tracing::info!(code, action = action.as_str(), status = status.as_str(), "Catalog item updated.");

		Ok(LifecycleResponse { code: item.code, status })
	}

	/// ACTIVE item visible at the caller's access level.
	pub(crate) async fn visible_item(&self, caller: &Caller, code: &str) -> Result<CatalogItem> {
		let not_found = || Error::not_found(format!("No item with code {code}."));
		let item = queries::get_item_by_code(&self.db.pool, code).await?.ok_or_else(not_found)?;

		if item.status != CatalogStatus::Active.as_str() {
			return Err(not_found());
		}
		if item.premium && caller.access_level() == AccessLevel::Anonymous {
			return Err(not_found());
		}

		Ok(item)
	}
}

fn next_status(item: &CatalogItem, action: LifecycleAction) -> Result<CatalogStatus> {
	let current: CatalogStatus =
		item.status.parse().map_err(|message: String| Error::Storage { message })?;

	current.transition(action).ok_or_else(|| Error::Conflict {
		message: format!(
			"Cannot {} an item in status {}.",
			action.as_str(),
			current.as_str()
		),
	})
}

fn image_view(image: CatalogImage) -> ImageView {
	ImageView {
		image_id: image.image_id,
		position: image.position,
		url: image.url,
		thumbnail_url: image.thumbnail_url,
		width: image.width,
		height: image.height,
		format: image.format,
	}
}
