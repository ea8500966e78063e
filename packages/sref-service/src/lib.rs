pub mod access;
pub mod browse;
pub mod catalog;
pub mod interactions;
pub mod maintenance;
pub mod search;

mod error;

pub use browse::{CategorySummary, TagSummary};
pub use catalog::{
	ApproveRequest, CatalogItemDetail, ImageInput, ImageView, LifecycleResponse,
	SubmitItemRequest, SubmitItemResponse,
};
pub use error::{Error, Result};
pub use interactions::{RecordInteractionRequest, RecordInteractionResponse};
pub use maintenance::RecomputeReport;
pub use search::{
	CatalogItemSummary, DateRangeFilter, RangeBounds, SearchFilters, SearchRequest,
	SearchResponse, TrendSummary, TrendingResponse,
};

use uuid::Uuid;

use sref_config::Config;
use sref_storage::db::Db;

/// Who is calling, as reported by the transport. Nothing here is trusted until
/// [`SrefService::resolve_caller`] has loaded the user row.
#[derive(Clone, Debug, Default)]
pub struct Requester {
	pub user_id: Option<Uuid>,
	pub ip: Option<String>,
	pub user_agent: Option<String>,
	/// Set by the admin listener after checking the admin bearer token.
	pub operator: bool,
}
impl Requester {
	pub fn anonymous() -> Self {
		Self::default()
	}

	pub fn user(user_id: Uuid) -> Self {
		Self { user_id: Some(user_id), ..Self::default() }
	}
}

pub struct SrefService {
	pub cfg: Config,
	pub db: Db,
}
impl SrefService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db }
	}
}
