use std::sync::Arc;

use sref_service::SrefService;
use sref_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<SrefService>,
}
impl AppState {
	pub async fn new(config: sref_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		Ok(Self::from_service(SrefService::new(config, db)))
	}

	pub fn from_service(service: SrefService) -> Self {
		Self { service: Arc::new(service) }
	}
}
