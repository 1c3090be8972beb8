use std::sync::Arc;

use brawl_service::BattleService;
use brawl_storage::{BattleStore, db::Db};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<BattleService>,
}
impl AppState {
	/// Connects to Postgres and bootstraps the schema. Any failure aborts startup.
	pub async fn new(config: brawl_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		Ok(Self::with_store(config, Arc::new(db)))
	}

	pub fn with_store(config: brawl_config::Config, store: Arc<dyn BattleStore>) -> Self {
		Self { service: Arc::new(BattleService::new(config, store)) }
	}

	pub fn cookie_domain(&self) -> Option<&str> {
		self.service.cfg.service.cookie_domain.as_deref()
	}
}
