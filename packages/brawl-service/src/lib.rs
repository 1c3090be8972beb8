pub mod battles;
pub mod stats;

mod error;

pub use battles::{BattlesResponse, Flags, Retrieval};
pub use error::{Error, Result};
pub use stats::{BrawlersResponse, Interval, StatsResponse};

use std::{sync::Arc, time::Duration};

use serde_json::Value;

use brawl_config::Config;
use brawl_domain::{FindQuery, pipeline::Pipeline};
use brawl_storage::{BattleStore, BoxFuture};

pub struct BattleService {
	pub cfg: Config,
	pub store: Arc<dyn BattleStore>,
}
impl BattleService {
	pub fn new(cfg: Config, store: Arc<dyn BattleStore>) -> Self {
		Self { cfg, store }
	}

	async fn find(&self, query: &FindQuery) -> Result<Vec<Value>> {
		self.bounded("find", self.store.find(query)).await
	}

	async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<Value>> {
		self.bounded("aggregate", self.store.aggregate(pipeline)).await
	}

	/// Runs one store call under `storage.query_timeout_ms`.
	async fn bounded<T>(
		&self,
		operation: &'static str,
		call: BoxFuture<'_, brawl_storage::Result<T>>,
	) -> Result<T> {
		let timeout_ms = self.cfg.storage.query_timeout_ms;

		match tokio::time::timeout(Duration::from_millis(timeout_ms), call).await {
			Ok(result) => Ok(result?),
			Err(_) => Err(Error::Timeout { operation, timeout_ms }),
		}
	}
}
