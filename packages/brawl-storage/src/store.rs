//! Object-safe store seams. Services hold `Arc<dyn BattleStore>` so tests can swap the
//! Postgres store for an in-memory one.

use std::{future::Future, pin::Pin};

use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use brawl_domain::{FindQuery, pipeline::Pipeline};

use crate::{
	Result,
	db::Db,
	models::{PendingEpoch, PendingPlayer},
	queries,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Read side used by the query service.
pub trait BattleStore
where
	Self: Send + Sync,
{
	/// Returns the matching records as projected documents, in sort order.
	fn find<'a>(&'a self, query: &'a FindQuery) -> BoxFuture<'a, Result<Vec<Value>>>;

	/// Returns one flat document per group.
	fn aggregate<'a>(&'a self, pipeline: &'a Pipeline) -> BoxFuture<'a, Result<Vec<Value>>>;
}

/// Write side used by the normalizer. Listing is keyset-paged by `battle_id`.
pub trait BackfillStore
where
	Self: Send + Sync,
{
	fn pending_epochs<'a>(
		&'a self,
		after: Option<Uuid>,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<PendingEpoch>>>;

	/// Returns `false` when the record is gone or already has an epoch.
	fn set_epoch<'a>(&'a self, battle_id: Uuid, epoch: OffsetDateTime)
	-> BoxFuture<'a, Result<bool>>;

	fn pending_players<'a>(
		&'a self,
		after: Option<Uuid>,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<PendingPlayer>>>;

	/// Returns `false` when the record is gone or already has an extracted player.
	fn set_extracted_player<'a>(
		&'a self,
		battle_id: Uuid,
		player: &'a Value,
	) -> BoxFuture<'a, Result<bool>>;
}

impl BattleStore for Db {
	fn find<'a>(&'a self, query: &'a FindQuery) -> BoxFuture<'a, Result<Vec<Value>>> {
		Box::pin(queries::find_battles(&self.pool, query))
	}

	fn aggregate<'a>(&'a self, pipeline: &'a Pipeline) -> BoxFuture<'a, Result<Vec<Value>>> {
		Box::pin(queries::aggregate_battles(&self.pool, pipeline))
	}
}

impl BackfillStore for Db {
	fn pending_epochs<'a>(
		&'a self,
		after: Option<Uuid>,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<PendingEpoch>>> {
		Box::pin(queries::list_pending_epochs(&self.pool, after, limit))
	}

	fn set_epoch<'a>(
		&'a self,
		battle_id: Uuid,
		epoch: OffsetDateTime,
	) -> BoxFuture<'a, Result<bool>> {
		Box::pin(queries::set_epoch(&self.pool, battle_id, epoch))
	}

	fn pending_players<'a>(
		&'a self,
		after: Option<Uuid>,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<PendingPlayer>>> {
		Box::pin(queries::list_pending_players(&self.pool, after, limit))
	}

	fn set_extracted_player<'a>(
		&'a self,
		battle_id: Uuid,
		player: &'a Value,
	) -> BoxFuture<'a, Result<bool>> {
		Box::pin(queries::set_extracted_player(&self.pool, battle_id, player))
	}
}
