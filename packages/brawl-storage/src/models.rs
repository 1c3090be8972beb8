use serde_json::{Value, json};
use time::OffsetDateTime;
use uuid::Uuid;

use brawl_domain::epoch::format_rfc3339;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Battle {
	pub battle_id: Uuid,
	/// Raw `YYYYMMDDTHHMMSS`-style time as ingested.
	pub battle_time: String,
	pub epoch: Option<OffsetDateTime>,
	pub battle: Value,
	pub player: Option<Value>,
	pub extracted_player: Option<Value>,
	pub created_at: OffsetDateTime,
}
impl Battle {
	/// A freshly ingested record with neither derived field set.
	pub fn raw(battle_time: impl Into<String>, battle: Value, player: Option<Value>) -> Self {
		Self {
			battle_id: Uuid::new_v4(),
			battle_time: battle_time.into(),
			epoch: None,
			battle,
			player: player.filter(|value| !value.is_null()),
			extracted_player: None,
			created_at: OffsetDateTime::now_utc(),
		}
	}

	/// Document form returned to callers.
	pub fn to_document(&self) -> Value {
		json!({
			"_id": self.battle_id.to_string(),
			"battleTime": self.battle_time,
			"epoch": self.epoch.map(format_rfc3339),
			"battle": self.battle,
			"player": self.player,
			"extracted": { "player": self.extracted_player }
		})
	}
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingEpoch {
	pub battle_id: Uuid,
	pub battle_time: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingPlayer {
	pub battle_id: Uuid,
	pub battle: Value,
}
