//! Record builders shared by the test suites.

use serde_json::{Value, json};
use time::{OffsetDateTime, macros::format_description};

use brawl_config::{Config, Normalizer, Player, Postgres, Service, Storage};
use brawl_domain::{Epoch, RANKED_TYPE, SOLO_SHOWDOWN_MODE};
use brawl_storage::models::Battle;

pub const PLAYER_TAG: &str = "#2PPQLR8";

/// Configuration pointing at `dsn` with small pools and a short store timeout.
pub fn config(dsn: impl Into<String>) -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
			cookie_domain: None,
		},
		storage: Storage {
			postgres: Postgres { dsn: dsn.into(), pool_max_conns: 1 },
			query_timeout_ms: 1_000,
		},
		player: Player { tag: PLAYER_TAG.to_string() },
		normalizer: Normalizer { batch_size: 2 },
	}
}

/// Raw `battleTime` text for an instant, e.g. `20201104T195254.000Z`.
pub fn battle_time(at: OffsetDateTime) -> String {
	at.format(format_description!("[year][month][day]T[hour][minute][second].000Z"))
		.unwrap_or_default()
}

pub fn epoch(millis: i64) -> Epoch {
	Epoch::from_millis(millis).unwrap_or_else(|| panic!("Epoch {millis} is out of range."))
}

/// A normalized record: `epoch` set from `millis`, `battleTime` consistent with it.
pub fn record(millis: i64, battle: Value) -> Battle {
	let at = epoch(millis).datetime();
	let mut record = Battle::raw(battle_time(at), battle, None);

	record.epoch = Some(at);

	record
}

/// A ranked solo-elimination match finishing at `rank`.
pub fn solo(millis: i64, rank: i64, trophy_change: i64) -> Battle {
	record(
		millis,
		json!({
			"mode": SOLO_SHOWDOWN_MODE,
			"type": RANKED_TYPE,
			"rank": rank,
			"trophyChange": trophy_change,
			"players": [player(PLAYER_TAG, "SHELLY")]
		}),
	)
}

/// A ranked three-versus-three match.
pub fn team(millis: i64, mode: &str, trophy_change: i64) -> Battle {
	record(
		millis,
		json!({
			"mode": mode,
			"type": RANKED_TYPE,
			"result": "victory",
			"trophyChange": trophy_change,
			"teams": [
				[player(PLAYER_TAG, "COLT"), player("#AAA", "BULL")],
				[player("#BBB", "NITA"), player("#CCC", "PIPER")]
			]
		}),
	)
}

pub fn player(tag: &str, brawler: &str) -> Value {
	json!({ "tag": tag, "name": format!("player {tag}"), "brawler": { "name": brawler, "power": 9 } })
}

/// Sets the extracted player the way the normalizer would.
pub fn with_extracted(mut battle: Battle, brawler: &str) -> Battle {
	battle.extracted_player = Some(player(PLAYER_TAG, brawler));

	battle
}

/// Attaches a profile snapshot as the `player` payload.
pub fn with_profile(mut battle: Battle, brawlers: Value) -> Battle {
	battle.player = Some(json!({ "tag": PLAYER_TAG, "brawlers": brawlers }));

	battle
}
