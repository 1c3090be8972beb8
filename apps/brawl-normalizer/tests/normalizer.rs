use serde_json::json;

use brawl_normalizer::normalizer::{Report, run_backfill};
use brawl_storage::models::Battle;
use brawl_testkit::{MemoryStore, fixtures};

fn raw_solo(battle_time: &str, tag: &str) -> Battle {
	Battle::raw(
		battle_time,
		json!({
			"mode": "soloShowdown",
			"rank": 2,
			"players": [fixtures::player("#OTHER", "BULL"), fixtures::player(tag, "SHELLY")]
		}),
		None,
	)
}

#[tokio::test]
async fn backfills_epoch_and_tracked_player() {
	let solo = raw_solo("20201104T195254.000Z", "#2ppqlr8");
	let team = Battle::raw(
		"20201105T010203.000Z",
		json!({
			"mode": "gemGrab",
			"teams": [[fixtures::player("#AAA", "NITA")], [fixtures::player(fixtures::PLAYER_TAG, "COLT")]]
		}),
		None,
	);
	let stranger = raw_solo("20201106T000000.000Z", "#SOMEONE");
	let store = MemoryStore::new([solo.clone(), team.clone(), stranger.clone()]);
	let report =
		run_backfill(&store, fixtures::PLAYER_TAG, 2).await.expect("Backfill must succeed.");

	assert_eq!(
		report,
		Report { epochs_updated: 3, epochs_unparseable: 0, players_updated: 3, skipped: 0 }
	);

	let solo = store.battle(solo.battle_id).expect("Record must exist.");

	assert_eq!(solo.epoch, Some(fixtures::epoch(1_604_519_574_000).datetime()));
	assert_eq!(
		solo.extracted_player.expect("Player must be extracted.")["brawler"]["name"],
		"SHELLY"
	);

	let team = store.battle(team.battle_id).expect("Record must exist.");

	assert_eq!(
		team.extracted_player.expect("Player must be extracted.")["brawler"]["name"],
		"COLT"
	);

	let stranger = store.battle(stranger.battle_id).expect("Record must exist.");

	assert_eq!(stranger.extracted_player, Some(json!({})));
}

#[tokio::test]
async fn second_run_is_a_no_op() {
	let store = MemoryStore::new([
		raw_solo("20201104T195254.000Z", fixtures::PLAYER_TAG),
		fixtures::solo(1_604_519_574_000, 1, 5),
	]);

	run_backfill(&store, fixtures::PLAYER_TAG, 10).await.expect("Backfill must succeed.");

	let before = store.battles();
	let report =
		run_backfill(&store, fixtures::PLAYER_TAG, 10).await.expect("Backfill must succeed.");

	assert_eq!(report, Report::default());
	assert_eq!(
		store.battles().iter().map(|battle| battle.extracted_player.clone()).collect::<Vec<_>>(),
		before.iter().map(|battle| battle.extracted_player.clone()).collect::<Vec<_>>()
	);
}

#[tokio::test]
async fn unparseable_battle_time_stays_pending() {
	let broken = raw_solo("2020-11-04 19:52", fixtures::PLAYER_TAG);
	let good = raw_solo("20201104T195254.000Z", fixtures::PLAYER_TAG);
	let store = MemoryStore::new([broken.clone(), good.clone()]);
	let report =
		run_backfill(&store, fixtures::PLAYER_TAG, 1).await.expect("Backfill must succeed.");

	assert_eq!(report.epochs_updated, 1);
	assert_eq!(report.epochs_unparseable, 1);
	assert_eq!(report.players_updated, 2);
	assert_eq!(store.battle(broken.battle_id).and_then(|battle| battle.epoch), None);
	assert!(store.battle(good.battle_id).and_then(|battle| battle.epoch).is_some());

	let again =
		run_backfill(&store, fixtures::PLAYER_TAG, 1).await.expect("Backfill must succeed.");

	assert_eq!(again.epochs_unparseable, 1);
	assert_eq!(again.epochs_updated, 0);
}
