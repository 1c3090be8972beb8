use serde_json::json;

use brawl_domain::{
	Condition, Epoch, Projection, SortOrder, client_state::ClientState, compose,
	fallback::{self, Provenance},
	parse_params,
};

#[test]
fn empty_request_returns_everything_newest_first() {
	let query = compose(&parse_params(Vec::<(String, String)>::new()));

	assert!(query.filter.is_empty());
	assert_eq!(query.filter.to_document(), json!({}));
	assert_eq!(query.sort, SortOrder::epoch_descending());
	assert_eq!(query.projection, Projection::All);
	assert_eq!(query.limit, 0);
}

#[test]
fn composed_filter_has_one_condition_per_supplied_parameter() {
	let query = compose(&parse_params([
		("start_time", "1604519574000"),
		("need_player", "1"),
		("brawler", r#"["SHELLY"]"#),
		("unknown", "ignored"),
	]));
	let start = Epoch::from_millis(1_604_519_574_000).expect("Epoch must be in range.");

	assert_eq!(
		query.filter.conditions(),
		&[
			Condition::EpochAtLeast(start),
			Condition::PlayerPresent(true),
			Condition::BrawlerIn(vec!["SHELLY".to_string()]),
		]
	);
	assert_eq!(
		query.filter.to_document(),
		json!({
			"epoch": {"$gte": "2020-11-04T19:52:54Z"},
			"player": {"$ne": null},
			"extracted.player.brawler.name": {"$in": ["SHELLY"]}
		})
	);
}

#[test]
fn malformed_start_keeps_valid_end() {
	let spec = parse_params([("start_time", "abc"), ("end_time", "2000")]);
	let query = compose(&spec);
	let end = Epoch::from_millis(2_000).expect("Epoch must be in range.");

	assert_eq!(query.filter.conditions(), &[Condition::EpochAtMost(end)]);
	assert!(fallback::plan(&spec, Provenance::BackwardRelaxed).is_none());
}

#[test]
fn client_state_reflects_request_not_match() {
	let with_params = ClientState::from_filter(&parse_params([
		("start_time", "1000"),
		("end_time", "2000"),
		("brawler", r#"["A","B"]"#),
	]));
	let without_params = ClientState::from_filter(&parse_params(Vec::<(&str, &str)>::new()));

	assert_eq!(with_params.encode_time(), r#"{"startTime":1000,"stopTime":2000}"#);
	assert_eq!(with_params.encode_brawlers(), r#"["A","B"]"#);
	assert_eq!(without_params.encode_time(), r#"{"startTime":-1,"stopTime":-1}"#);
	assert_eq!(without_params.encode_brawlers(), r#"["*"]"#);
}
