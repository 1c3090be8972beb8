use serde_json::{Map, Value};

/// Finds the tracked player's entry in a raw `battle` payload.
///
/// Team modes carry `teams` (a list of teams, each a list of players); other modes carry a
/// flat `players` list, which takes precedence when both are present. When several entries
/// match, the last one wins. No match yields an empty object, which is a valid outcome.
///
/// Tags are compared ASCII case-insensitively, so `#2ppqlr8` matches `#2PPQLR8`.
pub fn extract_tracked_player(battle: &Value, tag: &str) -> Value {
	let players: Vec<&Value> = match battle.get("players").and_then(Value::as_array) {
		Some(players) => players.iter().collect(),
		None => battle
			.get("teams")
			.and_then(Value::as_array)
			.map(|teams| {
				teams.iter().filter_map(Value::as_array).flat_map(|team| team.iter()).collect()
			})
			.unwrap_or_default(),
	};

	players
		.into_iter()
		.rev()
		.find(|player| {
			player.get("tag").and_then(Value::as_str).is_some_and(|t| t.eq_ignore_ascii_case(tag))
		})
		.cloned()
		.unwrap_or_else(|| Value::Object(Map::new()))
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn finds_player_across_teams() {
		let battle = json!({
			"mode": "gemGrab",
			"teams": [
				[{"tag": "#AAA", "name": "a"}, {"tag": "#2PP", "name": "me", "brawler": {"name": "SHELLY"}}],
				[{"tag": "#BBB", "name": "b"}]
			]
		});

		assert_eq!(
			extract_tracked_player(&battle, "#2PP"),
			json!({"tag": "#2PP", "name": "me", "brawler": {"name": "SHELLY"}})
		);
	}

	#[test]
	fn flat_players_take_precedence() {
		let battle = json!({
			"mode": "soloShowdown",
			"teams": [[{"tag": "#2PP", "name": "from-teams"}]],
			"players": [{"tag": "#2pp", "name": "from-players"}]
		});

		assert_eq!(extract_tracked_player(&battle, "#2PP")["name"], "from-players");
	}

	#[test]
	fn tag_comparison_ignores_ascii_case() {
		let battle = json!({"mode": "brawlBall", "players": [{"tag": "#2ppqlr8", "name": "me"}]});

		assert_eq!(extract_tracked_player(&battle, "#2PPQLR8")["name"], "me");
		assert_eq!(extract_tracked_player(&battle, "#2PPQLR9"), json!({}));
	}

	#[test]
	fn missing_player_yields_empty_object() {
		let battle = json!({"mode": "soloShowdown", "players": [{"tag": "#X"}]});

		assert_eq!(extract_tracked_player(&battle, "#2PP"), json!({}));
		assert_eq!(extract_tracked_player(&json!({}), "#2PP"), json!({}));
	}
}
