//! Filter state handed back to the caller for persistence between page loads.
//!
//! The state is advisory: it is recomputed from what a request asked for and is never read
//! back as filter input. Sentinels exist only in the encoded form.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::FilterSpec;

pub const TIME_KEY: &str = "time";
pub const BRAWLERS_KEY: &str = "brawlerSel";
/// Encoded epoch meaning "no bound requested".
pub const UNSET_EPOCH: i64 = -1;
/// Encoded brawler entry meaning "no brawler filter requested".
pub const ALL_BRAWLERS: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
	pub start_time: i64,
	pub stop_time: i64,
}
impl Default for TimeWindow {
	fn default() -> Self {
		Self { start_time: UNSET_EPOCH, stop_time: UNSET_EPOCH }
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientState {
	pub time: TimeWindow,
	#[serde(rename = "brawlerSel")]
	pub brawlers: Vec<String>,
}
impl ClientState {
	/// The window and brawler selection a request asked for, not what it matched.
	pub fn from_filter(spec: &FilterSpec) -> Self {
		Self {
			time: TimeWindow {
				start_time: spec.start.map(|epoch| epoch.millis()).unwrap_or(UNSET_EPOCH),
				stop_time: spec.end.map(|epoch| epoch.millis()).unwrap_or(UNSET_EPOCH),
			},
			brawlers: spec.brawlers.clone().unwrap_or_else(all_brawlers),
		}
	}

	pub fn encode_time(&self) -> String {
		json!({ "startTime": self.time.start_time, "stopTime": self.time.stop_time }).to_string()
	}

	pub fn encode_brawlers(&self) -> String {
		json!(self.brawlers).to_string()
	}

	/// Restores state from the two encoded values, substituting the default for any value that
	/// is missing or does not decode.
	pub fn decode(time: Option<&str>, brawlers: Option<&str>) -> Self {
		Self {
			time: time.and_then(decode_time).unwrap_or_default(),
			brawlers: brawlers.and_then(decode_brawlers).unwrap_or_else(all_brawlers),
		}
	}
}
impl Default for ClientState {
	fn default() -> Self {
		Self { time: TimeWindow::default(), brawlers: all_brawlers() }
	}
}

pub fn decode_time(raw: &str) -> Option<TimeWindow> {
	serde_json::from_str(raw).ok()
}

pub fn decode_brawlers(raw: &str) -> Option<Vec<String>> {
	serde_json::from_str(raw).ok()
}

fn all_brawlers() -> Vec<String> {
	vec![ALL_BRAWLERS.to_string()]
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::parse_params;

	#[test]
	fn requested_window_and_brawlers_round_trip() {
		let spec = parse_params([
			("start_time", "1000"),
			("end_time", "2000"),
			("brawler", r#"["A","B"]"#),
		]);
		let state = ClientState::from_filter(&spec);

		assert_eq!(state.time, TimeWindow { start_time: 1_000, stop_time: 2_000 });
		assert_eq!(state.brawlers, vec!["A".to_string(), "B".to_string()]);
		assert_eq!(state.encode_time(), r#"{"startTime":1000,"stopTime":2000}"#);
		assert_eq!(state.encode_brawlers(), r#"["A","B"]"#);
		assert_eq!(
			ClientState::decode(Some(&state.encode_time()), Some(&state.encode_brawlers())),
			state
		);
	}

	#[test]
	fn unset_fields_use_sentinels() {
		let state = ClientState::from_filter(&parse_params(Vec::<(&str, &str)>::new()));

		assert_eq!(state, ClientState::default());
		assert_eq!(state.encode_time(), r#"{"startTime":-1,"stopTime":-1}"#);
		assert_eq!(state.encode_brawlers(), r#"["*"]"#);
	}

	#[test]
	fn undecodable_values_fall_back_to_defaults() {
		let state = ClientState::decode(Some("{oops"), Some(r#"["SHELLY"]"#));

		assert_eq!(state.time, TimeWindow::default());
		assert_eq!(state.brawlers, vec!["SHELLY".to_string()]);
	}
}
