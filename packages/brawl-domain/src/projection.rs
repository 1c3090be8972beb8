use serde_json::{Map, Value};

use crate::query::is_field_path;

const ID_FIELD: &str = "_id";

/// Field selection applied to each returned document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Projection {
	#[default]
	All,
	/// Keep only `paths`, plus `_id` when `include_id` is set.
	Include { paths: Vec<String>, include_id: bool },
	/// Drop `paths`, keep everything else.
	Exclude { paths: Vec<String> },
}
impl Projection {
	pub fn include<I, S>(paths: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::Include { paths: paths.into_iter().map(Into::into).collect(), include_id: true }
	}

	/// Parses an encoded projection object such as `{"battle.mode": 1, "_id": 0}`.
	///
	/// Mixing inclusions and exclusions (other than `_id`) is rejected.
	pub fn parse(raw: &str) -> Option<Self> {
		let Value::Object(entries) = serde_json::from_str::<Value>(raw).ok()? else {
			return None;
		};
		let mut id_flag = None;
		let mut included = Vec::new();
		let mut excluded = Vec::new();

		for (path, value) in entries {
			if !is_field_path(&path) {
				return None;
			}

			let keep = match value {
				Value::Bool(flag) => flag,
				Value::Number(number) => number.as_f64()? != 0.0,
				_ => return None,
			};

			if path == ID_FIELD {
				id_flag = Some(keep);
			} else if keep {
				included.push(path);
			} else {
				excluded.push(path);
			}
		}

		match (included.is_empty(), excluded.is_empty()) {
			(false, false) => None,
			(false, true) => Some(Self::Include { paths: included, include_id: id_flag.unwrap_or(true) }),
			(true, false) => {
				if id_flag == Some(false) {
					excluded.push(ID_FIELD.to_string());
				}

				Some(Self::Exclude { paths: excluded })
			},
			(true, true) => match id_flag {
				Some(true) => Some(Self::Include { paths: Vec::new(), include_id: true }),
				Some(false) => Some(Self::Exclude { paths: vec![ID_FIELD.to_string()] }),
				None => Some(Self::All),
			},
		}
	}

	pub fn apply(&self, doc: Value) -> Value {
		match self {
			Self::All => doc,
			Self::Include { paths, include_id } => {
				let mut out = Value::Object(Map::new());

				if *include_id && let Some(id) = doc.get(ID_FIELD) {
					merge(&mut out, object_with(ID_FIELD, id.clone()));
				}

				for path in paths {
					let segments = path.split('.').collect::<Vec<_>>();

					if let Some(piece) = pick(&doc, &segments) {
						merge(&mut out, piece);
					}
				}

				out
			},
			Self::Exclude { paths } => {
				let mut doc = doc;

				for path in paths {
					let segments = path.split('.').collect::<Vec<_>>();

					drop_path(&mut doc, &segments);
				}

				doc
			},
		}
	}
}

fn object_with(key: &str, value: Value) -> Value {
	let mut map = Map::new();

	map.insert(key.to_string(), value);

	Value::Object(map)
}

/// Extracts `segments` from `src`, preserving the surrounding shape. Arrays are traversed
/// element-wise and keep only the elements that contain the path.
fn pick(src: &Value, segments: &[&str]) -> Option<Value> {
	let Some((head, rest)) = segments.split_first() else {
		return Some(src.clone());
	};

	match src {
		Value::Object(map) => {
			let inner = pick(map.get(*head)?, rest)?;

			Some(object_with(head, inner))
		},
		Value::Array(items) =>
			Some(Value::Array(items.iter().filter_map(|item| pick(item, segments)).collect())),
		_ => None,
	}
}

fn merge(target: &mut Value, piece: Value) {
	match (target, piece) {
		(Value::Object(existing), Value::Object(incoming)) =>
			for (key, value) in incoming {
				match existing.get_mut(&key) {
					Some(slot) => merge(slot, value),
					None => {
						existing.insert(key, value);
					},
				}
			},
		(Value::Array(existing), Value::Array(incoming)) =>
			for (slot, value) in existing.iter_mut().zip(incoming) {
				merge(slot, value);
			},
		(slot, value) => *slot = value,
	}
}

fn drop_path(doc: &mut Value, segments: &[&str]) {
	let Some((head, rest)) = segments.split_first() else {
		return;
	};

	match doc {
		Value::Object(map) =>
			if rest.is_empty() {
				map.remove(*head);
			} else if let Some(inner) = map.get_mut(*head) {
				drop_path(inner, rest);
			},
		Value::Array(items) =>
			for item in items {
				drop_path(item, segments);
			},
		_ => {},
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn record() -> Value {
		json!({
			"_id": "b1",
			"epoch": "2020-11-04T19:52:54Z",
			"battle": {
				"mode": "soloShowdown",
				"rank": 3,
				"players": [{"tag": "#A", "name": "a"}, {"tag": "#B", "name": "b"}]
			},
			"player": null
		})
	}

	#[test]
	fn inclusion_keeps_id_and_nested_fields() {
		let projection =
			Projection::parse(r#"{"battle.mode": 1, "epoch": true}"#).expect("Projection must parse.");

		assert_eq!(
			projection.apply(record()),
			json!({
				"_id": "b1",
				"epoch": "2020-11-04T19:52:54Z",
				"battle": {"mode": "soloShowdown"}
			})
		);
	}

	#[test]
	fn inclusion_traverses_arrays() {
		let projection = Projection::parse(r#"{"battle.players.tag": 1, "_id": 0}"#)
			.expect("Projection must parse.");

		assert_eq!(
			projection.apply(record()),
			json!({"battle": {"players": [{"tag": "#A"}, {"tag": "#B"}]}})
		);
	}

	#[test]
	fn exclusion_removes_paths() {
		let projection =
			Projection::parse(r#"{"battle.players": 0, "_id": 0}"#).expect("Projection must parse.");

		assert_eq!(
			projection.apply(record()),
			json!({
				"epoch": "2020-11-04T19:52:54Z",
				"battle": {"mode": "soloShowdown", "rank": 3},
				"player": null
			})
		);
	}

	#[test]
	fn mixed_or_malformed_projection_is_rejected() {
		assert!(Projection::parse(r#"{"battle": 1, "epoch": 0}"#).is_none());
		assert!(Projection::parse(r#"{"battle": "yes"}"#).is_none());
		assert!(Projection::parse("not json").is_none());
		assert_eq!(Projection::parse("{}"), Some(Projection::All));
	}
}
