use std::fmt;

use serde::{
	Deserialize, Deserializer,
	de::{MapAccess, Visitor},
};
use serde_json::{Map, Value, json};

use crate::{Epoch, FilterSpec, Projection, RANKED_TYPE};

/// One constraint of a store filter. Conditions combine by conjunction.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
	EpochAtLeast(Epoch),
	EpochAtMost(Epoch),
	EpochPresent,
	/// `true` requires `battle.type` to be ranked, `false` excludes ranked matches.
	Ranked(bool),
	PlayerPresent(bool),
	BrawlerIn(Vec<String>),
	ModeIn(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreFilter {
	conditions: Vec<Condition>,
}
impl StoreFilter {
	pub fn new(conditions: Vec<Condition>) -> Self {
		Self { conditions }
	}

	pub fn conditions(&self) -> &[Condition] {
		&self.conditions
	}

	pub fn is_empty(&self) -> bool {
		self.conditions.is_empty()
	}

	pub fn lower_bound(&self) -> Option<Epoch> {
		self.conditions.iter().find_map(|condition| match condition {
			Condition::EpochAtLeast(epoch) => Some(*epoch),
			_ => None,
		})
	}

	pub fn upper_bound(&self) -> Option<Epoch> {
		self.conditions.iter().find_map(|condition| match condition {
			Condition::EpochAtMost(epoch) => Some(*epoch),
			_ => None,
		})
	}

	pub fn retain<F>(&self, keep: F) -> Self
	where
		F: Fn(&Condition) -> bool,
	{
		Self { conditions: self.conditions.iter().filter(|c| keep(c)).cloned().collect() }
	}

	pub fn with(mut self, condition: Condition) -> Self {
		self.conditions.push(condition);

		self
	}

	/// Renders the filter as a document-store query object, e.g.
	/// `{"epoch": {"$gte": "...", "$lte": "..."}, "battle.mode": {"$in": [...]}}`.
	pub fn to_document(&self) -> Value {
		let mut doc = Map::new();

		for condition in &self.conditions {
			let (field, op, value) = match condition {
				Condition::EpochAtLeast(epoch) => ("epoch", "$gte", json!(epoch.to_rfc3339())),
				Condition::EpochAtMost(epoch) => ("epoch", "$lte", json!(epoch.to_rfc3339())),
				Condition::EpochPresent => ("epoch", "$ne", Value::Null),
				Condition::Ranked(true) => ("battle.type", "$eq", json!(RANKED_TYPE)),
				Condition::Ranked(false) => ("battle.type", "$ne", json!(RANKED_TYPE)),
				Condition::PlayerPresent(true) => ("player", "$ne", Value::Null),
				Condition::PlayerPresent(false) => ("player", "$eq", Value::Null),
				Condition::BrawlerIn(names) => ("extracted.player.brawler.name", "$in", json!(names)),
				Condition::ModeIn(modes) => ("battle.mode", "$in", json!(modes)),
			};

			if let Value::Object(ops) =
				doc.entry(field).or_insert_with(|| Value::Object(Map::new()))
			{
				ops.insert(op.to_string(), value);
			}
		}

		Value::Object(doc)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
	Ascending,
	Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
	pub path: String,
	pub direction: Direction,
}
impl SortKey {
	pub fn new(path: impl Into<String>, direction: Direction) -> Self {
		Self { path: path.into(), direction }
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder(Vec<SortKey>);
impl SortOrder {
	pub fn epoch_descending() -> Self {
		Self(vec![SortKey::new("epoch", Direction::Descending)])
	}

	pub fn epoch_ascending() -> Self {
		Self(vec![SortKey::new("epoch", Direction::Ascending)])
	}

	pub fn keys(&self) -> &[SortKey] {
		&self.0
	}

	/// Parses an encoded sort object such as `{"battle.rank": 1, "epoch": -1}`.
	///
	/// Key order is significant. Directions accept `1`/`-1` and the strings `asc`/`desc`.
	pub fn parse(raw: &str) -> Option<Self> {
		let OrderedEntries(entries) = serde_json::from_str(raw).ok()?;

		if entries.is_empty() {
			return None;
		}

		let mut keys = Vec::with_capacity(entries.len());

		for (path, value) in entries {
			if !is_field_path(&path) {
				return None;
			}

			keys.push(SortKey { path, direction: parse_direction(&value)? });
		}

		Some(Self(keys))
	}

	pub fn to_document(&self) -> Value {
		let mut doc = Map::new();

		for key in &self.0 {
			let direction = match key.direction {
				Direction::Ascending => 1,
				Direction::Descending => -1,
			};

			doc.insert(key.path.clone(), json!(direction));
		}

		Value::Object(doc)
	}
}
impl Default for SortOrder {
	fn default() -> Self {
		Self::epoch_descending()
	}
}

/// A fully composed store query.
#[derive(Debug, Clone, PartialEq)]
pub struct FindQuery {
	pub filter: StoreFilter,
	pub sort: SortOrder,
	pub projection: Projection,
	/// Maximum number of records, `0` means unbounded.
	pub limit: u64,
}
impl FindQuery {
	pub fn new(filter: StoreFilter) -> Self {
		Self { filter, sort: SortOrder::default(), projection: Projection::All, limit: 0 }
	}

	pub fn sort(mut self, sort: SortOrder) -> Self {
		self.sort = sort;

		self
	}

	pub fn projection(mut self, projection: Projection) -> Self {
		self.projection = projection;

		self
	}

	pub fn limit(mut self, limit: u64) -> Self {
		self.limit = limit;

		self
	}
}

/// Maps a filter specification onto a store query. Unset fields contribute no condition.
pub fn compose(spec: &FilterSpec) -> FindQuery {
	let mut conditions = Vec::new();

	if let Some(start) = spec.start {
		conditions.push(Condition::EpochAtLeast(start));
	}
	if let Some(end) = spec.end {
		conditions.push(Condition::EpochAtMost(end));
	}
	if let Some(ranked) = spec.ranked {
		conditions.push(Condition::Ranked(ranked));
	}
	if let Some(need_player) = spec.need_player {
		conditions.push(Condition::PlayerPresent(need_player));
	}
	if let Some(brawlers) = &spec.brawlers {
		conditions.push(Condition::BrawlerIn(brawlers.clone()));
	}
	if let Some(modes) = &spec.modes {
		conditions.push(Condition::ModeIn(modes.clone()));
	}

	FindQuery::new(StoreFilter::new(conditions))
		.sort(spec.sort.clone())
		.projection(spec.projection.clone())
		.limit(spec.limit)
}

/// Dotted document path made of `[A-Za-z0-9_]` segments.
pub fn is_field_path(path: &str) -> bool {
	!path.is_empty()
		&& path.split('.').all(|segment| {
			!segment.is_empty()
				&& segment.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
		})
}

fn parse_direction(value: &Value) -> Option<Direction> {
	match value {
		Value::Number(number) => match number.as_f64() {
			Some(n) if n == 1.0 => Some(Direction::Ascending),
			Some(n) if n == -1.0 => Some(Direction::Descending),
			_ => None,
		},
		Value::String(text) => match text.to_ascii_lowercase().as_str() {
			"asc" | "ascending" => Some(Direction::Ascending),
			"desc" | "descending" => Some(Direction::Descending),
			_ => None,
		},
		_ => None,
	}
}

/// JSON object entries in document order.
struct OrderedEntries(Vec<(String, Value)>);
impl<'de> Deserialize<'de> for OrderedEntries {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		struct EntriesVisitor;
		impl<'de> Visitor<'de> for EntriesVisitor {
			type Value = OrderedEntries;

			fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str("a JSON object")
			}

			fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
			where
				A: MapAccess<'de>,
			{
				let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));

				while let Some((key, value)) = map.next_entry::<String, Value>()? {
					entries.retain(|(existing, _): &(String, Value)| existing != &key);
					entries.push((key, value));
				}

				Ok(OrderedEntries(entries))
			}
		}

		deserializer.deserialize_map(EntriesVisitor)
	}
}
