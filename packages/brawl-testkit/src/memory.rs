//! In-process store with the same filter, sort and grouping behavior as the Postgres store.

use std::{cmp::Ordering, sync::Mutex};

use serde_json::{Map, Value, json};
use time::{OffsetDateTime, macros::format_description};
use uuid::Uuid;

use brawl_domain::{
	Condition, Direction, FindQuery, RANKED_TYPE, SortKey, StoreFilter,
	pipeline::{Accumulator, GroupExpr, Pipeline},
};
use brawl_storage::{
	BackfillStore, BattleStore, BoxFuture, Result,
	models::{Battle, PendingEpoch, PendingPlayer},
};

#[derive(Default)]
pub struct MemoryStore {
	battles: Mutex<Vec<Battle>>,
	finds: Mutex<Vec<FindQuery>>,
}
impl MemoryStore {
	pub fn new<I>(battles: I) -> Self
	where
		I: IntoIterator<Item = Battle>,
	{
		Self { battles: Mutex::new(battles.into_iter().collect()), finds: Mutex::default() }
	}

	pub fn insert(&self, battle: Battle) {
		self.battles.lock().unwrap_or_else(|err| err.into_inner()).push(battle);
	}

	pub fn battles(&self) -> Vec<Battle> {
		self.battles.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn battle(&self, battle_id: Uuid) -> Option<Battle> {
		self.battles().into_iter().find(|battle| battle.battle_id == battle_id)
	}

	/// Every query passed to `find`, in call order.
	pub fn finds(&self) -> Vec<FindQuery> {
		self.finds.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn find_now(&self, query: &FindQuery) -> Vec<Value> {
		self.finds.lock().unwrap_or_else(|err| err.into_inner()).push(query.clone());

		let mut matched = self.matching(&query.filter);

		matched.sort_by(|left, right| compare_records(left, right, query.sort.keys()));

		if query.limit > 0 {
			matched.truncate(usize::try_from(query.limit).unwrap_or(usize::MAX));
		}

		matched.iter().map(|battle| query.projection.apply(battle.to_document())).collect()
	}

	pub fn aggregate_now(&self, pipeline: &Pipeline) -> Vec<Value> {
		let mut groups: Vec<(Vec<Value>, Vec<Reducer>)> = Vec::new();

		for battle in self.matching(&pipeline.filter) {
			let key = pipeline
				.group
				.iter()
				.map(|key| match key.expr {
					GroupExpr::EpochDay => battle.epoch.map(day).map_or(Value::Null, Value::String),
					GroupExpr::BattleNumber(field) => battle_number(&battle, field),
				})
				.collect::<Vec<_>>();
			let idx = match groups.iter().position(|(existing, _)| existing == &key) {
				Some(idx) => idx,
				None => {
					groups.push((key, vec![Reducer::default(); pipeline.accumulators.len()]));

					groups.len() - 1
				},
			};

			for (reducer, acc) in groups[idx].1.iter_mut().zip(&pipeline.accumulators) {
				reducer.count += 1;

				let field = match acc {
					Accumulator::Count { .. } => continue,
					Accumulator::Sum { field, .. } | Accumulator::Avg { field, .. } => field,
				};

				if let Some(value) = battle_number(&battle, field).as_f64() {
					reducer.values += 1;
					reducer.sum += value;
				}
			}
		}

		let mut docs = groups
			.into_iter()
			.map(|(key, reducers)| {
				let mut doc = Map::new();

				for (group_key, value) in pipeline.group.iter().zip(key) {
					doc.insert(group_key.name.to_string(), value);
				}
				for (acc, reducer) in pipeline.accumulators.iter().zip(reducers) {
					doc.insert(acc.name().to_string(), reducer.output(acc));
				}

				Value::Object(doc)
			})
			.collect::<Vec<_>>();

		docs.sort_by(|left, right| {
			pipeline
				.sort
				.iter()
				.map(|sort| {
					let ordering = compare_values(left.get(sort.name), right.get(sort.name));

					directed(ordering, sort.direction)
				})
				.find(|ordering| ordering.is_ne())
				.unwrap_or(Ordering::Equal)
		});

		docs
	}

	fn matching(&self, filter: &StoreFilter) -> Vec<Battle> {
		self.battles()
			.into_iter()
			.filter(|battle| filter.conditions().iter().all(|condition| matches(battle, condition)))
			.collect()
	}
}
impl BattleStore for MemoryStore {
	fn find<'a>(&'a self, query: &'a FindQuery) -> BoxFuture<'a, Result<Vec<Value>>> {
		Box::pin(async move { Ok(self.find_now(query)) })
	}

	fn aggregate<'a>(&'a self, pipeline: &'a Pipeline) -> BoxFuture<'a, Result<Vec<Value>>> {
		Box::pin(async move { Ok(self.aggregate_now(pipeline)) })
	}
}
impl BackfillStore for MemoryStore {
	fn pending_epochs<'a>(
		&'a self,
		after: Option<Uuid>,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<PendingEpoch>>> {
		let rows = self
			.pending(after, limit, |battle| battle.epoch.is_none())
			.into_iter()
			.map(|battle| PendingEpoch { battle_id: battle.battle_id, battle_time: battle.battle_time })
			.collect();

		Box::pin(async move { Ok(rows) })
	}

	fn set_epoch<'a>(
		&'a self,
		battle_id: Uuid,
		epoch: OffsetDateTime,
	) -> BoxFuture<'a, Result<bool>> {
		let changed = self.update(battle_id, |battle| {
			if battle.epoch.is_some() {
				return false;
			}

			battle.epoch = Some(epoch);

			true
		});

		Box::pin(async move { Ok(changed) })
	}

	fn pending_players<'a>(
		&'a self,
		after: Option<Uuid>,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<PendingPlayer>>> {
		let rows = self
			.pending(after, limit, |battle| battle.extracted_player.is_none())
			.into_iter()
			.map(|battle| PendingPlayer { battle_id: battle.battle_id, battle: battle.battle })
			.collect();

		Box::pin(async move { Ok(rows) })
	}

	fn set_extracted_player<'a>(
		&'a self,
		battle_id: Uuid,
		player: &'a Value,
	) -> BoxFuture<'a, Result<bool>> {
		let changed = self.update(battle_id, |battle| {
			if battle.extracted_player.is_some() {
				return false;
			}

			battle.extracted_player = Some(player.clone());

			true
		});

		Box::pin(async move { Ok(changed) })
	}
}
impl MemoryStore {
	fn pending<F>(&self, after: Option<Uuid>, limit: u32, is_pending: F) -> Vec<Battle>
	where
		F: Fn(&Battle) -> bool,
	{
		let mut rows = self
			.battles()
			.into_iter()
			.filter(|battle| is_pending(battle) && after.is_none_or(|id| battle.battle_id > id))
			.collect::<Vec<_>>();

		rows.sort_by_key(|battle| battle.battle_id);
		rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

		rows
	}

	fn update<F>(&self, battle_id: Uuid, apply: F) -> bool
	where
		F: FnOnce(&mut Battle) -> bool,
	{
		let mut battles = self.battles.lock().unwrap_or_else(|err| err.into_inner());

		battles.iter_mut().find(|battle| battle.battle_id == battle_id).is_some_and(apply)
	}
}

#[derive(Debug, Clone, Copy, Default)]
struct Reducer {
	count: u64,
	values: u64,
	sum: f64,
}
impl Reducer {
	fn output(self, acc: &Accumulator) -> Value {
		match acc {
			Accumulator::Count { .. } => json!(self.count),
			Accumulator::Sum { .. } => number(self.sum),
			Accumulator::Avg { .. } if self.values == 0 => Value::Null,
			Accumulator::Avg { .. } => json!(self.sum / self.values as f64),
		}
	}
}

fn matches(battle: &Battle, condition: &Condition) -> bool {
	match condition {
		Condition::EpochAtLeast(bound) => battle.epoch.is_some_and(|at| at >= bound.datetime()),
		Condition::EpochAtMost(bound) => battle.epoch.is_some_and(|at| at <= bound.datetime()),
		Condition::EpochPresent => battle.epoch.is_some(),
		Condition::Ranked(ranked) =>
			(battle.battle.get("type").and_then(Value::as_str) == Some(RANKED_TYPE)) == *ranked,
		Condition::PlayerPresent(present) =>
			battle.player.as_ref().is_some_and(|player| !player.is_null()) == *present,
		Condition::BrawlerIn(names) => battle
			.extracted_player
			.as_ref()
			.and_then(|player| player.pointer("/brawler/name"))
			.and_then(Value::as_str)
			.is_some_and(|name| names.iter().any(|candidate| candidate == name)),
		Condition::ModeIn(modes) => battle
			.battle
			.get("mode")
			.and_then(Value::as_str)
			.is_some_and(|mode| modes.iter().any(|candidate| candidate == mode)),
	}
}

fn compare_records(left: &Battle, right: &Battle, keys: &[SortKey]) -> Ordering {
	let (left_doc, right_doc) = (left.to_document(), right.to_document());

	keys.iter()
		.map(|key| {
			let ordering = if key.path == "epoch" {
				left.epoch.cmp(&right.epoch)
			} else {
				compare_values(lookup(&left_doc, &key.path), lookup(&right_doc, &key.path))
			};

			directed(ordering, key.direction)
		})
		.find(|ordering| ordering.is_ne())
		.unwrap_or(Ordering::Equal)
}

fn directed(ordering: Ordering, direction: Direction) -> Ordering {
	match direction {
		Direction::Ascending => ordering,
		Direction::Descending => ordering.reverse(),
	}
}

fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
	path.split('.').try_fold(doc, |value, segment| value.get(segment))
}

/// Missing and null sort lowest, then numbers, strings, objects, arrays, booleans.
fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
	fn rank(value: Option<&Value>) -> u8 {
		match value {
			None | Some(Value::Null) => 0,
			Some(Value::Number(_)) => 1,
			Some(Value::String(_)) => 2,
			Some(Value::Object(_)) => 3,
			Some(Value::Array(_)) => 4,
			Some(Value::Bool(_)) => 5,
		}
	}

	match (left, right) {
		(Some(Value::Number(l)), Some(Value::Number(r))) => l
			.as_f64()
			.zip(r.as_f64())
			.and_then(|(l, r)| l.partial_cmp(&r))
			.unwrap_or(Ordering::Equal),
		(Some(Value::String(l)), Some(Value::String(r))) => l.cmp(r),
		(Some(Value::Bool(l)), Some(Value::Bool(r))) => l.cmp(r),
		_ => rank(left).cmp(&rank(right)),
	}
}

fn battle_number(battle: &Battle, field: &str) -> Value {
	match battle.battle.get(field) {
		Some(value @ Value::Number(_)) => value.clone(),
		_ => Value::Null,
	}
}

fn day(at: OffsetDateTime) -> String {
	at.to_offset(time::UtcOffset::UTC)
		.format(format_description!("[year]-[month]-[day]"))
		.unwrap_or_default()
}

fn number(value: f64) -> Value {
	if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
		json!(value as i64)
	} else {
		json!(value)
	}
}
