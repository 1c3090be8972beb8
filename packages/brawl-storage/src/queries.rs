use std::fmt::Display;

use serde_json::Value;
use sqlx::{PgExecutor, Postgres, QueryBuilder, query_builder::Separated};
use time::OffsetDateTime;
use uuid::Uuid;

use brawl_domain::{
	Condition, Direction, FindQuery, RANKED_TYPE, SortKey,
	pipeline::{Accumulator, GroupExpr, Pipeline},
};

use crate::{
	Error, Result,
	models::{Battle, PendingEpoch, PendingPlayer},
};

const BATTLE_COLUMNS: &str =
	"battle_id, battle_time, epoch, battle, player, extracted_player, created_at";

enum SortColumn {
	Plain(&'static str),
	Json { column: &'static str, path: Vec<String> },
}

pub async fn insert_battle<'e, E>(executor: E, battle: &Battle) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO battles (
\tbattle_id,
\tbattle_time,
\tepoch,
\tbattle,
\tplayer,
\textracted_player,
\tcreated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7)",
	)
	.bind(battle.battle_id)
	.bind(battle.battle_time.as_str())
	.bind(battle.epoch)
	.bind(&battle.battle)
	.bind(battle.player.as_ref().filter(|value| !value.is_null()))
	.bind(battle.extracted_player.as_ref())
	.bind(battle.created_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn find_battles<'e, E>(executor: E, query: &FindQuery) -> Result<Vec<Value>>
where
	E: PgExecutor<'e>,
{
	let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {BATTLE_COLUMNS} FROM battles"));

	push_conditions(&mut builder, query.filter.conditions());
	push_sort(&mut builder, query.sort.keys());

	if query.limit > 0 {
		builder.push(" LIMIT ");
		builder.push_bind(i64::try_from(query.limit).unwrap_or(i64::MAX));
	}

	let rows = builder.build_query_as::<Battle>().fetch_all(executor).await?;

	Ok(rows.iter().map(|row| query.projection.apply(row.to_document())).collect())
}

/// Runs a match/group/sort pipeline as one statement and returns one JSON object per group.
pub async fn aggregate_battles<'e, E>(executor: E, pipeline: &Pipeline) -> Result<Vec<Value>>
where
	E: PgExecutor<'e>,
{
	if pipeline.group.is_empty() && pipeline.accumulators.is_empty() {
		return Err(Error::InvalidPipeline("Pipeline has no group keys or accumulators.".into()));
	}

	let mut builder = QueryBuilder::<Postgres>::new("SELECT jsonb_build_object(");

	{
		let mut outputs = builder.separated(", ");

		for (idx, key) in pipeline.group.iter().enumerate() {
			outputs.push_bind(key.name);
			outputs.push_unseparated(format!("::text, k{idx}"));
		}
		for (idx, acc) in pipeline.accumulators.iter().enumerate() {
			outputs.push_bind(acc.name());
			outputs.push_unseparated(format!("::text, a{idx}"));
		}
	}

	builder.push(") AS doc FROM (SELECT ");

	{
		let mut columns = builder.separated(", ");

		for idx in 0..pipeline.group.len() {
			columns.push(format!("k{idx}"));
		}
		for (idx, acc) in pipeline.accumulators.iter().enumerate() {
			columns.push(match acc {
				Accumulator::Count { .. } => format!("count(*) AS a{idx}"),
				Accumulator::Sum { .. } => format!("COALESCE(sum(v{idx}), 0) AS a{idx}"),
				Accumulator::Avg { .. } => format!("avg(v{idx})::float8 AS a{idx}"),
			});
		}
	}

	builder.push(" FROM (SELECT ");

	{
		let mut inputs = builder.separated(", ");

		for (idx, key) in pipeline.group.iter().enumerate() {
			match key.expr {
				GroupExpr::EpochDay => {
					inputs.push("to_char(epoch AT TIME ZONE 'UTC', 'YYYY-MM-DD')");
				},
				GroupExpr::BattleNumber(field) => push_battle_number(&mut inputs, field),
			}

			inputs.push_unseparated(format!(" AS k{idx}"));
		}
		for (idx, acc) in pipeline.accumulators.iter().enumerate() {
			match acc {
				Accumulator::Count { .. } => {
					inputs.push("1");
				},
				Accumulator::Sum { field, .. } | Accumulator::Avg { field, .. } =>
					push_battle_number(&mut inputs, *field),
			}

			inputs.push_unseparated(format!(" AS v{idx}"));
		}
	}

	builder.push(" FROM battles");
	push_conditions(&mut builder, pipeline.filter.conditions());
	builder.push(") src");

	if !pipeline.group.is_empty() {
		builder.push(" GROUP BY ");

		let mut keys = builder.separated(", ");

		for idx in 0..pipeline.group.len() {
			keys.push(format!("k{idx}"));
		}
	}

	builder.push(") grouped");

	let mut first = true;

	for sort in &pipeline.sort {
		let Some(alias) = output_alias(pipeline, sort.name) else {
			continue;
		};

		builder.push(if first { " ORDER BY " } else { ", " });
		builder.push(alias);
		builder.push(direction_sql(sort.direction));

		first = false;
	}

	let docs = builder.build_query_scalar::<Value>().fetch_all(executor).await?;

	Ok(docs)
}

pub async fn list_pending_epochs<'e, E>(
	executor: E,
	after: Option<Uuid>,
	limit: u32,
) -> Result<Vec<PendingEpoch>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, PendingEpoch>(
		"\
SELECT battle_id, battle_time
FROM battles
WHERE epoch IS NULL
\tAND ($1::uuid IS NULL OR battle_id > $1)
ORDER BY battle_id
LIMIT $2",
	)
	.bind(after)
	.bind(i64::from(limit))
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Sets `epoch` unless it is already set. Returns whether the row changed.
pub async fn set_epoch<'e, E>(executor: E, battle_id: Uuid, epoch: OffsetDateTime) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result =
		sqlx::query("UPDATE battles SET epoch = $1 WHERE battle_id = $2 AND epoch IS NULL")
			.bind(epoch)
			.bind(battle_id)
			.execute(executor)
			.await?;

	Ok(result.rows_affected() == 1)
}

pub async fn list_pending_players<'e, E>(
	executor: E,
	after: Option<Uuid>,
	limit: u32,
) -> Result<Vec<PendingPlayer>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, PendingPlayer>(
		"\
SELECT battle_id, battle
FROM battles
WHERE extracted_player IS NULL
\tAND ($1::uuid IS NULL OR battle_id > $1)
ORDER BY battle_id
LIMIT $2",
	)
	.bind(after)
	.bind(i64::from(limit))
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Sets `extracted_player` unless it is already set. Returns whether the row changed.
pub async fn set_extracted_player<'e, E>(
	executor: E,
	battle_id: Uuid,
	player: &Value,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"UPDATE battles SET extracted_player = $1 WHERE battle_id = $2 AND extracted_player IS NULL",
	)
	.bind(player)
	.bind(battle_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() == 1)
}

fn push_conditions(builder: &mut QueryBuilder<'_, Postgres>, conditions: &[Condition]) {
	for (idx, condition) in conditions.iter().enumerate() {
		builder.push(if idx == 0 { " WHERE " } else { " AND " });

		match condition {
			Condition::EpochAtLeast(epoch) => {
				builder.push("epoch >= ").push_bind(epoch.datetime());
			},
			Condition::EpochAtMost(epoch) => {
				builder.push("epoch <= ").push_bind(epoch.datetime());
			},
			Condition::EpochPresent => {
				builder.push("epoch IS NOT NULL");
			},
			Condition::Ranked(true) => {
				builder.push("battle ->> 'type' = ").push_bind(RANKED_TYPE);
			},
			Condition::Ranked(false) => {
				builder.push("battle ->> 'type' IS DISTINCT FROM ").push_bind(RANKED_TYPE);
			},
			Condition::PlayerPresent(true) => {
				builder.push("(player IS NOT NULL AND player <> 'null'::jsonb)");
			},
			Condition::PlayerPresent(false) => {
				builder.push("(player IS NULL OR player = 'null'::jsonb)");
			},
			Condition::BrawlerIn(names) => {
				builder
					.push("extracted_player #>> '{brawler,name}' = ANY(")
					.push_bind(names.clone())
					.push(")");
			},
			Condition::ModeIn(modes) => {
				builder.push("battle ->> 'mode' = ANY(").push_bind(modes.clone()).push(")");
			},
		}
	}
}

fn push_sort(builder: &mut QueryBuilder<'_, Postgres>, keys: &[SortKey]) {
	let mut first = true;

	for key in keys {
		let Some(column) = sort_column(&key.path) else {
			continue;
		};

		builder.push(if first { " ORDER BY " } else { ", " });

		match column {
			SortColumn::Plain(name) => {
				builder.push(name);
			},
			SortColumn::Json { column, path } => {
				builder.push(column).push(" #> ").push_bind(path);
			},
		}

		builder.push(direction_sql(key.direction));

		first = false;
	}
}

/// Maps a document path onto the table. Paths outside the document shape are not sortable.
fn sort_column(path: &str) -> Option<SortColumn> {
	let plain = match path {
		"_id" => Some("battle_id"),
		"battleTime" => Some("battle_time"),
		"epoch" => Some("epoch"),
		"battle" => Some("battle"),
		"player" => Some("player"),
		"extracted.player" => Some("extracted_player"),
		_ => None,
	};

	if let Some(name) = plain {
		return Some(SortColumn::Plain(name));
	}

	[("battle.", "battle"), ("player.", "player"), ("extracted.player.", "extracted_player")]
		.into_iter()
		.find_map(|(prefix, column)| {
			path.strip_prefix(prefix).map(|rest| SortColumn::Json {
				column,
				path: rest.split('.').map(str::to_string).collect(),
			})
		})
}

/// Missing values order lowest, as in a document store.
fn direction_sql(direction: Direction) -> &'static str {
	match direction {
		Direction::Ascending => " ASC NULLS FIRST",
		Direction::Descending => " DESC NULLS LAST",
	}
}

fn output_alias(pipeline: &Pipeline, name: &str) -> Option<String> {
	if let Some(idx) = pipeline.group.iter().position(|key| key.name == name) {
		return Some(format!("k{idx}"));
	}

	pipeline.accumulators.iter().position(|acc| acc.name() == name).map(|idx| format!("a{idx}"))
}

fn push_battle_number<Sep>(inputs: &mut Separated<'_, '_, Postgres, Sep>, field: &'static str)
where
	Sep: Display,
{
	inputs.push("CASE WHEN jsonb_typeof(battle -> ");
	inputs.push_bind_unseparated(field);
	inputs.push_unseparated("::text) = 'number' THEN (battle ->> ");
	inputs.push_bind_unseparated(field);
	inputs.push_unseparated("::text)::numeric END");
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn document_paths_map_to_columns() {
		assert!(matches!(sort_column("epoch"), Some(SortColumn::Plain("epoch"))));
		assert!(matches!(sort_column("_id"), Some(SortColumn::Plain("battle_id"))));
		assert!(matches!(
			sort_column("extracted.player.brawler.power"),
			Some(SortColumn::Json { column: "extracted_player", ref path })
				if path == &["brawler".to_string(), "power".to_string()]
		));
		assert!(sort_column("unknown.field").is_none());
	}

	#[test]
	fn conditions_render_in_order() {
		let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM battles");

		push_conditions(
			&mut builder,
			&[Condition::EpochPresent, Condition::Ranked(false), Condition::PlayerPresent(true)],
		);

		assert_eq!(
			builder.sql(),
			"SELECT 1 FROM battles WHERE epoch IS NOT NULL AND battle ->> 'type' IS DISTINCT FROM $1 AND (player IS NOT NULL AND player <> 'null'::jsonb)"
		);
	}
}
