//! Dashboard aggregates, bucketed by UTC calendar day.

use serde::{Deserialize, Serialize};

use crate::{
	Condition, Direction, SOLO_SHOWDOWN_MODE, StoreFilter,
	pipeline::{Accumulator, GroupExpr, GroupKey, OutputSort, Pipeline},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankCount {
	pub date: String,
	pub rank: Option<i64>,
	pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoloDay {
	pub date: String,
	pub average_rank: Option<f64>,
	pub total_trophy_change: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTrophies {
	pub date: String,
	pub total_trophy_change: i64,
}

const DAY: GroupKey = GroupKey { name: "date", expr: GroupExpr::EpochDay };
const NEWEST_DAY_FIRST: OutputSort = OutputSort { name: "date", direction: Direction::Descending };

/// Solo matches per (day, rank), newest day first and best rank first within a day.
pub fn rank_distribution() -> Pipeline {
	Pipeline {
		filter: solo_filter(),
		group: vec![DAY, GroupKey { name: "rank", expr: GroupExpr::BattleNumber("rank") }],
		accumulators: vec![Accumulator::Count { name: "count" }],
		sort: vec![NEWEST_DAY_FIRST, OutputSort { name: "rank", direction: Direction::Ascending }],
	}
}

/// Mean rank and trophy delta of solo matches per day.
pub fn solo_daily_summary() -> Pipeline {
	Pipeline {
		filter: solo_filter(),
		group: vec![DAY],
		accumulators: vec![
			Accumulator::Avg { name: "averageRank", field: "rank" },
			Accumulator::Sum { name: "totalTrophyChange", field: "trophyChange" },
		],
		sort: vec![NEWEST_DAY_FIRST],
	}
}

/// Trophy delta across all modes per day.
pub fn overall_daily_trophy_summary() -> Pipeline {
	Pipeline {
		filter: StoreFilter::new(vec![Condition::EpochPresent]),
		group: vec![DAY],
		accumulators: vec![Accumulator::Sum { name: "totalTrophyChange", field: "trophyChange" }],
		sort: vec![NEWEST_DAY_FIRST],
	}
}

fn solo_filter() -> StoreFilter {
	StoreFilter::new(vec![
		Condition::EpochPresent,
		Condition::ModeIn(vec![SOLO_SHOWDOWN_MODE.to_string()]),
	])
}
