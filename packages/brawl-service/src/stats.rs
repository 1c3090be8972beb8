use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use brawl_domain::{
	Condition, FindQuery, Projection, SortOrder, StoreFilter,
	pipeline::Pipeline,
	stats::{self, DailyTrophies, RankCount, SoloDay},
};

use crate::{BattleService, Error, Result};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
	pub rank_distribution: Vec<RankCount>,
	pub solo_daily_summary: Vec<SoloDay>,
	pub overall_daily_trophy_summary: Vec<DailyTrophies>,
}

/// Earliest and latest `epoch` of any normalized record, both `None` before the first one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interval {
	pub start: Option<String>,
	pub end: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrawlersResponse {
	pub has_data: bool,
	pub brawlers: Vec<Value>,
}

impl BattleService {
	pub async fn stats(&self) -> Result<StatsResponse> {
		let (rank_distribution, solo_daily_summary, overall_daily_trophy_summary) = tokio::try_join!(
			self.rows::<RankCount>(stats::rank_distribution()),
			self.rows::<SoloDay>(stats::solo_daily_summary()),
			self.rows::<DailyTrophies>(stats::overall_daily_trophy_summary()),
		)?;

		Ok(StatsResponse { rank_distribution, solo_daily_summary, overall_daily_trophy_summary })
	}

	pub async fn interval(&self) -> Result<Interval> {
		let (earliest, latest) = tokio::try_join!(
			self.edge_epoch(SortOrder::epoch_ascending()),
			self.edge_epoch(SortOrder::epoch_descending()),
		)?;

		match (earliest, latest) {
			(Some(start), Some(end)) => Ok(Interval { start: Some(start), end: Some(end) }),
			_ => {
				tracing::debug!("No normalized records yet. Interval is empty.");

				Ok(Interval { start: None, end: None })
			},
		}
	}

	/// Brawler roster from the most recent profile snapshot.
	pub async fn brawlers(&self) -> Result<BrawlersResponse> {
		let query = FindQuery::new(StoreFilter::new(vec![Condition::PlayerPresent(true)]))
			.sort(SortOrder::epoch_descending())
			.projection(Projection::include(["player"]))
			.limit(1);
		let Some(latest) = self.find(&query).await?.into_iter().next() else {
			tracing::debug!("No profile snapshot yet. Brawler roster is empty.");

			return Ok(BrawlersResponse { has_data: false, brawlers: Vec::new() });
		};
		let brawlers = latest
			.pointer("/player/brawlers")
			.and_then(Value::as_array)
			.cloned()
			.unwrap_or_default();

		Ok(BrawlersResponse { has_data: true, brawlers })
	}

	async fn rows<T>(&self, pipeline: Pipeline) -> Result<Vec<T>>
	where
		T: DeserializeOwned,
	{
		let docs = self.aggregate(&pipeline).await?;

		docs.into_iter().map(|doc| serde_json::from_value(doc).map_err(Error::from)).collect()
	}

	async fn edge_epoch(&self, sort: SortOrder) -> Result<Option<String>> {
		let query = FindQuery::new(StoreFilter::new(vec![Condition::EpochPresent]))
			.sort(sort)
			.projection(Projection::include(["epoch"]))
			.limit(1);
		let docs = self.find(&query).await?;

		Ok(docs.first().and_then(|doc| doc.get("epoch")).and_then(Value::as_str).map(str::to_string))
	}
}
