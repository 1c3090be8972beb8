use serde::Serialize;
use serde_json::Value;

use brawl_domain::{FilterSpec, Provenance, client_state::ClientState, compose, fallback};

use crate::{BattleService, Result};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BattlesResponse {
	pub result_count: usize,
	/// Filter of the attempt that produced `records`, in document-store form.
	pub applied_filter: Value,
	pub flags: Flags,
	/// Limit of the attempt that produced `records`.
	pub limit: u64,
	pub records: Vec<Value>,
	pub forced: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Flags {
	pub provenance: Provenance,
}

/// A retrieval result together with the client state to hand back to the caller.
#[derive(Debug, Clone)]
pub struct Retrieval {
	pub response: BattlesResponse,
	pub client_state: ClientState,
}

impl BattleService {
	/// Retrieves records for `spec`, relaxing the epoch window when the exact query is empty.
	pub async fn battles(&self, spec: &FilterSpec) -> Result<Retrieval> {
		let mut provenance = Provenance::Exact;
		let mut query = compose(spec);
		let mut records = Vec::new();

		for attempt in Provenance::ORDER {
			let Some(planned) = fallback::plan(spec, attempt) else {
				tracing::debug!(?attempt, "Skipping retrieval attempt without a lower bound.");

				continue;
			};

			records = self.find(&planned).await?;
			provenance = attempt;
			query = planned;

			tracing::debug!(?provenance, count = records.len(), "Retrieval attempt finished.");

			if !records.is_empty() {
				break;
			}
		}

		let forced = provenance.is_forced();

		if forced {
			tracing::info!(
				?provenance,
				count = records.len(),
				"Requested window was empty. Served a relaxed result."
			);
		}

		let response = BattlesResponse {
			result_count: records.len(),
			applied_filter: query.filter.to_document(),
			flags: Flags { provenance },
			limit: query.limit,
			records,
			forced,
		};

		Ok(Retrieval { response, client_state: ClientState::from_filter(spec) })
	}
}
