//! Backfill of the two derived fields: `epoch` from the raw battle time, and the tracked
//! player's entry extracted from the battle payload.
//!
//! Each pass pages through pending records by `battle_id`, so a record that cannot be
//! normalized is visited once per run and stays pending. Setters only write unset fields.

use brawl_domain::{battle_time::parse_battle_time, epoch::format_rfc3339, player};
use brawl_storage::BackfillStore;

use crate::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Report {
	pub epochs_updated: u64,
	/// Records whose raw battle time could not be parsed. They remain pending.
	pub epochs_unparseable: u64,
	pub players_updated: u64,
	/// Records another writer normalized between listing and update.
	pub skipped: u64,
}

pub async fn run_backfill(
	store: &dyn BackfillStore,
	tag: &str,
	batch_size: u32,
) -> Result<Report> {
	let mut report = Report::default();

	backfill_epochs(store, batch_size, &mut report).await?;
	backfill_players(store, tag, batch_size, &mut report).await?;

	Ok(report)
}

async fn backfill_epochs(
	store: &dyn BackfillStore,
	batch_size: u32,
	report: &mut Report,
) -> Result<()> {
	let mut after = None;

	loop {
		let page = store.pending_epochs(after, batch_size).await?;
		let Some(last) = page.last() else {
			break;
		};

		after = Some(last.battle_id);

		for pending in &page {
			let epoch = match parse_battle_time(&pending.battle_time) {
				Ok(epoch) => epoch,
				Err(err) => {
					tracing::warn!(
						battle_id = %pending.battle_id,
						error = %err,
						"Leaving record without epoch."
					);

					report.epochs_unparseable += 1;

					continue;
				},
			};

			if store.set_epoch(pending.battle_id, epoch).await? {
				tracing::info!(
					battle_id = %pending.battle_id,
					epoch = %format_rfc3339(epoch),
					"Set epoch."
				);

				report.epochs_updated += 1;
			} else {
				report.skipped += 1;
			}
		}

		if page.len() < batch_size as usize {
			break;
		}
	}

	tracing::info!(
		updated = report.epochs_updated,
		unparseable = report.epochs_unparseable,
		"Epoch pass finished."
	);

	Ok(())
}

async fn backfill_players(
	store: &dyn BackfillStore,
	tag: &str,
	batch_size: u32,
	report: &mut Report,
) -> Result<()> {
	let mut after = None;

	loop {
		let page = store.pending_players(after, batch_size).await?;
		let Some(last) = page.last() else {
			break;
		};

		after = Some(last.battle_id);

		for pending in &page {
			let extracted = player::extract_tracked_player(&pending.battle, tag);
			let found = extracted.as_object().is_some_and(|entry| !entry.is_empty());

			if store.set_extracted_player(pending.battle_id, &extracted).await? {
				tracing::info!(battle_id = %pending.battle_id, found, "Set extracted player.");

				report.players_updated += 1;
			} else {
				report.skipped += 1;
			}
		}

		if page.len() < batch_size as usize {
			break;
		}
	}

	tracing::info!(updated = report.players_updated, "Player pass finished.");

	Ok(())
}
