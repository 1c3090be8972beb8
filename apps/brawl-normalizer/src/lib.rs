pub mod normalizer;

mod error;

pub use error::{Error, Result};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use brawl_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = brawl_cli::VERSION,
	rename_all = "kebab",
	styles = brawl_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: std::path::PathBuf,
}

/// Runs one backfill pass over every pending record and exits.
pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = brawl_config::load(&args.config)?;
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = Db::connect(&config.storage.postgres).await?;
	db.ensure_schema().await?;

	let report =
		normalizer::run_backfill(&db, &config.player.tag, config.normalizer.batch_size).await?;

	tracing::info!(
		epochs_updated = report.epochs_updated,
		epochs_unparseable = report.epochs_unparseable,
		players_updated = report.players_updated,
		"Backfill finished."
	);

	Ok(())
}
