use brawl_normalizer::Args;
use clap::Parser;

/// Runs one backfill pass over the stored battles and exits.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	brawl_normalizer::run(Args::parse()).await
}
