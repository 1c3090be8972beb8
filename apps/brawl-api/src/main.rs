use brawl_api::Args;
use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	brawl_api::run(Args::parse()).await
}
