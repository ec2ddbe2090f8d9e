use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = opps_indexer::Args::parse();

	opps_indexer::run(args).await
}
