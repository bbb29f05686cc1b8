use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = synroute_api::Args::parse();

	synroute_api::run(args).await
}
