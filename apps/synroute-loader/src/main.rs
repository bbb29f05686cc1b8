use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = synroute_loader::Args::parse();

	synroute_loader::run(args).await
}
