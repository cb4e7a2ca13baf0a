use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = argus_search::Args::parse();

	argus_search::run(args).await
}
