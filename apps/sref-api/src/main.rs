use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = sref_api::Args::parse();

	sref_api::run(args).await
}
