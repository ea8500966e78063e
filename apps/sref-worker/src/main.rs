use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = sref_worker::Args::parse();

	sref_worker::run(args).await
}
