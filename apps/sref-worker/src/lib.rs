pub mod worker;

mod error;

pub use error::{Error, Result};

use clap::Parser;

use sref_cli::ConfigArgs;
use sref_service::SrefService;
use sref_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = sref_cli::VERSION,
	rename_all = "kebab",
	styles = sref_cli::styles(),
)]
pub struct Args {
	#[command(flatten)]
	pub config: ConfigArgs,
	/// Run a single recompute pass and exit.
	#[arg(long)]
	pub once: bool,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = sref_config::load(&args.config.config)?;

	sref_cli::init_tracing(&config.service.log_level);

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let state = worker::WorkerState::new(SrefService::new(config, db));

	if args.once {
		worker::recompute_once(&state).await?;

		return Ok(());
	}

	worker::run_worker(state).await?;

	Ok(())
}
