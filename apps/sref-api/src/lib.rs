pub mod auth;
pub mod routes;
pub mod state;

use std::{future::IntoFuture, net::SocketAddr};

use clap::Parser;
use color_eyre::eyre;
use tokio::net::TcpListener;

use sref_cli::ConfigArgs;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = sref_cli::VERSION,
	rename_all = "kebab",
	styles = sref_cli::styles(),
)]
pub struct Args {
	#[command(flatten)]
	pub config: ConfigArgs,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = sref_config::load(&args.config.config)?;

	sref_cli::init_tracing(&config.service.log_level);

	let http_addr: SocketAddr = config.service.http_bind.parse()?;
	let admin_addr: SocketAddr = config.service.admin_bind.parse()?;

	if config.security.bind_localhost_only && !http_addr.ip().is_loopback() {
		return Err(eyre::eyre!(
			"http_bind must be a loopback address when bind_localhost_only is true."
		));
	}
	if !admin_addr.ip().is_loopback() && config.security.admin_auth_token.is_none() {
		return Err(eyre::eyre!(
			"admin_bind must be a loopback address unless admin_auth_token is set."
		));
	}

	let state = AppState::new(config).await?;
	let app = routes::router(state.clone());
	let admin_app = routes::admin_router(state);
	let http_listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, "HTTP server listening.");

	let http_server = axum::serve(http_listener, app);
	let admin_listener = TcpListener::bind(admin_addr).await?;

	tracing::info!(%admin_addr, "Admin server listening.");

	let admin_server = axum::serve(admin_listener, admin_app);

	tokio::try_join!(http_server.into_future(), admin_server.into_future())?;

	Ok(())
}
