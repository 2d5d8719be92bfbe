//! Sign-in service for the Aztec Guild minter.
//!
//! Configuration comes from the environment once at startup (see `AuthConfig::from_env`); the
//! listen address is `GUILD_AUTH_BIND` (default `127.0.0.1:3000`). Logging honors `RUST_LOG`.

// std
use std::{env, net::SocketAddr, sync::Arc};
// crates.io
use color_eyre::Result;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
// self
use guild_auth::{
	config::{AuthConfig, ProviderMode},
	flows::Authenticator,
	server,
};

const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let config = AuthConfig::from_env()?;

	if let (ProviderMode::Live, Err(e)) = (config.mode, config.client_credentials()) {
		tracing::warn!(error = %e, "Client credentials are unusable; /authorize will fail until they are set.");
	}

	let bind: SocketAddr = env::var("GUILD_AUTH_BIND").as_deref().unwrap_or(DEFAULT_BIND).parse()?;
	let authenticator = Arc::new(Authenticator::from_config(config)?);
	let listener = TcpListener::bind(bind).await?;

	server::serve(listener, authenticator, async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %e, "Failed to listen for shutdown signal.");
		}
	})
	.await?;

	Ok(())
}
