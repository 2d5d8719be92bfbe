//! Sign-in core for the Aztec Guild membership-card minter: OAuth 2.0 authorization code + PKCE
//! with CSRF state, one-shot pending secrets, and an optional axum surface.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
#[cfg(feature = "server")] pub mod server;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{ProviderId, ScopeSet},
		config::{AuthConfig, ClientCredentials},
		flows::Authenticator,
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
		provider::{ClientAuthMethod, LiveProvider, ProviderDescriptor},
	};

	/// Client identifier used by the integration fixtures.
	pub const TEST_CLIENT_ID: &str = "guild-client";
	/// Client secret used by the integration fixtures.
	pub const TEST_CLIENT_SECRET: &str = "guild-secret";
	/// Redirect URI registered for the integration fixtures.
	pub const TEST_REDIRECT_URI: &str = "https://guild.example.com/callback";
	/// Application root the callback redirects back to.
	pub const TEST_APP_ROOT: &str = "https://guild.example.com/";

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.timeout(std::time::Duration::from_secs(5))
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Provider descriptor whose token and profile endpoints live on a mock server.
	pub fn test_descriptor(base: &str) -> ProviderDescriptor {
		let base = base.trim_end_matches('/');

		ProviderDescriptor::builder(
			ProviderId::new("mock-x").expect("Mock provider identifier should be valid."),
		)
		.authorization_endpoint(
			Url::parse(&format!("{base}/i/oauth2/authorize"))
				.expect("Mock authorization endpoint should parse."),
		)
		.token_endpoint(
			Url::parse(&format!("{base}/2/oauth2/token")).expect("Mock token endpoint should parse."),
		)
		.profile_endpoint(
			Url::parse(&format!("{base}/2/users/me")).expect("Mock profile endpoint should parse."),
		)
		.preferred_client_auth_method(ClientAuthMethod::ClientSecretBasic)
		.build()
		.expect("Mock provider descriptor should build.")
	}

	/// Configuration pointing at the mock provider with the shared test credentials.
	pub fn test_config(base: &str) -> AuthConfig {
		AuthConfig::builder(test_descriptor(base))
			.client(ClientCredentials::new(TEST_CLIENT_ID).with_secret(TEST_CLIENT_SECRET))
			.redirect_uri(Url::parse(TEST_REDIRECT_URI).expect("Redirect URI fixture should parse."))
			.app_root(Url::parse(TEST_APP_ROOT).expect("App root fixture should parse."))
			.scope(
				ScopeSet::new(["tweet.read", "users.read"])
					.expect("Scope fixture should be valid."),
			)
			.build()
			.expect("Test configuration should build.")
	}

	/// Constructs a live [`Authenticator`] that talks to the mock provider at `base` through the
	/// insecure test transport.
	pub fn build_test_authenticator(base: &str) -> Authenticator {
		let config = test_config(base);
		let provider = LiveProvider::with_http_client(
			config.descriptor.clone(),
			config.client.clone(),
			test_reqwest_http_client(),
			ReqwestTransportErrorMapper,
		);

		Authenticator::new(Arc::new(config), Arc::new(provider))
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(feature = "server")] use {color_eyre as _, tracing_subscriber as _};
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _, tower as _};
