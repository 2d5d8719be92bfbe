//! Provider-facing descriptors (data) and the [`AuthProvider`] capability (behavior).
//!
//! `descriptor` holds validated endpoint metadata. [`AuthProvider`] is what the flows call to
//! reach the provider: [`LiveProvider`] talks HTTPS to the real endpoints while [`StubProvider`]
//! answers with a canned identity. The capability is chosen from configuration at startup, never
//! by inspecting the request host.

pub mod descriptor;
pub mod live;
pub mod stub;

pub use descriptor::*;
pub use live::*;
pub use stub::*;

// self
use crate::{
	_prelude::*,
	auth::{ProviderProfile, TokenGrant, TokenSecret},
	config::{ClientCredentials, ProviderMode},
	error::{ConfigError, ProviderError},
};
#[cfg(feature = "reqwest")] use crate::config::AuthConfig;

/// Boxed future returned by [`AuthProvider`] calls.
pub type ProviderFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, ProviderError>> + 'a + Send>>;

/// Token exchange and profile lookup against one OAuth provider.
pub trait AuthProvider
where
	Self: Send + Sync,
{
	/// Capability variant, for logs.
	fn mode(&self) -> ProviderMode;

	/// Client credentials used in the authorize URL, or why they are unusable.
	fn client_credentials(&self) -> Result<&ClientCredentials, ConfigError>;

	/// Endpoint the browser is sent to; query parameters are appended by the flow.
	fn authorization_endpoint(&self) -> &Url;

	/// Exchanges a single-use authorization code plus its PKCE verifier for tokens.
	fn exchange_code<'a>(
		&'a self,
		code: &'a str,
		verifier: &'a TokenSecret,
		redirect_uri: &'a Url,
	) -> ProviderFuture<'a, TokenGrant>;

	/// Looks up the authenticated user; `Ok(None)` when the provider returned no user data.
	fn fetch_profile<'a>(
		&'a self,
		grant: &'a TokenGrant,
	) -> ProviderFuture<'a, Option<ProviderProfile>>;
}

/// Builds the provider selected by `config.mode`, using reqwest with the configured timeout.
#[cfg(feature = "reqwest")]
pub fn provider_from_config(config: &AuthConfig) -> Result<Arc<dyn AuthProvider>, ConfigError> {
	let provider: Arc<dyn AuthProvider> = match config.mode {
		ProviderMode::Live => Arc::new(LiveProvider::from_config(config)?),
		ProviderMode::Stub => Arc::new(StubProvider::from_config(config)),
	};

	Ok(provider)
}
