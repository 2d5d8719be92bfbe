//! Development provider that signs everyone in as one canned identity.
//!
//! The authorization endpoint is the application's own redirect URI with a preset `code`, so the
//! browser round-trip, the state check, and the verifier check all still run. Only the calls to
//! the provider's token and profile endpoints are replaced.

// self
use crate::{
	_prelude::*,
	auth::{ProviderProfile, TokenGrant, TokenSecret},
	config::{AuthConfig, ClientCredentials, ProviderMode},
	error::{ConfigError, ProviderError},
	provider::{AuthProvider, ProviderFuture},
};

/// Authorization code the stub endpoint hands back.
pub const STUB_AUTHORIZATION_CODE: &str = "stub-authorization-code";
/// Provider-side id of the stub identity.
pub const STUB_USER_ID: &str = "123456789";
/// Biography of the stub identity.
pub const STUB_BIO: &str = "Product marketing lead @aztecnetwork\n 🪿 | Building with @noirlang\n 👽 | Prev @openzeppelin\n & @chainlink\n | Market in prod";
/// Full-resolution avatar of the stub identity.
pub const STUB_PROFILE_IMAGE_URL: &str =
	"https://pbs.twimg.com/profile_images/1907046935607013376/2rzn07BJ.jpg";

const STUB_ACCESS_TOKEN: &str = "stub-access-token";

/// Provider returning a fixed identity for local development.
#[derive(Clone, Debug)]
pub struct StubProvider {
	authorization_endpoint: Url,
	credentials: ClientCredentials,
	profile: ProviderProfile,
}
impl StubProvider {
	/// Creates a stub that redirects straight back to `redirect_uri` and signs in as `username`.
	pub fn new(redirect_uri: &Url, username: impl Into<String>) -> Self {
		let mut authorization_endpoint = redirect_uri.clone();

		authorization_endpoint.query_pairs_mut().append_pair("code", STUB_AUTHORIZATION_CODE);

		let username = username.into();

		Self {
			authorization_endpoint,
			credentials: ClientCredentials::new("stub-client"),
			profile: ProviderProfile {
				id: STUB_USER_ID.into(),
				name: Some(capitalize(&username)),
				username,
				bio: Some(STUB_BIO.into()),
				profile_image_url: Some(STUB_PROFILE_IMAGE_URL.into()),
			},
		}
	}

	/// Stub configured from [`AuthConfig::redirect_uri`] and [`AuthConfig::stub_username`].
	pub fn from_config(config: &AuthConfig) -> Self {
		Self::new(&config.redirect_uri, config.stub_username.clone())
	}
}
impl AuthProvider for StubProvider {
	fn mode(&self) -> ProviderMode {
		ProviderMode::Stub
	}

	fn client_credentials(&self) -> Result<&ClientCredentials, ConfigError> {
		Ok(&self.credentials)
	}

	fn authorization_endpoint(&self) -> &Url {
		&self.authorization_endpoint
	}

	fn exchange_code<'a>(
		&'a self,
		code: &'a str,
		verifier: &'a TokenSecret,
		_redirect_uri: &'a Url,
	) -> ProviderFuture<'a, TokenGrant> {
		Box::pin(async move {
			if code != STUB_AUTHORIZATION_CODE || verifier.is_empty() {
				return Err(ProviderError::OAuth {
					error: "invalid_grant".into(),
					description: Some("Stub provider only accepts its own code.".into()),
					status: Some(400),
				});
			}

			Ok(TokenGrant::bearer(STUB_ACCESS_TOKEN))
		})
	}

	fn fetch_profile<'a>(
		&'a self,
		_grant: &'a TokenGrant,
	) -> ProviderFuture<'a, Option<ProviderProfile>> {
		Box::pin(async move { Ok(Some(self.profile.clone())) })
	}
}

fn capitalize(value: &str) -> String {
	let mut chars = value.chars();

	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}
