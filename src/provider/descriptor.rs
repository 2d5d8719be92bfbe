//! Provider descriptor data structures shared by the live provider and the authorize URL builder.

pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, auth::ProviderId};

/// X (Twitter) OAuth 2.0 authorization endpoint.
pub const X_AUTHORIZATION_ENDPOINT: &str = "https://twitter.com/i/oauth2/authorize";
/// X (Twitter) OAuth 2.0 token endpoint.
pub const X_TOKEN_ENDPOINT: &str = "https://api.twitter.com/2/oauth2/token";
/// X (Twitter) authenticated-user lookup with the profile fields the card renderer needs.
pub const X_PROFILE_ENDPOINT: &str =
	"https://api.twitter.com/2/users/me?user.fields=username,description,profile_image_url,name";

/// Preferred client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
	/// Public clients that prove possession via PKCE only.
	NoneWithPkce,
}
impl ClientAuthMethod {
	/// Stable label used in configuration errors.
	pub const fn as_str(self) -> &'static str {
		match self {
			ClientAuthMethod::ClientSecretBasic => "client_secret_basic",
			ClientAuthMethod::ClientSecretPost => "client_secret_post",
			ClientAuthMethod::NoneWithPkce => "none",
		}
	}

	/// Returns true when the token endpoint expects a client secret.
	pub const fn requires_secret(self) -> bool {
		!matches!(self, ClientAuthMethod::NoneWithPkce)
	}
}

/// Rendering differences between providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Separator placed between scopes in the `scope` parameter.
	pub scope_delimiter: char,
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self { scope_delimiter: ' ' }
	}
}

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint the browser is sent to.
	pub authorization: Url,
	/// Token endpoint used for the code exchange.
	pub token: Url,
	/// Authenticated-user endpoint queried with the access token.
	pub profile: Url,
}

/// Immutable provider descriptor consumed by flows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Preferred client authentication mechanism.
	pub preferred_client_auth_method: ClientAuthMethod,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}

	/// Descriptor for X (Twitter) OAuth 2.0 with a confidential client.
	pub fn x() -> Result<Self, ProviderDescriptorError> {
		let parse = |endpoint: &'static str, raw: &str| {
			Url::parse(raw).map_err(|_| ProviderDescriptorError::InvalidEndpoint {
				endpoint,
				url: raw.to_owned(),
			})
		};
		let id = ProviderId::new("x-com")
			.map_err(|_| ProviderDescriptorError::InvalidId { id: "x-com".into() })?;

		Self::builder(id)
			.authorization_endpoint(parse("authorization", X_AUTHORIZATION_ENDPOINT)?)
			.token_endpoint(parse("token", X_TOKEN_ENDPOINT)?)
			.profile_endpoint(parse("profile", X_PROFILE_ENDPOINT)?)
			.preferred_client_auth_method(ClientAuthMethod::ClientSecretBasic)
			.build()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn x_descriptor_matches_published_endpoints() {
		let descriptor = ProviderDescriptor::x().expect("X descriptor should build.");

		assert_eq!(descriptor.endpoints.authorization.as_str(), X_AUTHORIZATION_ENDPOINT);
		assert_eq!(descriptor.endpoints.token.as_str(), X_TOKEN_ENDPOINT);
		assert_eq!(descriptor.endpoints.profile.path(), "/2/users/me");
		assert_eq!(
			descriptor.endpoints.profile.query_pairs().find(|(key, _)| key == "user.fields"),
			Some(("user.fields".into(), "username,description,profile_image_url,name".into()))
		);
		assert_eq!(descriptor.preferred_client_auth_method, ClientAuthMethod::ClientSecretBasic);
		assert_eq!(descriptor.quirks.scope_delimiter, ' ');
	}
}
