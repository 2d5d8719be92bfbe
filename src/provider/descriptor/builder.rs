//! Validated construction of [`ProviderDescriptor`] values.

// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	provider::{ClientAuthMethod, ProviderDescriptor, ProviderEndpoints, ProviderQuirks},
};

/// Reasons a descriptor is refused.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProviderDescriptorError {
	/// Descriptor identifier is not a valid slug.
	#[error("Descriptor identifier is invalid: {id}.")]
	InvalidId {
		/// Rejected identifier.
		id: String,
	},
	/// No authorization endpoint was supplied.
	#[error("Missing authorization endpoint.")]
	MissingAuthorizationEndpoint,
	/// No token endpoint was supplied.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// No profile endpoint was supplied.
	#[error("Missing profile endpoint.")]
	MissingProfileEndpoint,
	/// Endpoint cannot be used to build requests (unparsable, or carries a fragment).
	#[error("The {endpoint} endpoint is not usable: {url}.")]
	InvalidEndpoint {
		/// `authorization`, `token`, or `profile`.
		endpoint: &'static str,
		/// Rejected value.
		url: String,
	},
	/// Endpoint is not HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// `authorization`, `token`, or `profile`.
		endpoint: &'static str,
		/// Rejected value.
		url: String,
	},
	/// Scope delimiter is a control character.
	#[error("Scope delimiter must be a printable character.")]
	InvalidScopeDelimiter {
		/// Rejected delimiter.
		delimiter: char,
	},
}

/// Collects endpoints and options, then validates them all at once in [`build`](Self::build).
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	id: ProviderId,
	authorization: Option<Url>,
	token: Option<Url>,
	profile: Option<Url>,
	client_auth: ClientAuthMethod,
	quirks: ProviderQuirks,
}
impl ProviderDescriptorBuilder {
	/// Empty builder for `id`.
	pub fn new(id: ProviderId) -> Self {
		Self {
			id,
			authorization: None,
			token: None,
			profile: None,
			client_auth: ClientAuthMethod::default(),
			quirks: ProviderQuirks::default(),
		}
	}

	/// Where the browser is sent to grant consent.
	pub fn authorization_endpoint(self, url: Url) -> Self {
		Self { authorization: Some(url), ..self }
	}

	/// Where authorization codes are exchanged.
	pub fn token_endpoint(self, url: Url) -> Self {
		Self { token: Some(url), ..self }
	}

	/// Authenticated-user lookup, including any fixed query such as `user.fields`.
	pub fn profile_endpoint(self, url: Url) -> Self {
		Self { profile: Some(url), ..self }
	}

	/// How the client authenticates at the token endpoint.
	pub fn preferred_client_auth_method(self, method: ClientAuthMethod) -> Self {
		Self { client_auth: method, ..self }
	}

	/// Rendering quirks.
	pub fn quirks(self, quirks: ProviderQuirks) -> Self {
		Self { quirks, ..self }
	}

	/// Validates and returns the descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let endpoints = ProviderEndpoints {
			authorization: require(
				"authorization",
				self.authorization,
				ProviderDescriptorError::MissingAuthorizationEndpoint,
			)?,
			token: require("token", self.token, ProviderDescriptorError::MissingTokenEndpoint)?,
			profile: require(
				"profile",
				self.profile,
				ProviderDescriptorError::MissingProfileEndpoint,
			)?,
		};
		let delimiter = self.quirks.scope_delimiter;

		if delimiter.is_control() {
			return Err(ProviderDescriptorError::InvalidScopeDelimiter { delimiter });
		}

		Ok(ProviderDescriptor {
			id: self.id,
			endpoints,
			preferred_client_auth_method: self.client_auth,
			quirks: self.quirks,
		})
	}
}

fn require(
	endpoint: &'static str,
	url: Option<Url>,
	missing: ProviderDescriptorError,
) -> Result<Url, ProviderDescriptorError> {
	let url = url.ok_or(missing)?;

	if url.scheme() != "https" {
		return Err(ProviderDescriptorError::InsecureEndpoint { endpoint, url: url.into() });
	}
	// Query parameters are appended to these URLs; a fragment would swallow them.
	if url.fragment().is_some() {
		return Err(ProviderDescriptorError::InvalidEndpoint { endpoint, url: url.into() });
	}

	Ok(url)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Fixture URL should parse.")
	}

	fn bare() -> ProviderDescriptorBuilder {
		ProviderDescriptor::builder(ProviderId::new("mock").expect("Fixture id should be valid."))
	}

	fn complete() -> ProviderDescriptorBuilder {
		bare()
			.authorization_endpoint(url("https://example.com/auth"))
			.token_endpoint(url("https://example.com/token"))
			.profile_endpoint(url("https://example.com/me"))
	}

	#[test]
	fn plain_http_is_refused() {
		let err = complete()
			.profile_endpoint(url("http://example.com/me"))
			.build()
			.expect_err("Plain HTTP profile endpoint should be rejected.");

		assert!(matches!(err, ProviderDescriptorError::InsecureEndpoint { endpoint: "profile", .. }));
	}

	#[test]
	fn every_endpoint_is_required() {
		let err = bare()
			.authorization_endpoint(url("https://example.com/auth"))
			.token_endpoint(url("https://example.com/token"))
			.build()
			.expect_err("Descriptor without a profile endpoint should be rejected.");

		assert_eq!(err, ProviderDescriptorError::MissingProfileEndpoint);
	}

	#[test]
	fn fragments_are_refused() {
		let err = complete()
			.authorization_endpoint(url("https://example.com/auth#consent"))
			.build()
			.expect_err("Fragments would hide appended parameters.");

		assert!(matches!(
			err,
			ProviderDescriptorError::InvalidEndpoint { endpoint: "authorization", .. }
		));
	}

	#[test]
	fn control_character_delimiters_are_refused() {
		let err = complete()
			.quirks(ProviderQuirks { scope_delimiter: '\n' })
			.build()
			.expect_err("Control delimiter should be rejected.");

		assert_eq!(err, ProviderDescriptorError::InvalidScopeDelimiter { delimiter: '\n' });
	}
}
