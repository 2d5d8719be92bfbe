//! Sign-in error taxonomy shared by flows, providers, and secret stores.
//!
//! [`Error`] carries one variant per terminal failure of an authorization attempt. Provider and
//! storage detail rides along as `#[source]` chains so it can be logged server-side, while
//! [`FailureKind`] is the only projection that ever reaches a browser.

// self
use crate::{_prelude::*, auth::ScopeValidationError, provider::ProviderDescriptorError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Terminal failure of an authorization attempt.
///
/// None of these are retried; the only recovery is restarting at
/// [`Authenticator::begin_authorization`](crate::flows::Authenticator::begin_authorization).
#[derive(Debug, ThisError)]
pub enum Error {
	/// Client credentials or provider configuration are missing or invalid.
	#[error("OAuth provider is misconfigured.")]
	ProviderMisconfigured(#[from] ConfigError),
	/// The user declined consent at the provider.
	#[error("Provider denied the authorization request: {reason}.")]
	AuthorizationDenied {
		/// Provider-supplied `error` value.
		reason: String,
	},
	/// The redirect omitted `code` or `state`.
	#[error("Callback is missing the `{parameter}` parameter.")]
	MissingParameters {
		/// Name of the first missing parameter.
		parameter: &'static str,
	},
	/// No pending secret exists for the session (lost, expired, or already consumed).
	#[error("No pending authorization exists for this session.")]
	SessionExpired,
	/// Returned `state` differs from the pending secret's state.
	#[error("Callback state does not match the pending authorization.")]
	StateMismatch,
	/// The pending secret carries no PKCE verifier.
	#[error("Pending authorization is missing its PKCE verifier.")]
	MissingVerifier,
	/// Token endpoint rejected the code or could not be reached.
	#[error("Authorization code exchange failed.")]
	TokenExchangeFailed(#[source] ProviderError),
	/// Profile endpoint failed or returned no user data.
	#[error("Profile lookup failed.")]
	ProfileFetchFailed {
		/// Transport or parsing failure, when the endpoint did not simply omit the user.
		#[source]
		source: Option<ProviderError>,
	},
	/// Pending-secret storage failed while saving or loading.
	#[error("Pending secret storage failed.")]
	Storage(#[from] crate::store::StoreError),
	/// The operating system random source could not be read.
	#[error("Secure random source is unavailable.")]
	EntropyUnavailable {
		/// Underlying random source failure.
		#[source]
		source: BoxError,
	},
}
impl Error {
	/// Wraps a random source failure.
	pub fn entropy_unavailable(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::EntropyUnavailable { source: Box::new(src) }
	}

	/// Client-facing classification of this error.
	pub fn kind(&self) -> FailureKind {
		match self {
			Error::ProviderMisconfigured(_) => FailureKind::ProviderMisconfigured,
			Error::AuthorizationDenied { .. } => FailureKind::AuthorizationDenied,
			Error::MissingParameters { .. } => FailureKind::MissingParameters,
			// A slot that cannot be read is indistinguishable from a lost one for the browser.
			Error::SessionExpired | Error::Storage(_) => FailureKind::SessionExpired,
			Error::StateMismatch => FailureKind::StateMismatch,
			Error::MissingVerifier => FailureKind::MissingVerifier,
			Error::TokenExchangeFailed(_) => FailureKind::TokenExchangeFailed,
			Error::ProfileFetchFailed { .. } => FailureKind::ProfileFetchFailed,
			Error::EntropyUnavailable { .. } => FailureKind::EntropyUnavailable,
		}
	}
}

/// Stable, client-safe failure tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
	/// Missing client credentials or invalid provider configuration.
	ProviderMisconfigured,
	/// User declined consent at the provider.
	AuthorizationDenied,
	/// Callback lacked `code` or `state`.
	MissingParameters,
	/// No pending secret for the session.
	SessionExpired,
	/// Possible CSRF attempt.
	StateMismatch,
	/// Pending secret had no verifier.
	MissingVerifier,
	/// Code exchange failed.
	TokenExchangeFailed,
	/// Profile lookup failed.
	ProfileFetchFailed,
	/// Random source failure.
	EntropyUnavailable,
}
impl FailureKind {
	/// Returns the snake_case tag used in redirects, JSON bodies, and metric labels.
	pub const fn as_str(self) -> &'static str {
		match self {
			FailureKind::ProviderMisconfigured => "provider_misconfigured",
			FailureKind::AuthorizationDenied => "authorization_denied",
			FailureKind::MissingParameters => "missing_parameters",
			FailureKind::SessionExpired => "session_expired",
			FailureKind::StateMismatch => "state_mismatch",
			FailureKind::MissingVerifier => "missing_verifier",
			FailureKind::TokenExchangeFailed => "token_exchange_failed",
			FailureKind::ProfileFetchFailed => "profile_fetch_failed",
			FailureKind::EntropyUnavailable => "entropy_unavailable",
		}
	}

	/// Generic human-readable message safe to show end users.
	pub const fn message(self) -> &'static str {
		match self {
			FailureKind::ProviderMisconfigured => "Sign-in is not configured on this server.",
			FailureKind::AuthorizationDenied => "Authorization was denied.",
			FailureKind::MissingParameters => "The sign-in response was incomplete.",
			FailureKind::SessionExpired => "Your sign-in session expired. Please try again.",
			FailureKind::StateMismatch => "The sign-in response could not be verified.",
			FailureKind::MissingVerifier => "Your sign-in session is incomplete. Please try again.",
			FailureKind::TokenExchangeFailed => "Sign-in could not be completed.",
			FailureKind::ProfileFetchFailed => "Your profile could not be loaded.",
			FailureKind::EntropyUnavailable => "Sign-in is temporarily unavailable.",
		}
	}
}
impl Display for FailureKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Configuration and validation failures; all surface as [`Error::ProviderMisconfigured`].
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// No client identifier is configured.
	#[error("Client credentials are not configured.")]
	MissingClientCredentials,
	/// The descriptor's client authentication method needs a secret that is absent.
	#[error("Client authentication method `{method}` requires a client secret.")]
	MissingClientSecret {
		/// Configured client authentication method.
		method: &'static str,
	},
	/// Provider descriptor failed validation.
	#[error(transparent)]
	InvalidDescriptor(#[from] ProviderDescriptorError),
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Application root URL cannot be parsed.
	#[error("Application root URL is invalid.")]
	InvalidAppRoot {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Pending secret lifetime is outside `(0, 600s]`.
	#[error("Pending secret lifetime must be positive and at most {max_secs} seconds.")]
	InvalidPendingTtl {
		/// Upper bound in seconds.
		max_secs: i64,
	},
	/// Custom cookie policy would keep pending secrets longer than the pending lifetime.
	#[error("Pending-secret cookie `Max-Age` must be positive and at most {max_secs} seconds.")]
	InvalidCookieMaxAge {
		/// Configured pending lifetime in seconds.
		max_secs: i64,
	},
	/// Requested scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] ScopeValidationError),
	/// Unknown provider mode string.
	#[error("Unknown provider mode `{value}`; expected `live` or `stub`.")]
	InvalidProviderMode {
		/// Rejected value.
		value: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures observed while talking to the provider's token or profile endpoints.
///
/// These are logged server-side and never echoed to the browser.
#[derive(Debug, ThisError)]
pub enum ProviderError {
	/// Endpoint answered with an OAuth error document.
	#[error("Provider returned an OAuth error: {error}.")]
	OAuth {
		/// OAuth `error` code.
		error: String,
		/// OAuth `error_description`, when supplied.
		description: Option<String>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Endpoint answered with something other than the expected document.
	#[error("Provider endpoint returned an unexpected response: {message}.")]
	Endpoint {
		/// Summary of the unexpected response.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Endpoint answered with malformed JSON.
	#[error("Provider endpoint returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// No usable client credentials were configured for the live provider.
	#[error("Client credentials are not configured.")]
	Unconfigured,
	/// The bounded request timeout elapsed.
	#[error("Request to the provider timed out.")]
	Timeout,
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
	/// Outgoing request could not be assembled.
	#[error("HTTP request could not be constructed.")]
	Request(#[from] oauth2::http::Error),
}
impl ProviderError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// HTTP status associated with the failure, when one was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			ProviderError::OAuth { status, .. }
			| ProviderError::Endpoint { status, .. }
			| ProviderError::ResponseParse { status, .. } => *status,
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn every_variant_maps_to_a_client_tag() {
		let cases = [
			(Error::from(ConfigError::MissingClientCredentials), "provider_misconfigured"),
			(Error::AuthorizationDenied { reason: "access_denied".into() }, "authorization_denied"),
			(Error::MissingParameters { parameter: "code" }, "missing_parameters"),
			(Error::SessionExpired, "session_expired"),
			(Error::StateMismatch, "state_mismatch"),
			(Error::MissingVerifier, "missing_verifier"),
			(Error::TokenExchangeFailed(ProviderError::Timeout), "token_exchange_failed"),
			(Error::ProfileFetchFailed { source: None }, "profile_fetch_failed"),
		];

		for (error, tag) in cases {
			assert_eq!(error.kind().as_str(), tag);
		}
	}

	#[test]
	fn provider_detail_stays_in_the_source_chain() {
		let error = Error::TokenExchangeFailed(ProviderError::OAuth {
			error: "invalid_grant".into(),
			description: Some("Value passed for the authorization code was invalid.".into()),
			status: Some(400),
		});

		assert!(!error.to_string().contains("invalid_grant"));
		assert!(!error.kind().message().contains("invalid_grant"));

		let source = StdError::source(&error).expect("Provider error should be the source.");

		assert!(source.to_string().contains("invalid_grant"));
	}

	#[test]
	fn storage_failures_surface_as_expired_sessions() {
		let error = Error::from(crate::store::StoreError::Backend { message: "poisoned".into() });

		assert_eq!(error.kind(), FailureKind::SessionExpired);
	}
}
