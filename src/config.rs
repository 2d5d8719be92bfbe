//! Process-wide configuration, built once at startup and injected into the [`Authenticator`].
//!
//! Nothing here is consulted ad hoc mid-request: [`AuthConfig::from_env`] reads the environment a
//! single time and every flow receives the resulting value through an `Arc`.
//!
//! [`Authenticator`]: crate::flows::Authenticator

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret},
	error::ConfigError,
	provider::{ClientAuthMethod, ProviderDescriptor},
};

/// Upper bound for how long a pending secret may live.
pub const MAX_PENDING_TTL: Duration = Duration::seconds(600);
/// Default bound for provider HTTP calls.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::seconds(10);
/// Default application root when none is configured.
pub const DEFAULT_APP_BASE_URL: &str = "http://localhost:3000";
/// Scopes requested when none are configured.
pub const DEFAULT_SCOPES: [&str; 2] = ["tweet.read", "users.read"];
/// Callback path appended to the application root to form the default redirect URI.
pub const CALLBACK_PATH: &str = "/callback";

/// OAuth client identifier plus optional secret.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientCredentials {
	/// Public client identifier.
	pub client_id: String,
	/// Confidential client secret.
	pub client_secret: Option<TokenSecret>,
}
impl ClientCredentials {
	/// Credentials for a client identifier without a secret.
	pub fn new(client_id: impl Into<String>) -> Self {
		Self { client_id: client_id.into(), client_secret: None }
	}

	/// Attaches the client secret.
	pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(TokenSecret::new(secret));

		self
	}
}

/// Attributes of the two pending-secret cookies.
///
/// `HttpOnly` and `SameSite=Lax` are not configurable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookiePolicy {
	/// Name of the cookie carrying the CSRF state.
	pub state_cookie: String,
	/// Name of the cookie carrying the PKCE verifier.
	pub verifier_cookie: String,
	/// Cookie `Path` attribute.
	pub path: String,
	/// Whether to emit the `Secure` attribute.
	pub secure: bool,
	/// Cookie `Max-Age`.
	pub max_age: Duration,
}
impl CookiePolicy {
	/// Policy for an application served from `app_root`; `Secure` iff the root is HTTPS.
	pub fn for_app_root(app_root: &Url, max_age: Duration) -> Self {
		Self { secure: app_root.scheme() == "https", max_age, ..Default::default() }
	}
}
impl Default for CookiePolicy {
	fn default() -> Self {
		Self {
			state_cookie: "oauth_state".into(),
			verifier_cookie: "oauth_code_verifier".into(),
			path: "/".into(),
			secure: true,
			max_age: MAX_PENDING_TTL,
		}
	}
}

/// Which [`AuthProvider`](crate::provider::AuthProvider) backs the flows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderMode {
	/// Real provider over HTTPS.
	#[default]
	Live,
	/// Canned identity for local development.
	Stub,
}
impl ProviderMode {
	/// Stable label for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			ProviderMode::Live => "live",
			ProviderMode::Stub => "stub",
		}
	}
}
impl FromStr for ProviderMode {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"live" => Ok(ProviderMode::Live),
			"stub" => Ok(ProviderMode::Stub),
			_ => Err(ConfigError::InvalidProviderMode { value: s.to_owned() }),
		}
	}
}

/// Immutable settings shared by every authorization attempt.
#[derive(Clone, Debug)]
pub struct AuthConfig {
	/// Provider endpoints and quirks.
	pub descriptor: ProviderDescriptor,
	/// Client credentials; `None` surfaces as `ProviderMisconfigured` on first use.
	pub client: Option<ClientCredentials>,
	/// Redirect URI registered with the provider.
	pub redirect_uri: Url,
	/// Application page the callback redirects back to.
	pub app_root: Url,
	/// Scopes requested in the authorize URL.
	pub scope: ScopeSet,
	/// Lifetime of a pending secret, within `(0, 600s]`.
	pub pending_ttl: Duration,
	/// Bound applied to each token or profile request.
	pub http_timeout: Duration,
	/// Attributes of the pending-secret cookies.
	pub cookies: CookiePolicy,
	/// Provider capability selected at startup.
	pub mode: ProviderMode,
	/// Username presented by the stub provider.
	pub stub_username: String,
}
impl AuthConfig {
	/// Creates a builder for the given provider.
	pub fn builder(descriptor: ProviderDescriptor) -> AuthConfigBuilder {
		AuthConfigBuilder::new(descriptor)
	}

	/// Reads configuration from the process environment.
	///
	/// | Variable | Meaning |
	/// | --- | --- |
	/// | `TWITTER_CLIENT_ID` / `TWITTER_CLIENT_SECRET` | Client credentials (optional at startup). |
	/// | `APP_BASE_URL` (or `NEXTAUTH_URL`) | Application root, default `http://localhost:3000`. |
	/// | `GUILD_AUTH_REDIRECT_URI` | Redirect URI, default `{APP_BASE_URL}/callback`. |
	/// | `GUILD_AUTH_SCOPES` | Space- or comma-separated scopes. |
	/// | `GUILD_AUTH_PROVIDER` | `live` (default) or `stub`. |
	/// | `GUILD_AUTH_STUB_USERNAME` | Username presented by the stub provider. |
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Same as [`from_env`](Self::from_env) but reading from an arbitrary lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let read = |key: &str| {
			lookup(key).map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
		};
		let app_root = read("APP_BASE_URL")
			.or_else(|| read("NEXTAUTH_URL"))
			.unwrap_or_else(|| DEFAULT_APP_BASE_URL.to_owned());
		let app_root =
			Url::parse(&app_root).map_err(|source| ConfigError::InvalidAppRoot { source })?;
		let redirect_uri = match read("GUILD_AUTH_REDIRECT_URI") {
			Some(raw) => Url::parse(&raw),
			None => app_root.join(CALLBACK_PATH),
		}
		.map_err(|source| ConfigError::InvalidRedirect { source })?;
		let mut builder = AuthConfig::builder(ProviderDescriptor::x()?)
			.redirect_uri(redirect_uri)
			.app_root(app_root);

		if let Some(client_id) = read("TWITTER_CLIENT_ID") {
			let mut client = ClientCredentials::new(client_id);

			if let Some(secret) = read("TWITTER_CLIENT_SECRET") {
				client = client.with_secret(secret);
			}

			builder = builder.client(client);
		}
		if let Some(scopes) = read("GUILD_AUTH_SCOPES") {
			builder = builder.scope(scopes.parse::<ScopeSet>()?);
		}
		if let Some(mode) = read("GUILD_AUTH_PROVIDER") {
			builder = builder.mode(mode.parse::<ProviderMode>()?);
		}
		if let Some(username) = read("GUILD_AUTH_STUB_USERNAME") {
			builder = builder.stub_username(username);
		}

		builder.build()
	}

	/// Validates that the configured credentials satisfy the descriptor's auth method.
	pub fn client_credentials(&self) -> Result<&ClientCredentials, ConfigError> {
		usable_credentials(self.client.as_ref(), self.descriptor.preferred_client_auth_method)
	}
}

/// Builder for [`AuthConfig`].
#[derive(Debug)]
pub struct AuthConfigBuilder {
	descriptor: ProviderDescriptor,
	client: Option<ClientCredentials>,
	redirect_uri: Option<Url>,
	app_root: Option<Url>,
	scope: Option<ScopeSet>,
	pending_ttl: Duration,
	http_timeout: Duration,
	cookies: Option<CookiePolicy>,
	mode: ProviderMode,
	stub_username: String,
}
impl AuthConfigBuilder {
	fn new(descriptor: ProviderDescriptor) -> Self {
		Self {
			descriptor,
			client: None,
			redirect_uri: None,
			app_root: None,
			scope: None,
			pending_ttl: MAX_PENDING_TTL,
			http_timeout: DEFAULT_HTTP_TIMEOUT,
			cookies: None,
			mode: ProviderMode::default(),
			stub_username: "aztecguild".into(),
		}
	}

	/// Sets the client credentials.
	pub fn client(mut self, client: ClientCredentials) -> Self {
		self.client = Some(client);

		self
	}

	/// Sets the redirect URI registered with the provider.
	pub fn redirect_uri(mut self, url: Url) -> Self {
		self.redirect_uri = Some(url);

		self
	}

	/// Sets the application root the callback returns to.
	pub fn app_root(mut self, url: Url) -> Self {
		self.app_root = Some(url);

		self
	}

	/// Overrides the requested scopes.
	pub fn scope(mut self, scope: ScopeSet) -> Self {
		self.scope = Some(scope);

		self
	}

	/// Overrides the pending secret lifetime.
	pub fn pending_ttl(mut self, ttl: Duration) -> Self {
		self.pending_ttl = ttl;

		self
	}

	/// Overrides the provider request timeout.
	pub fn http_timeout(mut self, timeout: Duration) -> Self {
		self.http_timeout = timeout;

		self
	}

	/// Overrides the cookie policy derived from the application root.
	pub fn cookies(mut self, policy: CookiePolicy) -> Self {
		self.cookies = Some(policy);

		self
	}

	/// Selects the provider capability.
	pub fn mode(mut self, mode: ProviderMode) -> Self {
		self.mode = mode;

		self
	}

	/// Username the stub provider signs in as.
	pub fn stub_username(mut self, username: impl Into<String>) -> Self {
		self.stub_username = username.into();

		self
	}

	/// Validates and assembles the configuration.
	pub fn build(self) -> Result<AuthConfig, ConfigError> {
		if !self.pending_ttl.is_positive() || self.pending_ttl > MAX_PENDING_TTL {
			return Err(ConfigError::InvalidPendingTtl {
				max_secs: MAX_PENDING_TTL.whole_seconds(),
			});
		}

		let app_root = match self.app_root {
			Some(url) => url,
			None => Url::parse(DEFAULT_APP_BASE_URL)
				.map_err(|source| ConfigError::InvalidAppRoot { source })?,
		};
		let redirect_uri = match self.redirect_uri {
			Some(url) => url,
			None => app_root
				.join(CALLBACK_PATH)
				.map_err(|source| ConfigError::InvalidRedirect { source })?,
		};
		let scope = match self.scope {
			Some(scope) => scope,
			None => ScopeSet::new(DEFAULT_SCOPES)?,
		};
		let cookies = self
			.cookies
			.unwrap_or_else(|| CookiePolicy::for_app_root(&app_root, self.pending_ttl));

		// `Max-Age` is the effective lifetime of a cookie-held secret.
		if !cookies.max_age.is_positive() || cookies.max_age > self.pending_ttl {
			return Err(ConfigError::InvalidCookieMaxAge {
				max_secs: self.pending_ttl.whole_seconds(),
			});
		}

		Ok(AuthConfig {
			descriptor: self.descriptor,
			client: self.client,
			redirect_uri,
			app_root,
			scope,
			pending_ttl: self.pending_ttl,
			http_timeout: self.http_timeout,
			cookies,
			mode: self.mode,
			stub_username: self.stub_username,
		})
	}
}

pub(crate) fn usable_credentials(
	client: Option<&ClientCredentials>,
	method: ClientAuthMethod,
) -> Result<&ClientCredentials, ConfigError> {
	let client = client.ok_or(ConfigError::MissingClientCredentials)?;

	if client.client_id.is_empty() {
		return Err(ConfigError::MissingClientCredentials);
	}
	if method.requires_secret() && client.client_secret.as_ref().is_none_or(TokenSecret::is_empty)
	{
		return Err(ConfigError::MissingClientSecret { method: method.as_str() });
	}

	Ok(client)
}
