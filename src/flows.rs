//! Sign-in flow orchestration.
//!
//! [`Authenticator`] issues authorization URLs ([`Authenticator::begin_authorization`]) and
//! verifies provider redirects ([`Authenticator::complete_authorization`]). Pending secrets live
//! in a caller-supplied [`SecretSlot`](crate::store::SecretSlot), so the same flows run over
//! cookies or a server-side store.

pub mod authorize;
pub mod callback;

pub use authorize::*;
pub use callback::*;

// self
use crate::{_prelude::*, config::AuthConfig, provider::AuthProvider};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, provider};

/// Coordinates the authorization code + PKCE flow against one provider.
#[derive(Clone)]
pub struct Authenticator {
	/// Configuration injected at process start.
	pub config: Arc<AuthConfig>,
	/// Live or stub provider selected by configuration.
	pub provider: Arc<dyn AuthProvider>,
}
impl Authenticator {
	/// Creates an authenticator from explicit parts.
	pub fn new(config: Arc<AuthConfig>, provider: Arc<dyn AuthProvider>) -> Self {
		Self { config, provider }
	}

	/// Creates an authenticator whose provider follows [`AuthConfig::mode`].
	#[cfg(feature = "reqwest")]
	pub fn from_config(config: AuthConfig) -> Result<Self, ConfigError> {
		let provider = provider::provider_from_config(&config)?;

		Ok(Self::new(Arc::new(config), provider))
	}
}
impl Debug for Authenticator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Authenticator")
			.field("provider", &self.config.descriptor.id)
			.field("mode", &self.provider.mode())
			.field("redirect_uri", &self.config.redirect_uri.as_str())
			.finish()
	}
}
