//! Storage contracts for pending authorization secrets.
//!
//! A [`PendingAuthSecret`] lives in exactly one [`SecretSlot`] per browser session. Starting a new
//! authorization overwrites the slot, so the last-initiated attempt always wins.

pub mod cookie;
pub mod memory;

pub use cookie::{CookieDirective, CookieSlot};
pub use memory::{MemorySlot, MemoryStore};

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Boxed future returned by [`SecretSlot`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Session-scoped slot holding at most one pending secret.
pub trait SecretSlot
where
	Self: Send + Sync,
{
	/// Persists the secret, replacing any earlier attempt.
	fn save(&self, secret: PendingAuthSecret) -> StoreFuture<'_, ()>;

	/// Returns the pending secret, or `None` when absent or expired.
	fn load(&self) -> StoreFuture<'_, Option<PendingAuthSecret>>;

	/// Removes the pending secret. Must be idempotent.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// CSRF state plus PKCE verifier awaiting the provider redirect.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAuthSecret {
	/// State token sent in the authorization URL.
	pub state: String,
	/// PKCE verifier; `None` models a slot that lost its verifier.
	pub code_verifier: Option<TokenSecret>,
	/// Absolute expiry; `None` when the transport enforces its own lifetime (cookie `Max-Age`).
	#[serde(default)]
	pub expires_at: Option<OffsetDateTime>,
}
impl PendingAuthSecret {
	/// Secret whose lifetime is bounded by the transport.
	pub fn new(state: impl Into<String>, code_verifier: Option<TokenSecret>) -> Self {
		Self { state: state.into(), code_verifier, expires_at: None }
	}

	/// Stamps an absolute expiry `ttl` after `now`.
	pub fn expiring(mut self, now: OffsetDateTime, ttl: Duration) -> Self {
		self.expires_at = Some(now + ttl);

		self
	}

	/// Returns true once `now` reaches the expiry instant.
	pub fn is_expired(&self, now: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|at| now >= at)
	}
}
impl Debug for PendingAuthSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PendingAuthSecret")
			.field("state", &"<redacted>")
			.field("code_verifier", &self.code_verifier)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Error type produced by [`SecretSlot`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Stored secret could not be encoded or decoded.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn store_error_is_the_source_of_the_flow_error() {
		let store_error = StoreError::Backend { message: "cookie jar unavailable".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));

		let source =
			StdError::source(&error).expect("Flow error should expose the store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn expiry_is_inclusive() {
		let now = OffsetDateTime::now_utc();
		let secret = PendingAuthSecret::new("s", None).expiring(now, Duration::seconds(600));

		assert!(!secret.is_expired(now + Duration::seconds(599)));
		assert!(secret.is_expired(now + Duration::seconds(600)));
		assert!(!PendingAuthSecret::new("s", None).is_expired(now + Duration::days(1)));
	}

	#[test]
	fn debug_hides_both_secrets() {
		let secret = PendingAuthSecret::new("state-value", Some(TokenSecret::new("verifier-value")));
		let rendered = format!("{secret:?}");

		assert!(!rendered.contains("state-value"));
		assert!(!rendered.contains("verifier-value"));
	}
}
