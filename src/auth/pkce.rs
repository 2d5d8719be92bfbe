//! CSRF state and PKCE (RFC 7636) material for a single authorization attempt.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::TokenSecret};

/// Raw bytes drawn for the CSRF state (43 URL-safe characters once encoded).
pub const STATE_ENTROPY_BYTES: usize = 32;
/// Raw bytes drawn for the PKCE verifier (43 URL-safe characters once encoded).
pub const PKCE_VERIFIER_ENTROPY_BYTES: usize = 32;

/// Supported PKCE challenge methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

/// PKCE verifier plus its derived challenge.
#[derive(Clone)]
pub struct PkcePair {
	verifier: TokenSecret,
	challenge: String,
	method: PkceCodeChallengeMethod,
}
impl PkcePair {
	/// Draws a fresh verifier from the operating system random source.
	pub fn generate() -> Result<Self> {
		Ok(Self::from_verifier(random_token(PKCE_VERIFIER_ENTROPY_BYTES)?))
	}

	/// Rebuilds the pair from a known verifier; the challenge is recomputed.
	pub fn from_verifier(verifier: impl Into<String>) -> Self {
		let verifier = verifier.into();
		let challenge = compute_pkce_challenge(&verifier);

		Self { verifier: TokenSecret::new(verifier), challenge, method: PkceCodeChallengeMethod::S256 }
	}

	/// Secret verifier that must stay server-side (or in an HTTP-only cookie).
	pub fn verifier(&self) -> &TokenSecret {
		&self.verifier
	}

	/// Challenge sent with the authorization request.
	pub fn challenge(&self) -> &str {
		&self.challenge
	}

	/// Challenge method (currently always `S256`).
	pub fn method(&self) -> PkceCodeChallengeMethod {
		self.method
	}
}
impl Debug for PkcePair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PkcePair")
			.field("verifier", &self.verifier)
			.field("challenge", &self.challenge)
			.field("method", &self.method)
			.finish()
	}
}

/// State token and PKCE pair generated for one call to begin an authorization.
#[derive(Clone, Debug)]
pub struct AuthorizationRequest {
	/// Opaque CSRF token that must round-trip through the provider redirect.
	pub state: String,
	/// PKCE pair; the verifier never leaves the server side of the flow.
	pub pkce: PkcePair,
}
impl AuthorizationRequest {
	/// Generates independent state and verifier values.
	pub fn generate() -> Result<Self> {
		let state = generate_state()?;
		let pkce = generate_pkce()?;

		Ok(Self { state, pkce })
	}

	/// PKCE code challenge derived from the verifier.
	pub fn code_challenge(&self) -> &str {
		self.pkce.challenge()
	}

	/// PKCE code verifier.
	pub fn code_verifier(&self) -> &TokenSecret {
		self.pkce.verifier()
	}
}

/// Generates a CSRF state token, drawn separately from any PKCE verifier.
pub fn generate_state() -> Result<String> {
	random_token(STATE_ENTROPY_BYTES)
}

/// Generates a PKCE verifier and its S256 challenge.
pub fn generate_pkce() -> Result<PkcePair> {
	PkcePair::generate()
}

/// `base64url(sha256(verifier))` without padding.
pub fn compute_pkce_challenge(verifier: &str) -> String {
	let mut hasher = Sha256::new();

	hasher.update(verifier.as_bytes());

	let digest = hasher.finalize();

	URL_SAFE_NO_PAD.encode(digest)
}

pub(crate) fn random_token(len: usize) -> Result<String> {
	let mut buf = vec![0_u8; len];

	OsRng.try_fill_bytes(&mut buf).map_err(Error::entropy_unavailable)?;

	Ok(URL_SAFE_NO_PAD.encode(buf))
}
