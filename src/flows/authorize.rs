//! Authorization Initiator: state + PKCE generation, authorize URL, pending secret.

// self
use crate::{
	_prelude::*,
	auth::{AuthorizationRequest, ScopeSet},
	flows::Authenticator,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::{PendingAuthSecret, SecretSlot},
};

/// What the browser needs to start the provider round-trip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationStart {
	/// Provider URL to redirect the browser to.
	pub authorization_url: Url,
	/// CSRF state embedded in the URL.
	pub state: String,
}

impl Authenticator {
	/// Starts an authorization attempt, saving its secrets into `slot` before returning the URL.
	///
	/// Any earlier attempt in the same slot is overwritten.
	pub async fn begin_authorization(&self, slot: &dyn SecretSlot) -> Result<AuthorizationStart> {
		const KIND: FlowKind = FlowKind::Authorize;

		let span = FlowSpan::new(KIND, "begin_authorization");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.start_attempt(slot)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(e) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				obs::record_failure_kind(e.kind());
				obs::log_failure(KIND, "begin_authorization", e);
			},
		}

		result
	}

	async fn start_attempt(&self, slot: &dyn SecretSlot) -> Result<AuthorizationStart> {
		let client_id = self.provider.client_credentials()?.client_id.clone();
		let request = AuthorizationRequest::generate()?;
		let authorization_url = build_authorization_url(
			self.provider.authorization_endpoint(),
			&client_id,
			&self.config.redirect_uri,
			&self.config.scope,
			self.config.descriptor.quirks.scope_delimiter,
			&request,
		);
		let secret =
			PendingAuthSecret::new(request.state.clone(), Some(request.code_verifier().clone()))
				.expiring(OffsetDateTime::now_utc(), self.config.pending_ttl);

		slot.save(secret).await?;

		Ok(AuthorizationStart { authorization_url, state: request.state })
	}
}

fn build_authorization_url(
	endpoint: &Url,
	client_id: &str,
	redirect_uri: &Url,
	scope: &ScopeSet,
	scope_delimiter: char,
	request: &AuthorizationRequest,
) -> Url {
	let mut url = endpoint.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", client_id);
	pairs.append_pair("redirect_uri", redirect_uri.as_str());

	if let Some(scope_value) = scope.join(scope_delimiter) {
		pairs.append_pair("scope", &scope_value);
	}

	pairs.append_pair("state", &request.state);
	pairs.append_pair("code_challenge", request.code_challenge());
	pairs.append_pair("code_challenge_method", request.pkce.method().as_str());

	drop(pairs);

	url
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		auth::{PkcePair, SessionId},
		config::{AuthConfig, ProviderMode},
		provider::{ProviderDescriptor, StubProvider},
		store::MemoryStore,
	};

	#[test]
	fn authorize_url_carries_every_parameter() {
		let endpoint =
			Url::parse("https://twitter.com/i/oauth2/authorize").expect("Endpoint should parse.");
		let redirect =
			Url::parse("https://guild.example.com/callback").expect("Redirect should parse.");
		let request = AuthorizationRequest {
			state: "S1".into(),
			pkce: PkcePair::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
		};
		let scope = ScopeSet::new(["users.read", "tweet.read"]).expect("Scope should be valid.");
		let url = build_authorization_url(&endpoint, "client", &redirect, &scope, ' ', &request);
		let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();

		assert_eq!(pairs["response_type"], "code");
		assert_eq!(pairs["client_id"], "client");
		assert_eq!(pairs["redirect_uri"], "https://guild.example.com/callback");
		assert_eq!(pairs["scope"], "tweet.read users.read");
		assert_eq!(pairs["state"], "S1");
		assert_eq!(pairs["code_challenge"], "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
		assert_eq!(pairs["code_challenge_method"], "S256");
		assert!(!pairs.values().any(|value| value.contains("dBjftJeZ")), "Verifier must stay private.");
	}

	#[test]
	fn empty_scope_is_omitted() {
		let endpoint = Url::parse("https://example.com/auth?code=preset").expect("Endpoint should parse.");
		let redirect = Url::parse("https://example.com/cb").expect("Redirect should parse.");
		let request = AuthorizationRequest::generate().expect("OS random source should work.");
		let url =
			build_authorization_url(&endpoint, "client", &redirect, &ScopeSet::default(), ' ', &request);

		assert!(url.query_pairs().all(|(key, _)| key != "scope"));
		assert_eq!(
			url.query_pairs().find(|(key, _)| key == "code").map(|(_, value)| value.into_owned()),
			Some("preset".into()),
			"Existing endpoint query parameters must survive."
		);
	}

	#[tokio::test]
	async fn begin_authorization_saves_the_secret_behind_the_url() {
		let config = AuthConfig::builder(ProviderDescriptor::x().expect("X descriptor should build."))
			.mode(ProviderMode::Stub)
			.build()
			.expect("Stub configuration should build.");
		let provider = StubProvider::from_config(&config);
		let authenticator = Authenticator::new(Arc::new(config), Arc::new(provider));
		let store = MemoryStore::default();
		let slot = store.slot(SessionId::new("browser-1").expect("Session id should be valid."));
		let start =
			authenticator.begin_authorization(&slot).await.expect("Authorization should start.");
		let pending = slot
			.load()
			.await
			.expect("Memory slot should load.")
			.expect("Pending secret should be saved before the URL is returned.");
		let verifier =
			pending.code_verifier.expect("Pending secret should carry a verifier.");
		let pairs: HashMap<_, _> = start.authorization_url.query_pairs().into_owned().collect();

		assert_eq!(pending.state, start.state);
		assert_eq!(pairs["state"], start.state);
		assert_eq!(pairs["code_challenge"], crate::auth::compute_pkce_challenge(verifier.expose()));
	}
}
