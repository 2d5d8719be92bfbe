//! Callback Verifier: validates the provider redirect, exchanges the code, and loads the profile.
//!
//! One callback walks `awaiting_params -> state_checked -> verifier_present -> exchanging` and
//! ends in either `complete` or `failed`. Whatever the ending, the pending secret is cleared
//! exactly once afterwards, so a replayed redirect always lands on `SessionExpired`.

// crates.io
use subtle::ConstantTimeEq;
// self
use crate::{
	_prelude::*,
	auth::{AuthenticatedProfile, TokenSecret},
	flows::Authenticator,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::SecretSlot,
};

const KIND: FlowKind = FlowKind::Callback;

/// Raw query parameters of a provider redirect.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackQuery {
	/// Authorization code.
	#[serde(default)]
	pub code: Option<String>,
	/// Echoed CSRF state.
	#[serde(default)]
	pub state: Option<String>,
	/// Provider error, e.g. `access_denied`.
	#[serde(default)]
	pub error: Option<String>,
	/// Optional human-readable provider error detail.
	#[serde(default)]
	pub error_description: Option<String>,
}
impl CallbackQuery {
	/// Collects the recognized parameters from a redirect URL.
	pub fn from_url(url: &Url) -> Self {
		url.query().map(Self::parse).unwrap_or_default()
	}

	/// Parses a raw `application/x-www-form-urlencoded` query; the first occurrence of a key wins.
	pub fn parse(raw: &str) -> Self {
		let mut query = Self::default();

		for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
			let slot = match key.as_ref() {
				"code" => &mut query.code,
				"state" => &mut query.state,
				"error" => &mut query.error,
				"error_description" => &mut query.error_description,
				_ => continue,
			};

			slot.get_or_insert_with(|| value.into_owned());
		}

		query
	}
}

/// Validated shape of a redirect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackParams {
	/// The provider issued a code.
	Code {
		/// Authorization code.
		code: String,
		/// Echoed CSRF state.
		state: String,
	},
	/// The provider reported an error instead.
	Denied {
		/// Provider `error` value.
		error: String,
	},
}
impl TryFrom<CallbackQuery> for CallbackParams {
	type Error = Error;

	fn try_from(query: CallbackQuery) -> Result<Self> {
		if let Some(error) = non_empty(query.error) {
			return Ok(Self::Denied { error });
		}

		let code = non_empty(query.code).ok_or(Error::MissingParameters { parameter: "code" })?;
		let state = non_empty(query.state).ok_or(Error::MissingParameters { parameter: "state" })?;

		Ok(Self::Code { code, state })
	}
}

/// Position of a callback in its state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackStage {
	/// Reading `code`, `state`, and `error` from the redirect.
	AwaitingParams,
	/// The returned state matched the pending secret.
	StateChecked,
	/// A non-empty verifier was found.
	VerifierPresent,
	/// Token and profile requests are in flight.
	Exchanging,
	/// Profile assembled.
	Complete,
	/// Terminal failure.
	Failed,
}
impl CallbackStage {
	/// Stable label for span and log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallbackStage::AwaitingParams => "awaiting_params",
			CallbackStage::StateChecked => "state_checked",
			CallbackStage::VerifierPresent => "verifier_present",
			CallbackStage::Exchanging => "exchanging",
			CallbackStage::Complete => "complete",
			CallbackStage::Failed => "failed",
		}
	}
}
impl Display for CallbackStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

impl Authenticator {
	/// Verifies a provider redirect against the secret in `slot` and returns the signed-in user.
	///
	/// The slot is cleared before this returns on every path, successful or not. Provider
	/// failures keep their source chain for server logs; callers should only surface
	/// [`Error::kind`] to the browser.
	pub async fn complete_authorization(
		&self,
		slot: &dyn SecretSlot,
		query: CallbackQuery,
	) -> Result<AuthenticatedProfile> {
		let span = FlowSpan::new(KIND, CallbackStage::AwaitingParams.as_str());

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let mut stage = CallbackStage::AwaitingParams;
				let result = self.verify_callback(slot, query, &mut stage).await;

				self.clear_pending_auth_secret(slot).await;

				if let Err(e) = &result {
					obs::log_failure(KIND, stage.as_str(), e);
				}

				result
			})
			.await;

		match &result {
			Ok(_) => {
				span.record_stage(CallbackStage::Complete.as_str());
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
			},
			Err(e) => {
				span.record_stage(CallbackStage::Failed.as_str());
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				obs::record_failure_kind(e.kind());
			},
		}

		result
	}

	/// Removes the pending secret; storage failures are logged and swallowed.
	pub async fn clear_pending_auth_secret(&self, slot: &dyn SecretSlot) {
		if let Err(e) = slot.clear().await {
			obs::log_failure(KIND, "clear_pending_auth_secret", &e);
		}
	}

	async fn verify_callback(
		&self,
		slot: &dyn SecretSlot,
		query: CallbackQuery,
		stage: &mut CallbackStage,
	) -> Result<AuthenticatedProfile> {
		let (code, state) = match CallbackParams::try_from(query)? {
			CallbackParams::Code { code, state } => (code, state),
			CallbackParams::Denied { error } =>
				return Err(Error::AuthorizationDenied { reason: error }),
		};
		let pending = slot
			.load()
			.await?
			.filter(|pending| !pending.is_expired(OffsetDateTime::now_utc()))
			.ok_or(Error::SessionExpired)?;

		if !states_match(&pending.state, &state) {
			return Err(Error::StateMismatch);
		}

		*stage = CallbackStage::StateChecked;

		let verifier: TokenSecret =
			pending.code_verifier.filter(|v| !v.is_empty()).ok_or(Error::MissingVerifier)?;

		*stage = CallbackStage::VerifierPresent;

		// The client identifier is part of the exchange, so a missing one fails before any request.
		self.provider.client_credentials()?;

		*stage = CallbackStage::Exchanging;

		let grant = self
			.provider
			.exchange_code(&code, &verifier, &self.config.redirect_uri)
			.await
			.map_err(Error::TokenExchangeFailed)?;
		let profile = self
			.provider
			.fetch_profile(&grant)
			.await
			.map_err(|e| Error::ProfileFetchFailed { source: Some(e) })?
			.ok_or(Error::ProfileFetchFailed { source: None })?;

		Ok(AuthenticatedProfile::assemble(profile, grant))
	}
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.filter(|v| !v.is_empty())
}

fn states_match(expected: &str, returned: &str) -> bool {
	!expected.is_empty() && bool::from(expected.as_bytes().ct_eq(returned.as_bytes()))
}
