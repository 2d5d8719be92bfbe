//! Request-scoped secret slot carried by the browser's cookie jar.
//!
//! The slot reads the incoming `Cookie` header once and records every mutation as a
//! [`CookieDirective`] that the HTTP layer turns into `Set-Cookie` headers. Both cookies are always
//! `HttpOnly` and `SameSite=Lax`; `Secure` follows [`CookiePolicy::secure`].

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::CookiePolicy,
	store::{PendingAuthSecret, SecretSlot, StoreFuture},
};

/// One `Set-Cookie` instruction produced by a [`CookieSlot`].
#[derive(Clone, PartialEq, Eq)]
pub struct CookieDirective {
	name: String,
	value: String,
	max_age: Duration,
	path: String,
	secure: bool,
}
impl CookieDirective {
	/// Cookie name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Returns true when the directive deletes the cookie.
	pub fn is_removal(&self) -> bool {
		self.max_age <= Duration::ZERO
	}

	/// Cookie lifetime in whole seconds.
	pub fn max_age(&self) -> Duration {
		self.max_age
	}
}
impl Display for CookieDirective {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(
			f,
			"{}={}; Path={}; Max-Age={}; HttpOnly; SameSite=Lax",
			self.name,
			self.value,
			self.path,
			self.max_age.whole_seconds().max(0)
		)?;

		if self.secure {
			f.write_str("; Secure")?;
		}

		Ok(())
	}
}
impl Debug for CookieDirective {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CookieDirective")
			.field("name", &self.name)
			.field("value", &"<redacted>")
			.field("max_age", &self.max_age)
			.field("secure", &self.secure)
			.finish()
	}
}

/// [`SecretSlot`] backed by the `state` and `code_verifier` cookies of one request.
#[derive(Debug)]
pub struct CookieSlot {
	policy: CookiePolicy,
	current: Mutex<Option<PendingAuthSecret>>,
	directives: Mutex<Vec<CookieDirective>>,
}
impl CookieSlot {
	/// Builds a slot from the request's raw `Cookie` header, if any.
	pub fn from_header(policy: CookiePolicy, header: Option<&str>) -> Self {
		let current = header.and_then(|raw| {
			let state = find_cookie(raw, &policy.state_cookie)?;
			let verifier = find_cookie(raw, &policy.verifier_cookie).map(TokenSecret::new);

			Some(PendingAuthSecret::new(state, verifier))
		});

		Self { policy, current: Mutex::new(current), directives: Default::default() }
	}

	/// Slot for a request that carried no cookies.
	pub fn empty(policy: CookiePolicy) -> Self {
		Self::from_header(policy, None)
	}

	/// Drains the `Set-Cookie` directives recorded so far.
	pub fn take_directives(&self) -> Vec<CookieDirective> {
		std::mem::take(&mut *self.directives.lock())
	}

	/// Renders the recorded directives as `Set-Cookie` header values.
	pub fn set_cookie_headers(&self) -> Vec<String> {
		self.directives.lock().iter().map(ToString::to_string).collect()
	}

	fn record(&self, name: &str, value: &str, max_age: Duration) {
		let mut directives = self.directives.lock();

		// Only the last instruction per cookie matters to the browser.
		directives.retain(|directive| directive.name != name);
		directives.push(CookieDirective {
			name: name.to_owned(),
			value: value.to_owned(),
			max_age,
			path: self.policy.path.clone(),
			secure: self.policy.secure,
		});
	}

	fn expire(&self, name: &str) {
		self.record(name, "", Duration::ZERO);
	}
}
impl SecretSlot for CookieSlot {
	fn save(&self, secret: PendingAuthSecret) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.record(&self.policy.state_cookie, &secret.state, self.policy.max_age);

			match &secret.code_verifier {
				Some(verifier) =>
					self.record(&self.policy.verifier_cookie, verifier.expose(), self.policy.max_age),
				None => self.expire(&self.policy.verifier_cookie),
			}

			*self.current.lock() = Some(secret);

			Ok(())
		})
	}

	fn load(&self) -> StoreFuture<'_, Option<PendingAuthSecret>> {
		Box::pin(async move { Ok(self.current.lock().clone()) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.expire(&self.policy.state_cookie);
			self.expire(&self.policy.verifier_cookie);

			*self.current.lock() = None;

			Ok(())
		})
	}
}

fn find_cookie(header: &str, name: &str) -> Option<String> {
	header
		.split(';')
		.filter_map(|pair| pair.trim().split_once('='))
		.find(|(key, _)| key.trim() == name)
		.map(|(_, value)| value.trim().trim_matches('"').to_owned())
		.filter(|value| !value.is_empty())
}
