//! Validated identifiers for browser sessions and provider descriptors.
//!
//! Session ids may travel in a cookie, so they are limited to the unreserved URL alphabet.
//! Provider ids appear in logs and metric labels and are limited to lowercase slugs.

// std
use std::ops::Deref;
// self
use crate::{_prelude::*, auth::pkce};

/// Raw bytes drawn by [`SessionId::generate`].
pub const SESSION_ID_ENTROPY_BYTES: usize = 32;

/// Rejected identifier input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// Nothing was supplied.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// `Session` or `Provider`.
		kind: &'static str,
	},
	/// Input longer than the kind allows.
	#[error("{kind} identifier exceeds {max} bytes.")]
	TooLong {
		/// `Session` or `Provider`.
		kind: &'static str,
		/// Limit for this kind.
		max: usize,
	},
	/// Input contains a character outside the kind's alphabet.
	#[error("{kind} identifier contains the disallowed character {character:?}.")]
	InvalidCharacter {
		/// `Session` or `Provider`.
		kind: &'static str,
		/// First offending character.
		character: char,
	},
}

macro_rules! identifier {
	($(#[$meta:meta])* $name:ident, $kind:literal, max = $max:expr, allowed = $allowed:expr) => {
		$(#[$meta])*
		#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Validates and wraps `value`.
			pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
				let value = value.into();

				check($kind, &value, $max, $allowed)?;

				Ok(Self(value))
			}

			/// Borrowed string form.
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::new(value)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

identifier! {
	/// Browser session owning at most one pending authorization.
	SessionId, "Session", max = 128, allowed = is_unreserved
}
identifier! {
	/// Slug naming an OAuth provider descriptor, e.g. `x-com`.
	ProviderId, "Provider", max = 64, allowed = is_slug
}

impl SessionId {
	/// Draws a fresh session id from the operating system random source.
	pub fn generate() -> Result<Self> {
		Ok(Self(pkce::random_token(SESSION_ID_ENTROPY_BYTES)?))
	}
}

fn is_unreserved(c: char) -> bool {
	c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~')
}

fn is_slug(c: char) -> bool {
	c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'
}

fn check(
	kind: &'static str,
	value: &str,
	max: usize,
	allowed: fn(char) -> bool,
) -> Result<(), IdentifierError> {
	if value.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if value.len() > max {
		return Err(IdentifierError::TooLong { kind, max });
	}
	if let Some(character) = value.chars().find(|c| !allowed(*c)) {
		return Err(IdentifierError::InvalidCharacter { kind, character });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn session_ids_use_the_cookie_safe_alphabet() {
		assert!(SessionId::new("browser-1.a_b~c").is_ok());
		assert_eq!(
			SessionId::new("a;b").expect_err("Separators must be rejected."),
			IdentifierError::InvalidCharacter { kind: "Session", character: ';' }
		);
		assert_eq!(
			SessionId::new("").expect_err("Empty ids must be rejected."),
			IdentifierError::Empty { kind: "Session" }
		);
		assert!(SessionId::new("s".repeat(129)).is_err());
	}

	#[test]
	fn provider_ids_are_lowercase_slugs() {
		assert!(ProviderId::new("x-com").is_ok());
		assert!(ProviderId::new("X").is_err());
		assert!(ProviderId::new("x com").is_err());
	}

	#[test]
	fn generated_sessions_are_distinct_and_valid() {
		let lhs = SessionId::generate().expect("OS random source should work.");
		let rhs = SessionId::generate().expect("OS random source should work.");

		assert_ne!(lhs, rhs);
		assert_eq!(lhs.len(), 43);
		assert!(SessionId::new(lhs.as_str()).is_ok());
	}

	#[test]
	fn deserialization_validates() {
		let session: SessionId =
			serde_json::from_str("\"browser-42\"").expect("Session should deserialize.");

		assert_eq!(format!("{session:?}"), "Session(browser-42)");
		assert!(serde_json::from_str::<SessionId>("\"with space\"").is_err());
	}
}
