//! Scopes requested in the authorize URL.

// std
use std::collections::BTreeSet;
// self
use crate::_prelude::*;

/// Rejected scope input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// A scope entry was empty.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// A scope entry contained whitespace, which would split it on the wire.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending entry.
		scope: String,
	},
}

/// Sorted, deduplicated scope list.
///
/// Two configurations asking for the same permissions render byte-identical authorize URLs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ScopeSet(BTreeSet<String>);
impl ScopeSet {
	/// Validates every entry and collects them.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		scopes
			.into_iter()
			.map(|scope| {
				let scope: String = scope.into();

				if scope.is_empty() {
					Err(ScopeValidationError::Empty)
				} else if scope.chars().any(char::is_whitespace) {
					Err(ScopeValidationError::ContainsWhitespace { scope })
				} else {
					Ok(scope)
				}
			})
			.collect::<Result<_, _>>()
			.map(Self)
	}

	/// Returns true if no scopes are requested.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if `scope` is requested.
	pub fn contains(&self, scope: &str) -> bool {
		self.0.contains(scope)
	}

	/// Scopes in sorted order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}

	/// Joins the scopes with the provider's delimiter, or `None` for an empty set.
	pub fn join(&self, delimiter: char) -> Option<String> {
		let mut iter = self.iter();
		let mut joined = iter.next()?.to_owned();

		for scope in iter {
			joined.push(delimiter);
			joined.push_str(scope);
		}

		Some(joined)
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.join(' ').unwrap_or_default())
	}
}
impl FromStr for ScopeSet {
	type Err = ScopeValidationError;

	// Environment values may be space- or comma-separated.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if !s.is_empty() && s.trim().is_empty() {
			return Err(ScopeValidationError::Empty);
		}

		Self::new(s.split(|c: char| c.is_whitespace() || c == ',').filter(|part| !part.is_empty()))
	}
}
impl TryFrom<Vec<String>> for ScopeSet {
	type Error = ScopeValidationError;

	fn try_from(scopes: Vec<String>) -> Result<Self, Self::Error> {
		Self::new(scopes)
	}
}
impl From<ScopeSet> for Vec<String> {
	fn from(scope: ScopeSet) -> Self {
		scope.0.into_iter().collect()
	}
}
