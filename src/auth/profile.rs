//! Profile data produced by a completed authorization.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Size suffixes the provider appends to avatar file names; the bare name is the original upload.
const IMAGE_SIZE_SUFFIXES: &[&str] = &["_normal", "_bigger", "_mini", "_200x200", "_400x400"];

/// User fields as returned by the provider's profile endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
	/// Provider-side user identifier.
	pub id: String,
	/// Handle without the leading `@`.
	pub username: String,
	/// Display name.
	#[serde(default)]
	pub name: Option<String>,
	/// Free-form biography (`description` on X).
	#[serde(default, alias = "description")]
	pub bio: Option<String>,
	/// Avatar URL, usually a thumbnail variant.
	#[serde(default)]
	pub profile_image_url: Option<String>,
}

/// Token material issued by the provider's token endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenGrant {
	/// Bearer token used for the profile lookup.
	pub access_token: TokenSecret,
	/// Refresh token, when `offline.access` was granted.
	pub refresh_token: Option<TokenSecret>,
	/// Lifetime reported by the provider.
	pub expires_in: Option<Duration>,
}
impl TokenGrant {
	/// Grant carrying only an access token.
	pub fn bearer(access_token: impl Into<String>) -> Self {
		Self { access_token: TokenSecret::new(access_token), refresh_token: None, expires_in: None }
	}
}

/// Result of a completed authorization; owned by the calling session and never persisted here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedProfile {
	/// Provider-side user identifier.
	pub id: String,
	/// Handle without the leading `@`.
	pub username: String,
	/// Display name (empty when the provider omits it).
	pub display_name: String,
	/// Biography (empty when the provider omits it).
	pub bio: String,
	/// Highest-resolution avatar URL (empty when the provider omits it).
	pub profile_image_url: String,
	/// Access token issued by the exchange.
	pub access_token: TokenSecret,
	/// Refresh token, when issued.
	pub refresh_token: Option<TokenSecret>,
	/// Access token lifetime, when reported.
	pub expires_in: Option<Duration>,
}
impl AuthenticatedProfile {
	/// Assembles the profile, normalizing the avatar URL to its full-size variant.
	pub fn assemble(profile: ProviderProfile, grant: TokenGrant) -> Self {
		let ProviderProfile { id, username, name, bio, profile_image_url } = profile;

		Self {
			id,
			username,
			display_name: name.unwrap_or_default(),
			bio: bio.unwrap_or_default(),
			profile_image_url: profile_image_url
				.as_deref()
				.map(normalize_profile_image_url)
				.unwrap_or_default(),
			access_token: grant.access_token,
			refresh_token: grant.refresh_token,
			expires_in: grant.expires_in,
		}
	}

	/// Token-free view handed to the client application.
	pub fn client_payload(&self) -> ProfilePayload {
		ProfilePayload {
			id: self.id.clone(),
			username: self.username.clone(),
			name: self.display_name.clone(),
			bio: self.bio.clone(),
			profile_image_url: self.profile_image_url.clone(),
		}
	}
}

/// Public profile fields the browser receives after sign-in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePayload {
	/// Provider-side user identifier.
	pub id: String,
	/// Handle without the leading `@`.
	pub username: String,
	/// Display name.
	pub name: String,
	/// Biography.
	pub bio: String,
	/// Full-size avatar URL.
	pub profile_image_url: String,
}

/// Strips the provider's thumbnail suffix (`_normal`, `_400x400`, ...) from an avatar URL.
///
/// Only the last path segment is rewritten. Anything that does not parse as a URL, or carries no
/// known suffix, is returned unchanged.
pub fn normalize_profile_image_url(raw: &str) -> String {
	strip_size_suffix(raw).unwrap_or_else(|| raw.to_owned())
}

fn strip_size_suffix(raw: &str) -> Option<String> {
	let mut url = Url::parse(raw).ok()?;
	let path = url.path();
	let (dir, file) = path.split_at(path.rfind('/')? + 1);
	let (stem, ext) = match file.rfind('.') {
		Some(idx) => file.split_at(idx),
		None => (file, ""),
	};
	let bare = IMAGE_SIZE_SUFFIXES
		.iter()
		.find_map(|suffix| stem.strip_suffix(suffix))
		.filter(|bare| !bare.is_empty())?;
	let path = format!("{dir}{bare}{ext}");

	url.set_path(&path);

	Some(url.into())
}
