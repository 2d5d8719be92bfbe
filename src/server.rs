//! HTTP surface over [`Authenticator`]: `GET /authorize` and the registered callback route.
//!
//! Pending secrets travel in two HTTP-only cookies ([`CookieSlot`]). The callback always answers
//! with a `302 Found` to the application root, carrying either `success=true&user=<json>` or
//! `error=<tag>`, and expires both cookies on every branch.

// std
use std::io;
// crates.io
use axum::{
	Json, Router,
	extract::{RawQuery, State},
	http::{HeaderMap, HeaderValue, StatusCode, header},
	response::{IntoResponse, Response},
	routing::get,
};
use tokio::net::TcpListener;
// self
use crate::{
	_prelude::*,
	auth::AuthenticatedProfile,
	error::FailureKind,
	flows::{Authenticator, CallbackQuery},
	store::CookieSlot,
};

/// Route issuing authorization URLs.
pub const AUTHORIZE_PATH: &str = "/authorize";

/// JSON body returned when `/authorize` fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
	/// Stable failure tag.
	pub error: FailureKind,
	/// Generic message safe to display.
	pub message: &'static str,
}
impl From<FailureKind> for ErrorBody {
	fn from(kind: FailureKind) -> Self {
		Self { error: kind, message: kind.message() }
	}
}

/// Builds the router; the callback is mounted at the path of [`AuthConfig::redirect_uri`].
///
/// [`AuthConfig::redirect_uri`]: crate::config::AuthConfig::redirect_uri
pub fn router(authenticator: Arc<Authenticator>) -> Router {
	let callback_path = authenticator.config.redirect_uri.path().to_owned();

	Router::new()
		.route(AUTHORIZE_PATH, get(handle_authorize))
		.route(&callback_path, get(handle_callback))
		.with_state(authenticator)
}

/// Serves the router on `listener` until `shutdown` resolves.
pub async fn serve<F>(
	listener: TcpListener,
	authenticator: Arc<Authenticator>,
	shutdown: F,
) -> io::Result<()>
where
	F: Future<Output = ()> + Send + 'static,
{
	let addr = listener.local_addr()?;

	tracing::info!(%addr, mode = authenticator.provider.mode().as_str(), "Serving sign-in endpoints.");

	axum::serve(listener, router(authenticator)).with_graceful_shutdown(shutdown).await
}

async fn handle_authorize(State(authenticator): State<Arc<Authenticator>>) -> Response {
	let slot = CookieSlot::empty(authenticator.config.cookies.clone());
	let response = match authenticator.begin_authorization(&slot).await {
		Ok(start) => (StatusCode::OK, Json(start)).into_response(),
		Err(e) =>
			(StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::from(e.kind()))).into_response(),
	};

	with_cookies(response, &slot)
}

async fn handle_callback(
	State(authenticator): State<Arc<Authenticator>>,
	headers: HeaderMap,
	RawQuery(raw): RawQuery,
) -> Response {
	let query = raw.as_deref().map(CallbackQuery::parse).unwrap_or_default();
	let cookie_header = headers
		.get_all(header::COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.collect::<Vec<_>>()
		.join("; ");
	let slot = CookieSlot::from_header(authenticator.config.cookies.clone(), Some(&cookie_header));
	let app_root = &authenticator.config.app_root;
	let location = match authenticator.complete_authorization(&slot, query).await {
		Ok(profile) => success_location(app_root, &profile),
		Err(e) => failure_location(app_root, e.kind()),
	};
	let response = match HeaderValue::try_from(location.as_str()) {
		Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
		Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
	};

	with_cookies(response, &slot)
}

fn success_location(app_root: &Url, profile: &AuthenticatedProfile) -> Url {
	let user = match serde_json::to_string(&profile.client_payload()) {
		Ok(user) => user,
		Err(e) => {
			tracing::warn!(error = %e, "Failed to encode the profile payload.");

			return failure_location(app_root, FailureKind::ProfileFetchFailed);
		},
	};
	let mut url = app_root.clone();

	url.query_pairs_mut().append_pair("success", "true").append_pair("user", &user);

	url
}

fn failure_location(app_root: &Url, kind: FailureKind) -> Url {
	let mut url = app_root.clone();

	url.query_pairs_mut().append_pair("error", kind.as_str());

	url
}

fn with_cookies(mut response: Response, slot: &CookieSlot) -> Response {
	let headers = response.headers_mut();

	headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

	for directive in slot.take_directives() {
		match HeaderValue::try_from(directive.to_string()) {
			Ok(value) => {
				headers.append(header::SET_COOKIE, value);
			},
			Err(e) => tracing::warn!(cookie = directive.name(), error = %e, "Dropped an unencodable cookie."),
		}
	}

	response
}
