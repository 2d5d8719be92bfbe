// crates.io
use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode, header},
	response::Response,
};
use tower::ServiceExt;
// self
use guild_auth::{
	_preludet::*,
	auth::ProfilePayload,
	config::AuthConfig,
	flows::Authenticator,
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	provider::{LiveProvider, STUB_AUTHORIZATION_CODE, STUB_PROFILE_IMAGE_URL, StubProvider},
	server,
};

fn stub_router() -> Router {
	let config = test_config("https://provider.example.com");
	let provider = StubProvider::from_config(&config);

	server::router(Arc::new(Authenticator::new(Arc::new(config), Arc::new(provider))))
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
	let mut builder = Request::builder().method("GET").uri(uri);

	if let Some(cookie) = cookie {
		builder = builder.header(header::COOKIE, cookie);
	}

	builder.body(Body::empty()).expect("Request fixture should build.")
}

fn set_cookies(response: &Response) -> Vec<String> {
	response
		.headers()
		.get_all(header::SET_COOKIE)
		.iter()
		.map(|value| value.to_str().expect("Set-Cookie should be ASCII.").to_owned())
		.collect()
}

fn location(response: &Response) -> Url {
	let raw = response
		.headers()
		.get(header::LOCATION)
		.expect("Callback should redirect.")
		.to_str()
		.expect("Location should be ASCII.");

	Url::parse(raw).expect("Location should be absolute.")
}

fn query(url: &Url) -> HashMap<String, String> {
	url.query_pairs().into_owned().collect()
}

async fn json(response: Response) -> serde_json::Value {
	let bytes =
		body::to_bytes(response.into_body(), usize::MAX).await.expect("Body should be readable.");

	serde_json::from_slice(&bytes).expect("Body should be JSON.")
}

fn assert_cookies_cleared(response: &Response) {
	let cookies = set_cookies(response);

	assert_eq!(cookies.len(), 2, "Both pending-secret cookies must be expired: {cookies:?}.");
	assert!(cookies.iter().all(|cookie| cookie.contains("Max-Age=0")));
}

#[tokio::test]
async fn authorize_returns_url_and_sets_secret_cookies() {
	let response =
		stub_router().oneshot(get("/authorize", None)).await.expect("Router should respond.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");

	let cookies = set_cookies(&response);
	let body = json(response).await;
	let state = body["state"].as_str().expect("State should be a string.");
	let url = Url::parse(body["authorizationUrl"].as_str().expect("URL should be a string."))
		.expect("Authorization URL should parse.");

	assert_eq!(query(&url)["state"], state);
	assert_eq!(cookies.len(), 2);
	assert!(cookies[0].starts_with(&format!("oauth_state={state}; ")));
	assert!(cookies[1].starts_with("oauth_code_verifier="));

	for cookie in &cookies {
		assert!(cookie.contains("HttpOnly"));
		assert!(cookie.contains("SameSite=Lax"));
		assert!(cookie.contains("Max-Age=600"));
		assert!(cookie.contains("Secure"));
	}
}

#[tokio::test]
async fn stub_round_trip_redirects_with_profile() {
	let router = stub_router();
	let response =
		router.clone().oneshot(get("/authorize", None)).await.expect("Router should respond.");
	let cookie_header = set_cookies(&response)
		.iter()
		.filter_map(|cookie| cookie.split(';').next().map(str::to_owned))
		.collect::<Vec<_>>()
		.join("; ");
	let body = json(response).await;
	let authorization_url = Url::parse(body["authorizationUrl"].as_str().expect("URL should be a string."))
		.expect("Authorization URL should parse.");
	let params = query(&authorization_url);

	assert_eq!(authorization_url.path(), "/callback");
	assert_eq!(params["code"], STUB_AUTHORIZATION_CODE);

	let callback = format!("/callback?code={}&state={}", params["code"], params["state"]);
	let response = router
		.oneshot(get(&callback, Some(&cookie_header)))
		.await
		.expect("Router should respond.");

	assert_eq!(response.status(), StatusCode::FOUND);
	assert_cookies_cleared(&response);

	let target = location(&response);
	let params = query(&target);
	let user: ProfilePayload =
		serde_json::from_str(&params["user"]).expect("User payload should be JSON.");

	assert_eq!(target.origin().ascii_serialization(), "https://guild.example.com");
	assert_eq!(params["success"], "true");
	assert_eq!(user.username, "aztecguild");
	assert_eq!(user.name, "Aztecguild");
	assert_eq!(user.profile_image_url, STUB_PROFILE_IMAGE_URL);
	assert!(!params["user"].contains("stub-access-token"), "Tokens must not reach the browser.");
}

#[tokio::test]
async fn repeated_callback_parameters_use_the_first_value() {
	let response = stub_router()
		.oneshot(get(
			"/callback?code=stub-authorization-code&state=S1&state=S1&code=other",
			Some("oauth_state=S1; oauth_code_verifier=V1"),
		))
		.await
		.expect("Router should respond.");

	assert_eq!(response.status(), StatusCode::FOUND);
	assert_cookies_cleared(&response);

	let params = query(&location(&response));

	assert_eq!(params.get("success").map(String::as_str), Some("true"), "{params:?}");
	assert!(!params.contains_key("error"));
}

#[tokio::test]
async fn callback_failures_redirect_with_a_tag() {
	for (uri, cookie, tag) in [
		("/callback?code=stub-authorization-code&state=S2", Some("oauth_state=S1; oauth_code_verifier=V1"), "state_mismatch"),
		("/callback?code=stub-authorization-code&state=S1", None, "session_expired"),
		("/callback?code=stub-authorization-code&state=S1", Some("oauth_state=S1"), "missing_verifier"),
		("/callback?error=access_denied&state=S1", Some("oauth_state=S1; oauth_code_verifier=V1"), "authorization_denied"),
		("/callback?state=S1", Some("oauth_state=S1; oauth_code_verifier=V1"), "missing_parameters"),
		("/callback?code=forged&state=S1", Some("oauth_state=S1; oauth_code_verifier=V1"), "token_exchange_failed"),
	] {
		let response = stub_router().oneshot(get(uri, cookie)).await.expect("Router should respond.");

		assert_eq!(response.status(), StatusCode::FOUND, "{uri} should redirect.");
		assert_cookies_cleared(&response);

		let params = query(&location(&response));

		assert_eq!(params.get("error").map(String::as_str), Some(tag), "{uri} should fail with {tag}.");
		assert!(!params.contains_key("user"));
	}
}

#[tokio::test]
async fn authorize_without_credentials_is_a_server_error() {
	let config = AuthConfig::builder(test_descriptor("https://provider.example.com"))
		.redirect_uri(Url::parse(TEST_REDIRECT_URI).expect("Redirect URI fixture should parse."))
		.build()
		.expect("Configuration without credentials should still build.");
	let provider = LiveProvider::<ReqwestHttpClient, ReqwestTransportErrorMapper>::with_http_client(
		config.descriptor.clone(),
		None,
		test_reqwest_http_client(),
		ReqwestTransportErrorMapper,
	);
	let router =
		server::router(Arc::new(Authenticator::new(Arc::new(config), Arc::new(provider))));
	let response = router.oneshot(get("/authorize", None)).await.expect("Router should respond.");

	assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	assert!(set_cookies(&response).is_empty());

	let body = json(response).await;

	assert_eq!(body["error"], "provider_misconfigured");
	assert!(body["message"].is_string());
}
