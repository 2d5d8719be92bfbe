//! Token Exchanger and Profile Fetcher over the provider's HTTPS API.

// crates.io
use oauth2::{
	AsyncHttpClient, HttpRequest, HttpResponse,
	http::{Method, header},
};
// self
use crate::{
	_prelude::*,
	auth::{ProviderProfile, TokenGrant, TokenSecret},
	config::{ClientCredentials, ProviderMode, usable_credentials},
	error::{ConfigError, ProviderError},
	http::{ResponseMetadataSlot, TokenHttpClient},
	oauth::{CodeExchanger, TransportErrorMapper},
	provider::{AuthProvider, ProviderDescriptor, ProviderFuture},
};
#[cfg(feature = "reqwest")]
use crate::{config::AuthConfig, http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

/// [`LiveProvider`] over the default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestLiveProvider = LiveProvider<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Provider backed by real token and profile endpoints.
///
/// Construction never fails on missing credentials; they surface as
/// [`ConfigError`] from [`AuthProvider::client_credentials`] on first use.
pub struct LiveProvider<C, M>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	descriptor: ProviderDescriptor,
	client: Option<ClientCredentials>,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
	exchanger: Option<CodeExchanger<C, M>>,
}
impl<C, M> LiveProvider<C, M>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	/// Creates a provider that sends every request through `http_client`.
	pub fn with_http_client(
		descriptor: ProviderDescriptor,
		client: Option<ClientCredentials>,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Self {
		let http_client = http_client.into();
		let error_mapper = error_mapper.into();
		let exchanger = usable_credentials(client.as_ref(), descriptor.preferred_client_auth_method)
			.ok()
			.map(|credentials| {
				CodeExchanger::new(
					&descriptor,
					credentials,
					http_client.clone(),
					error_mapper.clone(),
				)
			});

		Self { descriptor, client, http_client, error_mapper, exchanger }
	}

	/// Descriptor the provider was built from.
	pub fn descriptor(&self) -> &ProviderDescriptor {
		&self.descriptor
	}
}
#[cfg(feature = "reqwest")]
impl LiveProvider<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Builds the provider with a reqwest client bounded by `config.http_timeout`.
	pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigError> {
		let http_client = ReqwestHttpClient::with_timeout(config.http_timeout)?;

		Ok(Self::with_http_client(
			config.descriptor.clone(),
			config.client.clone(),
			http_client,
			ReqwestTransportErrorMapper,
		))
	}
}
impl<C, M> AuthProvider for LiveProvider<C, M>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	fn mode(&self) -> ProviderMode {
		ProviderMode::Live
	}

	fn client_credentials(&self) -> Result<&ClientCredentials, ConfigError> {
		usable_credentials(self.client.as_ref(), self.descriptor.preferred_client_auth_method)
	}

	fn authorization_endpoint(&self) -> &Url {
		&self.descriptor.endpoints.authorization
	}

	fn exchange_code<'a>(
		&'a self,
		code: &'a str,
		verifier: &'a TokenSecret,
		redirect_uri: &'a Url,
	) -> ProviderFuture<'a, TokenGrant> {
		match self.exchanger.as_ref() {
			Some(exchanger) => exchanger.exchange(code, verifier, redirect_uri),
			None => Box::pin(async { Err(ProviderError::Unconfigured) }),
		}
	}

	fn fetch_profile<'a>(
		&'a self,
		grant: &'a TokenGrant,
	) -> ProviderFuture<'a, Option<ProviderProfile>> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let handle = self.http_client.with_metadata(meta.clone());
			let request: HttpRequest = oauth2::http::Request::builder()
				.method(Method::GET)
				.uri(self.descriptor.endpoints.profile.as_str())
				.header(header::AUTHORIZATION, format!("Bearer {}", grant.access_token.expose()))
				.header(header::ACCEPT, "application/json")
				.body(Vec::new())?;
			let response = handle
				.call(request)
				.await
				.map_err(|err| self.error_mapper.map_transport_error(meta.take().as_ref(), err))?;

			parse_profile_response(&response)
		})
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProfileDocument {
	Wrapped { data: ProviderProfile },
	Flat(ProviderProfile),
	// `{}`, `{"data": null}`, or `{"errors": [...]}`.
	Empty {},
}

fn parse_profile_response(response: &HttpResponse) -> Result<Option<ProviderProfile>, ProviderError> {
	let status = response.status();

	if !status.is_success() {
		return Err(ProviderError::Endpoint {
			message: format!("Profile endpoint answered with HTTP {status}"),
			status: Some(status.as_u16()),
		});
	}

	let mut deserializer = serde_json::Deserializer::from_slice(response.body());
	let document: ProfileDocument = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| ProviderError::ResponseParse { source, status: Some(status.as_u16()) })?;

	Ok(match document {
		ProfileDocument::Wrapped { data } | ProfileDocument::Flat(data) => Some(data),
		ProfileDocument::Empty {} => None,
	})
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::StatusCode;
	// self
	use super::*;

	fn response(status: u16, body: &str) -> HttpResponse {
		let mut response = HttpResponse::new(body.as_bytes().to_vec());

		*response.status_mut() =
			StatusCode::from_u16(status).expect("Fixture status code should be valid.");

		response
	}

	#[test]
	fn wrapped_x_document_is_unwrapped() {
		let profile = parse_profile_response(&response(
			200,
			r#"{"data":{"id":"1","username":"alice","name":"Alice","description":"hi","profile_image_url":"https://x/a_normal.jpg"}}"#,
		))
		.expect("Profile should parse.")
		.expect("Profile should be present.");

		assert_eq!(profile.id, "1");
		assert_eq!(profile.bio.as_deref(), Some("hi"));
	}

	#[test]
	fn flat_document_is_accepted() {
		let profile = parse_profile_response(&response(
			200,
			r#"{"id":"1","username":"alice","name":"Alice","bio":"hi"}"#,
		))
		.expect("Profile should parse.")
		.expect("Profile should be present.");

		assert_eq!(profile.username, "alice");
		assert!(profile.profile_image_url.is_none());
	}

	#[test]
	fn documents_without_user_data_yield_none() {
		for body in ["{}", r#"{"data":null}"#, r#"{"errors":[{"title":"Not Found Error"}]}"#] {
			assert!(
				parse_profile_response(&response(200, body)).expect("Body should parse.").is_none(),
				"`{body}` carries no user."
			);
		}
	}

	#[test]
	fn failures_keep_the_http_status() {
		let err = parse_profile_response(&response(401, r#"{"title":"Unauthorized"}"#))
			.expect_err("Unauthorized responses must fail.");

		assert_eq!(err.status(), Some(401));

		let err = parse_profile_response(&response(200, "<html>"))
			.expect_err("Non-JSON bodies must fail.");

		assert!(matches!(err, ProviderError::ResponseParse { status: Some(200), .. }));
	}
}
