//! Authorization code exchange on top of the `oauth2` crate.
//!
//! Only the token endpoint is configured on the inner client. The authorization URL is rendered
//! by [`flows::authorize`](crate::flows::authorize) and the profile request by the provider, so
//! neither passes through here.

pub use oauth2;

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AuthType, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, PkceCodeVerifier, RedirectUrl, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::{TokenGrant, TokenSecret},
	config::ClientCredentials,
	error::ProviderError,
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	provider::{ClientAuthMethod, ProviderDescriptor},
};

type TokenOnlyClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type ExchangeFuture<'a> = Pin<Box<dyn Future<Output = Result<TokenGrant, ProviderError>> + 'a + Send>>;

/// Turns transport failures of a [`TokenHttpClient`] into [`ProviderError`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// `metadata` holds the status line when a response arrived before the failure.
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> ProviderError;
}

/// Mapper for [`ReqwestHttpClient`](crate::http::ReqwestHttpClient).
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<ReqwestError>,
	) -> ProviderError {
		let status = metadata.and_then(|m| m.status);

		match error {
			HttpClientError::Reqwest(e) if e.is_timeout() => ProviderError::Timeout,
			HttpClientError::Reqwest(e) => ProviderError::network(*e),
			HttpClientError::Http(e) => ProviderError::Request(e),
			HttpClientError::Io(e) => ProviderError::Io(e),
			HttpClientError::Other(message) =>
				ProviderError::Endpoint { message: format!("HTTP client error: {message}"), status },
			_ => ProviderError::Endpoint { message: "Unrecognized HTTP client error.".into(), status },
		}
	}
}

/// Exchanges authorization codes for one descriptor and one client registration.
pub(crate) struct CodeExchanger<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	client: TokenOnlyClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> CodeExchanger<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn new(
		descriptor: &ProviderDescriptor,
		credentials: &ClientCredentials,
		http_client: Arc<C>,
		error_mapper: Arc<M>,
	) -> Self {
		let method = descriptor.preferred_client_auth_method;
		let mut client = BasicClient::new(ClientId::new(credentials.client_id.clone()))
			.set_token_uri(TokenUrl::from_url(descriptor.endpoints.token.clone()));

		if let Some(secret) = credentials.client_secret.as_ref().filter(|_| method.requires_secret()) {
			client = client.set_client_secret(ClientSecret::new(secret.expose().to_owned()));
		}
		if method == ClientAuthMethod::ClientSecretPost {
			client = client.set_auth_type(AuthType::RequestBody);
		}

		Self { client, http_client, error_mapper }
	}

	/// Sends one `authorization_code` grant. Codes are single-use, so nothing is retried.
	pub(crate) fn exchange<'a>(
		&'a self,
		code: &'a str,
		verifier: &'a TokenSecret,
		redirect_uri: &'a Url,
	) -> ExchangeFuture<'a> {
		Box::pin(async move {
			let slot = ResponseMetadataSlot::default();
			let handle = self.http_client.with_metadata(slot.clone());
			let response = self
				.client
				.exchange_code(AuthorizationCode::new(code.to_owned()))
				.set_pkce_verifier(PkceCodeVerifier::new(verifier.expose().to_owned()))
				.set_redirect_uri(Cow::Owned(RedirectUrl::from_url(redirect_uri.clone())))
				.request_async(&handle)
				.await
				.map_err(|e| self.token_error(slot.take(), e))?;

			Ok(TokenGrant {
				access_token: TokenSecret::new(response.access_token().secret().to_owned()),
				refresh_token: response.refresh_token().map(|t| TokenSecret::new(t.secret().to_owned())),
				expires_in: response.expires_in().and_then(|d| Duration::try_from(d).ok()),
			})
		})
	}

	fn token_error(
		&self,
		metadata: Option<ResponseMetadata>,
		error: BasicRequestTokenError<HttpClientError<C::TransportError>>,
	) -> ProviderError {
		let status = metadata.as_ref().and_then(|m| m.status);

		match error {
			RequestTokenError::ServerResponse(body) => ProviderError::OAuth {
				error: body.error().as_ref().to_owned(),
				description: body.error_description().cloned(),
				status,
			},
			RequestTokenError::Request(e) =>
				self.error_mapper.map_transport_error(metadata.as_ref(), e),
			RequestTokenError::Parse(source, _) => ProviderError::ResponseParse { source, status },
			RequestTokenError::Other(message) => ProviderError::Endpoint { message, status },
		}
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// crates.io
	use oauth2::basic::{BasicErrorResponse, BasicErrorResponseType};
	// self
	use super::*;
	use crate::{auth::ProviderId, http::ReqwestHttpClient};

	fn exchanger(method: ClientAuthMethod) -> CodeExchanger<ReqwestHttpClient, ReqwestTransportErrorMapper> {
		let url = |raw: &str| Url::parse(raw).expect("Fixture URL should parse.");
		let descriptor = ProviderDescriptor::builder(
			ProviderId::new("guild-test").expect("Provider identifier should be valid."),
		)
		.authorization_endpoint(url("https://example.com/oauth2/authorize"))
		.token_endpoint(url("https://example.com/oauth2/token"))
		.profile_endpoint(url("https://example.com/2/users/me"))
		.preferred_client_auth_method(method)
		.build()
		.expect("Provider descriptor should build.");

		CodeExchanger::new(
			&descriptor,
			&ClientCredentials::new("client-id").with_secret("secret"),
			Arc::new(
				ReqwestHttpClient::with_timeout(Duration::seconds(10))
					.expect("Bounded client should build."),
			),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}

	#[test]
	fn only_the_token_endpoint_is_configured() {
		for method in [
			ClientAuthMethod::ClientSecretBasic,
			ClientAuthMethod::ClientSecretPost,
			ClientAuthMethod::NoneWithPkce,
		] {
			let exchanger = exchanger(method);

			assert_eq!(exchanger.client.client_id().as_str(), "client-id");
			assert_eq!(exchanger.client.token_uri().url().as_str(), "https://example.com/oauth2/token");
		}
	}

	#[test]
	fn invalid_grant_keeps_code_and_status() {
		let exchanger = exchanger(ClientAuthMethod::ClientSecretBasic);
		let body = BasicErrorResponse::new(
			BasicErrorResponseType::InvalidGrant,
			Some("Value passed for the authorization code was invalid.".into()),
			None,
		);
		let error = exchanger.token_error(
			Some(ResponseMetadata { status: Some(400) }),
			RequestTokenError::ServerResponse(body),
		);

		assert!(matches!(
			error,
			ProviderError::OAuth { ref error, status: Some(400), .. } if error == "invalid_grant"
		));
	}
}
