//! Transport used for the provider's token and profile endpoints.
//!
//! Every provider call builds a handle with its own [`ResponseMetadataSlot`]; when a call fails,
//! the status line captured there is attached to the resulting
//! [`ProviderError`](crate::error::ProviderError).

// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
// self
use crate::_prelude::*;

/// HTTP stack behind [`LiveProvider`](crate::provider::LiveProvider).
///
/// Shared across requests behind an `Arc`; handles must yield `Send` futures so flows can run on
/// a multi-threaded server.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Error type of the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Per-call [`AsyncHttpClient`] that reports into a metadata slot.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Returns a handle that clears `slot` before sending and fills it once a status arrives.
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;
}

/// What is known about the last response when a call fails.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
	/// HTTP status, absent when the failure happened before a response.
	pub status: Option<u16>,
}

/// Single-use cell shared between a handle and the error mapper.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Replaces the captured metadata.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Removes and returns the captured metadata.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// reqwest-backed [`TokenHttpClient`].
///
/// Has no `Default`; a bare `reqwest::Client` follows redirects and never times out.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient {
	client: ReqwestClient,
}
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Uses a preconfigured client as is. It should not follow redirects.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self { client }
	}

	/// Client that never follows redirects and abandons requests after `timeout`.
	pub fn with_timeout(timeout: Duration) -> Result<Self, ReqwestError> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.timeout(timeout.unsigned_abs())
			.build()?;

		Ok(Self { client })
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		ReqwestHandle { client: self.client.clone(), slot }
	}
}

/// Handle returned by [`ReqwestHttpClient::with_metadata`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHandle {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.slot.take();

			let request: reqwest::Request = request.try_into().map_err(Box::new)?;
			let response = self.client.execute(request).await.map_err(Box::new)?;
			let status = response.status();

			self.slot.store(ResponseMetadata { status: Some(status.as_u16()) });

			let headers = response.headers().clone();
			let body = response.bytes().await.map_err(Box::new)?;
			let mut converted = HttpResponse::new(body.to_vec());

			*converted.status_mut() = status;
			*converted.headers_mut() = headers;

			Ok(converted)
		})
	}
}
