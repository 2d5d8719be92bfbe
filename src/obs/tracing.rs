// self
use crate::{_prelude::*, obs::FlowKind};

/// Future returned by [`FlowSpan::instrument`].
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`FlowSpan::instrument`]; a passthrough without `tracing`.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// `guild_auth.flow` span carrying the `flow` and `stage` fields.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens a span for `kind`, starting at `stage`.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self { span: tracing::info_span!("guild_auth.flow", flow = kind.as_str(), stage) }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Overwrites the `stage` field, e.g. once a callback reaches a terminal state.
	pub fn record_stage(&self, stage: &'static str) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("stage", stage);
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;
		}
	}

	/// Runs `fut` inside the span without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			tracing::Instrument::instrument(fut, self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a failure whose detail must stay server-side.
///
/// The whole `source` chain is flattened into one `error` field.
pub fn log_failure(kind: FlowKind, stage: &'static str, error: &(dyn StdError + 'static)) {
	#[cfg(feature = "tracing")]
	{
		let mut chain = error.to_string();
		let mut source = error.source();

		while let Some(cause) = source {
			chain.push_str(": ");
			chain.push_str(&cause.to_string());

			source = cause.source();
		}

		tracing::warn!(flow = kind.as_str(), stage, error = %chain, "Sign-in step failed.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, stage, error);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::{Error, ProviderError};

	#[test]
	fn stage_can_be_rewritten() {
		let span = FlowSpan::new(FlowKind::Callback, "awaiting_params");

		span.record_stage("failed");
	}

	#[test]
	fn nested_sources_are_accepted() {
		log_failure(
			FlowKind::Callback,
			"exchanging",
			&Error::TokenExchangeFailed(ProviderError::Timeout),
		);
	}

	#[tokio::test]
	async fn instrumented_future_keeps_its_output() {
		let span = FlowSpan::new(FlowKind::Authorize, "begin_authorization");

		assert_eq!(span.instrument(async { 42 }).await, 42);
	}
}
