// self
use crate::{
	error::FailureKind,
	obs::{FlowKind, FlowOutcome},
};

/// Bumps `guild_auth_flow_total` for `kind` and `outcome`.
#[cfg(feature = "metrics")]
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	metrics::counter!("guild_auth_flow_total", "flow" => kind.as_str(), "outcome" => outcome.as_str())
		.increment(1);
}

/// Without `metrics` this does nothing.
#[cfg(not(feature = "metrics"))]
pub fn record_flow_outcome(_: FlowKind, _: FlowOutcome) {}

/// Bumps `guild_auth_failure_total` for the browser-facing failure tag.
#[cfg(feature = "metrics")]
pub fn record_failure_kind(kind: FailureKind) {
	metrics::counter!("guild_auth_failure_total", "kind" => kind.as_str()).increment(1);
}

/// Without `metrics` this does nothing.
#[cfg(not(feature = "metrics"))]
pub fn record_failure_kind(_: FailureKind) {}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recording_without_a_recorder_is_harmless() {
		record_flow_outcome(FlowKind::Callback, FlowOutcome::Failure);
		record_failure_kind(FailureKind::StateMismatch);
	}
}
