//! Spans, warnings, and counters around the sign-in flows.
//!
//! Everything here compiles to no-ops unless the matching feature is on:
//!
//! - `tracing`: a `guild_auth.flow` span per call carrying `flow` and `stage`, plus a warning for
//!   each provider or storage failure. Secrets never reach these fields.
//! - `metrics`: `guild_auth_flow_total{flow,outcome}` and `guild_auth_failure_total{kind}`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

macro_rules! label_enum {
	($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $label:literal,)+ }) => {
		$(#[$meta])*
		#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
		pub enum $name {
			$($(#[$vmeta])* $variant,)+
		}
		impl $name {
			/// Span field and metric label value.
			pub const fn as_str(self) -> &'static str {
				match self {
					$(Self::$variant => $label,)+
				}
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(self.as_str())
			}
		}
	};
}

label_enum! {
	/// Which half of the sign-in is running.
	FlowKind {
		/// Issuing an authorization URL.
		Authorize => "authorize",
		/// Handling the provider redirect.
		Callback => "callback",
	}
}
label_enum! {
	/// Counter outcome for one flow call.
	FlowOutcome {
		/// The call started.
		Attempt => "attempt",
		/// The call returned `Ok`.
		Success => "success",
		/// The call returned `Err`.
		Failure => "failure",
	}
}
