//! Auth-domain identifiers, scope sets, PKCE material, and profile models.

pub mod id;
pub mod pkce;
pub mod profile;
pub mod scope;
pub mod secret;

pub use id::*;
pub use pkce::*;
pub use profile::*;
pub use scope::*;
pub use secret::*;
