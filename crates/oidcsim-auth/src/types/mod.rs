//! Value types shared by the delegation and code-exchange modules.
//!
//! - [`ScopeSet`] - set of opaque scope strings
//! - [`Constraints`] - audience, IP and resource restrictions
//! - [`TimeWindow`] - not-before / not-after validity bounds
//! - [`Client`] - relying-party registration

pub mod client;
pub mod constraints;
pub mod scope;

pub use client::{Client, ClientValidationError};
pub use constraints::{Constraints, TimeWindow};
pub use scope::{OPENID_SCOPE, ScopeSet};
