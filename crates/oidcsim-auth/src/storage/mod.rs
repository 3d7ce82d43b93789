//! Storage and policy traits consumed by the delegation service.
//!
//! This module defines the interfaces for:
//!
//! - Delegations (consent records, revocation tombstones)
//! - Authorization codes (issue, fetch, atomic mark-used)
//! - Client registrations (redirect, scope and secret policy)
//!
//! # Implementations
//!
//! In-memory implementations are provided in the `oidcsim-auth-memory` crate.

pub mod client;
pub mod code;
pub mod delegation;

pub use client::ClientRegistry;
pub use code::{AuthorizationCodeStorage, MarkUsedOutcome};
pub use delegation::DelegationStorage;
