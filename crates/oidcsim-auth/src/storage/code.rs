//! Authorization code storage trait.
//!
//! # Implementation Notes
//!
//! Implementations should:
//!
//! - Support efficient lookup by code value
//! - Implement `mark_used` as one atomic check-and-set (a conditional update
//!   in a transactional store, or an exclusive per-entry lock in memory),
//!   never as a separate read followed by a write
//! - Remove expired codes during `cleanup_expired`, used or not
//!
//! # Security Considerations
//!
//! - Never log authorization codes

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::oauth::AuthorizationCode;

/// Result of an atomic mark-used attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkUsedOutcome {
    /// This call transitioned the code from unused to used.
    Marked,
    /// The code had already been used.
    AlreadyUsed,
    /// The code expired before `at`.
    Expired,
    /// No such code.
    NotFound,
}

/// Storage trait for authorization codes.
#[async_trait]
pub trait AuthorizationCodeStorage: Send + Sync {
    /// Stores a newly issued code.
    ///
    /// # Errors
    ///
    /// Returns an error if the code value already exists or the storage
    /// operation fails.
    async fn issue(&self, code: &AuthorizationCode) -> AuthResult<()>;

    /// Fetches a code for redemption.
    ///
    /// Returns codes regardless of their used/expired state; the caller
    /// checks, and `mark_used` re-checks atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_for_redemption(&self, code: &str) -> AuthResult<Option<AuthorizationCode>>;

    /// Atomically marks the code used at `at`.
    ///
    /// Exactly one concurrent caller observes `MarkUsedOutcome::Marked` for a
    /// given code. A code whose `expires_at` is before `at` is never marked.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn mark_used(&self, code: &str, at: OffsetDateTime) -> AuthResult<MarkUsedOutcome>;

    /// Removes codes that expired before `now`.
    ///
    /// # Returns
    ///
    /// The number of codes removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn cleanup_expired(&self, now: OffsetDateTime) -> AuthResult<u64>;
}
