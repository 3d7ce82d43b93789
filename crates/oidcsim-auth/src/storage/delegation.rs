//! Delegation storage trait.
//!
//! # Implementation Notes
//!
//! Implementations should:
//!
//! - Never delete delegations; revocation is a tombstone kept for audit
//! - Make `revoke` atomic with respect to concurrent reads, so a reader sees
//!   either the delegation before revocation or after, never a torn record
//! - Keep the first revocation timestamp when revoked repeatedly

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::delegation::{Delegation, DelegationId};

/// Storage trait for delegations.
#[async_trait]
pub trait DelegationStorage: Send + Sync {
    /// Persists a new delegation.
    ///
    /// # Errors
    ///
    /// Returns an error if the delegation cannot be stored (e.g., duplicate ID,
    /// storage unavailable).
    async fn save(&self, delegation: &Delegation) -> AuthResult<()>;

    /// Finds a delegation by ID.
    ///
    /// Returns revoked delegations too; callers check `is_active_at`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, id: &DelegationId) -> AuthResult<Option<Delegation>>;

    /// Records revocation at `at`.
    ///
    /// Idempotent: an already-revoked delegation keeps its original
    /// `revoked_at`.
    ///
    /// # Returns
    ///
    /// The delegation as stored after the call, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn revoke(&self, id: &DelegationId, at: OffsetDateTime)
    -> AuthResult<Option<Delegation>>;

    /// Lists user-consent delegations for a subject, revoked ones included.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn list_by_subject(&self, subject: &str) -> AuthResult<Vec<Delegation>>;
}
