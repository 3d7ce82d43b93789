//! In-memory delegation storage.

use async_trait::async_trait;
use dashmap::DashMap;
use oidcsim_auth::AuthResult;
use oidcsim_auth::delegation::{Delegation, DelegationId};
use oidcsim_auth::storage::DelegationStorage;
use time::OffsetDateTime;
use tracing::debug;

/// Delegations keyed by ID. Entries are never removed.
#[derive(Debug, Default)]
pub struct MemoryDelegationStorage {
    delegations: DashMap<DelegationId, Delegation>,
}

impl MemoryDelegationStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored delegations, revoked ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.delegations.len()
    }

    /// Returns `true` if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.delegations.is_empty()
    }
}

#[async_trait]
impl DelegationStorage for MemoryDelegationStorage {
    async fn save(&self, delegation: &Delegation) -> AuthResult<()> {
        self.delegations
            .insert(delegation.id.clone(), delegation.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &DelegationId) -> AuthResult<Option<Delegation>> {
        Ok(self.delegations.get(id).map(|entry| entry.value().clone()))
    }

    async fn revoke(&self, id: &DelegationId, at: OffsetDateTime) -> AuthResult<Option<Delegation>> {
        // The shard write guard makes the set-if-unset atomic against readers.
        let Some(mut entry) = self.delegations.get_mut(id) else {
            return Ok(None);
        };
        if entry.revoked_at.is_none() {
            entry.revoked_at = Some(at);
            debug!(delegation_id = %id, "Revocation recorded");
        }
        Ok(Some(entry.value().clone()))
    }

    async fn list_by_subject(&self, subject: &str) -> AuthResult<Vec<Delegation>> {
        Ok(self
            .delegations
            .iter()
            .filter(|entry| entry.subject.as_deref() == Some(subject))
            .map(|entry| entry.value().clone())
            .collect())
    }
}
