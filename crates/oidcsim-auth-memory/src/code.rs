//! In-memory authorization code storage.
//!
//! Redemption is a check-and-set performed while holding the entry's
//! exclusive shard guard, so concurrent `mark_used` calls for one code are
//! serialized and exactly one of them observes the unused state.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use oidcsim_auth::AuthResult;
use oidcsim_auth::error::AuthError;
use oidcsim_auth::oauth::AuthorizationCode;
use oidcsim_auth::storage::{AuthorizationCodeStorage, MarkUsedOutcome};
use time::OffsetDateTime;

/// Authorization codes keyed by code value.
#[derive(Debug, Default)]
pub struct MemoryAuthorizationCodeStorage {
    codes: DashMap<String, AuthorizationCode>,
}

impl MemoryAuthorizationCodeStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns `true` if no codes are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[async_trait]
impl AuthorizationCodeStorage for MemoryAuthorizationCodeStorage {
    async fn issue(&self, code: &AuthorizationCode) -> AuthResult<()> {
        match self.codes.entry(code.code.clone()) {
            Entry::Occupied(_) => Err(AuthError::storage("authorization code already exists")),
            Entry::Vacant(slot) => {
                slot.insert(code.clone());
                Ok(())
            }
        }
    }

    async fn get_for_redemption(&self, code: &str) -> AuthResult<Option<AuthorizationCode>> {
        Ok(self.codes.get(code).map(|entry| entry.value().clone()))
    }

    async fn mark_used(&self, code: &str, at: OffsetDateTime) -> AuthResult<MarkUsedOutcome> {
        let Some(mut entry) = self.codes.get_mut(code) else {
            return Ok(MarkUsedOutcome::NotFound);
        };
        if entry.is_used() {
            return Ok(MarkUsedOutcome::AlreadyUsed);
        }
        if entry.is_expired_at(at) {
            return Ok(MarkUsedOutcome::Expired);
        }
        entry.used_at = Some(at);
        Ok(MarkUsedOutcome::Marked)
    }

    async fn cleanup_expired(&self, now: OffsetDateTime) -> AuthResult<u64> {
        let before = self.codes.len();
        self.codes.retain(|_, code| !code.is_expired_at(now));
        Ok(before.saturating_sub(self.codes.len()) as u64)
    }
}
