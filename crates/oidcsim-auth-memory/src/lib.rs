//! In-memory storage backend for oidcsim-auth.
//!
//! Provides `DashMap`-backed implementations of:
//!
//! - [`DelegationStorage`](oidcsim_auth::DelegationStorage) (delegations and
//!   revocation tombstones)
//! - [`AuthorizationCodeStorage`](oidcsim_auth::AuthorizationCodeStorage)
//!   (atomic single-use redemption)
//! - [`ClientRegistry`](oidcsim_auth::ClientRegistry) (client registrations)
//!
//! Data lives for the lifetime of the process.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use oidcsim_auth::{DelegationService, DelegationServiceConfig, SystemClock};
//! use oidcsim_auth_memory::MemoryAuthStorage;
//!
//! let storage = MemoryAuthStorage::new();
//! storage.clients().register(client)?;
//!
//! let service = DelegationService::new(
//!     storage.delegations(),
//!     storage.codes(),
//!     storage.clients(),
//!     token_issuer,
//!     Arc::new(SystemClock),
//!     DelegationServiceConfig::default(),
//! );
//! ```

pub mod client;
pub mod code;
pub mod delegation;

use std::sync::Arc;

pub use client::MemoryClientRegistry;
pub use code::MemoryAuthorizationCodeStorage;
pub use delegation::MemoryDelegationStorage;

/// Bundle of the in-memory backends, sharing nothing but a lifetime.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuthStorage {
    delegations: Arc<MemoryDelegationStorage>,
    codes: Arc<MemoryAuthorizationCodeStorage>,
    clients: Arc<MemoryClientRegistry>,
}

impl MemoryAuthStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delegation storage.
    #[must_use]
    pub fn delegations(&self) -> Arc<MemoryDelegationStorage> {
        Arc::clone(&self.delegations)
    }

    /// Authorization code storage.
    #[must_use]
    pub fn codes(&self) -> Arc<MemoryAuthorizationCodeStorage> {
        Arc::clone(&self.codes)
    }

    /// Client registry.
    #[must_use]
    pub fn clients(&self) -> Arc<MemoryClientRegistry> {
        Arc::clone(&self.clients)
    }
}
