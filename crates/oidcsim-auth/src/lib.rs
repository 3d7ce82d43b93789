//! # oidcsim-auth
//!
//! Delegation and authorization-code lifecycle for the oidcsim identity
//! provider.
//!
//! This crate provides:
//! - Persisted consent records (delegations) with scope, audience, IP and
//!   time-window constraints
//! - Single-use, short-lived authorization codes bound to a redirect URI and
//!   an optional PKCE challenge
//! - Exactly-once code redemption into access, refresh and ID tokens
//! - Monotonic, idempotent delegation revocation
//!
//! ## Overview
//!
//! [`DelegationService`] is the entry point. It receives its collaborators at
//! construction: storage ([`storage`]), client policy, token issuers
//! ([`token`]) and a [`Clock`]. Nothing is looked up through global state.
//!
//! ## Modules
//!
//! - [`config`] - Configuration
//! - [`delegation`] - Delegations and consent decisions
//! - [`oauth`] - Authorization codes, PKCE and the delegation service
//! - [`token`] - Token issuer interfaces and the JWT implementation
//! - [`storage`] - Storage traits for delegations, codes and clients
//! - [`types`] - Scope sets, constraints, time windows, clients
//! - [`secret`] - Client secret generation and hashing
//! - [`clock`] - Injectable time source

pub mod clock;
pub mod config;
pub mod delegation;
pub mod error;
pub mod oauth;
pub mod secret;
pub mod storage;
pub mod token;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AuthConfig, ConfigError};
pub use delegation::{ConsentGrantee, ConsentRequest, ConsentType, Delegation, DelegationId, SubjectSelector};
pub use error::{AuthError, ErrorCategory};
pub use oauth::{
    AuthorizationCode, DelegationService, DelegationServiceConfig, ExchangeRequest,
    IssueCodeRequest, PkceChallenge, PkceChallengeMethod, PkceError, PkceVerifier,
};
pub use storage::{AuthorizationCodeStorage, ClientRegistry, DelegationStorage, MarkUsedOutcome};
pub use token::{
    AccessToken, IdTokenIssuer, JwtService, JwtTokenIssuer, SigningAlgorithm, SigningKeyPair,
    TokenConfig, TokenIssuer, TokenSet,
};
pub use types::{Client, ClientValidationError, Constraints, ScopeSet, TimeWindow};

/// Type alias for delegation and code-exchange results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use oidcsim_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::config::{AuthConfig, ConfigError};
    pub use crate::delegation::{
        ConsentRequest, ConsentType, Delegation, DelegationId, SubjectSelector,
    };
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::oauth::{
        DelegationService, DelegationServiceConfig, ExchangeRequest, IssueCodeRequest,
        PkceChallenge, PkceChallengeMethod, PkceVerifier,
    };
    pub use crate::storage::{
        AuthorizationCodeStorage, ClientRegistry, DelegationStorage, MarkUsedOutcome,
    };
    pub use crate::token::{IdTokenIssuer, JwtTokenIssuer, TokenIssuer, TokenSet};
    pub use crate::types::{Client, Constraints, ScopeSet, TimeWindow};
}
