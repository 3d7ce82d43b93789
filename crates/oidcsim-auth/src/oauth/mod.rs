//! Authorization codes and the delegation service.
//!
//! # Authorization Code Flow
//!
//! - [`service`] - consent, code issuance, code exchange and revocation
//! - [`code`] - the authorization code entity
//! - [`pkce`] - PKCE challenge/verifier implementation
//! - [`request`] - issuance and exchange inputs
//!
//! # Example
//!
//! ```ignore
//! use oidcsim_auth::oauth::{ExchangeRequest, IssueCodeRequest, PkceChallenge, PkceVerifier};
//!
//! let verifier = PkceVerifier::generate();
//! let challenge = PkceChallenge::from_verifier(&verifier);
//!
//! let code = service
//!     .issue_authorization_code(
//!         IssueCodeRequest::new(delegation_id, "c1", "https://rp.example/cb")
//!             .with_pkce(challenge.as_str(), "S256"),
//!     )
//!     .await?;
//!
//! let tokens = service
//!     .exchange_code_for_tokens(
//!         &ExchangeRequest::new(code, "c1", "https://rp.example/cb")
//!             .with_verifier(verifier.as_str()),
//!     )
//!     .await?;
//! ```

pub mod code;
pub mod compare;
pub mod pkce;
pub mod request;
pub mod service;

pub use code::AuthorizationCode;
pub use compare::{constant_time_eq, constant_time_str_eq};
pub use pkce::{
    PkceChallenge, PkceChallengeMethod, PkceError, PkceVerifier, s256_challenge, verify_challenge,
};
pub use request::{ExchangeRequest, IssueCodeRequest};
pub use service::{DelegationService, DelegationServiceConfig};
