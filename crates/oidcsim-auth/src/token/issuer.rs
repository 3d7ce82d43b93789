//! Token minting interfaces.
//!
//! The delegation service never formats tokens itself. After a code has been
//! redeemed it asks a [`TokenIssuer`] for access and refresh tokens and, for
//! OpenID-scoped delegations, an [`IdTokenIssuer`] for the ID token.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::AuthResult;
use crate::delegation::Delegation;

/// A minted access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The bearer credential.
    pub token: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
}

/// Mints access and refresh tokens for a redeemed delegation.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Mints an access token for `subject` under `delegation`.
    ///
    /// `audience` is the resource server requested at exchange, if any.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenIssuance` if minting fails.
    async fn mint_access(
        &self,
        delegation: &Delegation,
        subject: &str,
        audience: Option<&str>,
        now: OffsetDateTime,
    ) -> AuthResult<AccessToken>;

    /// Mints a refresh token for `subject` under `delegation`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenIssuance` if minting fails.
    async fn mint_refresh(
        &self,
        delegation: &Delegation,
        subject: &str,
        now: OffsetDateTime,
    ) -> AuthResult<String>;
}

/// Mints OpenID Connect ID tokens.
#[async_trait]
pub trait IdTokenIssuer: Send + Sync {
    /// Mints an ID token for `subject`, addressed to the delegation's client.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenIssuance` if minting fails.
    async fn issue_id_token(
        &self,
        delegation: &Delegation,
        subject: &str,
        nonce: Option<&str>,
        now: OffsetDateTime,
    ) -> AuthResult<String>;
}

/// The result of a successful code exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Access token.
    pub access_token: String,

    /// Always `Bearer`.
    pub token_type: String,

    /// Access token lifetime in seconds.
    pub expires_in: u64,

    /// Refresh token.
    pub refresh_token: String,

    /// ID token, present when the redeemed scopes include `openid`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Granted scopes, sorted.
    pub scopes: Vec<String>,
}

impl TokenSet {
    /// Returns the scopes in their space-delimited wire form.
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}
