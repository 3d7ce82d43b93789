//! Authorization codes.
//!
//! An authorization code binds a delegation to one redirect attempt. It is
//! issued once, redeemed at most once, and is terminal once used or expired.
//!
//! # Security
//!
//! - The code value is 256 bits of randomness, base64url-encoded, and carries
//!   no decodable structure
//! - The PKCE challenge is stored for verification at token exchange
//! - Redemption state is only changed through the storage layer's atomic
//!   mark-used operation

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use super::pkce::PkceChallengeMethod;
use crate::delegation::DelegationId;
use crate::types::ScopeSet;

/// A stored authorization code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationCode {
    /// The opaque code value handed to the client.
    pub code: String,

    /// Delegation this code redeems.
    pub delegation_id: DelegationId,

    /// Client the code was issued to.
    pub client_id: String,

    /// Subject the tokens will be issued for.
    pub subject: String,

    /// Redirect URI recorded at issuance.
    pub redirect_uri: String,

    /// Scopes the code redeems.
    pub scope: ScopeSet,

    /// `state` parameter from the authorization request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// OpenID Connect nonce for ID token binding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// PKCE code challenge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pkce_challenge: Option<String>,

    /// PKCE challenge method. Meaningful only with a challenge.
    #[serde(default)]
    pub pkce_challenge_method: PkceChallengeMethod,

    /// When the code was issued.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the code stops being redeemable. Always `created_at + ttl`.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// When the code was redeemed.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub used_at: Option<OffsetDateTime>,
}

impl AuthorizationCode {
    /// Generates a new authorization code value.
    ///
    /// 32 random bytes, base64url without padding (43 characters).
    #[must_use]
    pub fn generate_code() -> String {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Computes the expiry for a code created at `now` with `ttl`.
    ///
    /// Returns `None` when the result is not a representable date.
    #[must_use]
    pub fn expiry(now: OffsetDateTime, ttl: Duration) -> Option<OffsetDateTime> {
        now.checked_add(ttl)
    }

    /// Returns `true` if `now` is past the expiry.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }

    /// Returns `true` once the code has been redeemed.
    #[must_use]
    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }

    /// Returns `true` if the code may still be redeemed at `now`.
    #[must_use]
    pub fn is_redeemable_at(&self, now: OffsetDateTime) -> bool {
        !self.is_used() && !self.is_expired_at(now)
    }

    /// Returns `true` if the code carries a PKCE challenge.
    #[must_use]
    pub fn has_pkce(&self) -> bool {
        self.pkce_challenge.is_some()
    }
}
