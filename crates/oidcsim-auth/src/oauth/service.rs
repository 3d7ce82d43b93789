//! Delegation service.
//!
//! Orchestrates the delegation and authorization-code lifecycle:
//!
//! 1. [`create_delegation_from_consent`](DelegationService::create_delegation_from_consent)
//!    turns an already-made consent decision into a persisted delegation
//! 2. [`issue_authorization_code`](DelegationService::issue_authorization_code)
//!    binds the delegation to one redirect attempt
//! 3. [`exchange_code_for_tokens`](DelegationService::exchange_code_for_tokens)
//!    validates and redeems the code, exactly once, into tokens
//! 4. [`revoke_delegation`](DelegationService::revoke_delegation) stops all
//!    future issuance and redemption
//!
//! All collaborators (storage, client policy, token issuers, clock) are
//! injected at construction.

use std::sync::Arc;

use time::Duration;
use tracing::{debug, info, warn};

use super::code::AuthorizationCode;
use super::compare::constant_time_str_eq;
use super::pkce::{PkceChallenge, PkceChallengeMethod, verify_challenge};
use super::request::{ExchangeRequest, IssueCodeRequest};
use crate::AuthResult;
use crate::clock::Clock;
use crate::config::{AuthConfig, ConfigError};
use crate::delegation::{ConsentRequest, ConsentType, Delegation, DelegationId};
use crate::error::AuthError;
use crate::storage::{
    AuthorizationCodeStorage, ClientRegistry, DelegationStorage, MarkUsedOutcome,
};
use crate::token::jwt_issuer::to_time_duration;
use crate::token::{IdTokenIssuer, TokenIssuer, TokenSet};

/// Delegation service configuration.
#[derive(Debug, Clone)]
pub struct DelegationServiceConfig {
    /// Authorization code lifetime applied when a request supplies none.
    pub authorization_code_lifetime: Duration,

    /// Accept the `plain` PKCE method at code issuance.
    pub allow_plain_pkce: bool,
}

impl Default for DelegationServiceConfig {
    fn default() -> Self {
        Self {
            authorization_code_lifetime: Duration::minutes(5),
            allow_plain_pkce: true,
        }
    }
}

impl DelegationServiceConfig {
    /// Sets the default authorization code lifetime.
    #[must_use]
    pub fn with_authorization_code_lifetime(mut self, lifetime: Duration) -> Self {
        self.authorization_code_lifetime = lifetime;
        self
    }

    /// Sets whether the `plain` PKCE method is accepted.
    #[must_use]
    pub fn with_allow_plain_pkce(mut self, allow: bool) -> Self {
        self.allow_plain_pkce = allow;
        self
    }
}

impl TryFrom<&AuthConfig> for DelegationServiceConfig {
    type Error = ConfigError;

    fn try_from(config: &AuthConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            authorization_code_lifetime: to_time_duration(
                "authorization_code_lifetime",
                config.oauth.authorization_code_lifetime,
            )?,
            allow_plain_pkce: config.pkce.allow_plain,
        })
    }
}

/// Delegation and authorization-code lifecycle service.
///
/// Thread-safe; share it behind an `Arc` across request handlers.
pub struct DelegationService {
    delegations: Arc<dyn DelegationStorage>,
    codes: Arc<dyn AuthorizationCodeStorage>,
    clients: Arc<dyn ClientRegistry>,
    token_issuer: Arc<dyn TokenIssuer>,
    id_token_issuer: Option<Arc<dyn IdTokenIssuer>>,
    clock: Arc<dyn Clock>,
    config: DelegationServiceConfig,
}

impl DelegationService {
    /// Creates a new delegation service.
    ///
    /// Without an ID token issuer (see
    /// [`with_id_token_issuer`](Self::with_id_token_issuer)), codes carrying
    /// the `openid` scope cannot be redeemed.
    #[must_use]
    pub fn new(
        delegations: Arc<dyn DelegationStorage>,
        codes: Arc<dyn AuthorizationCodeStorage>,
        clients: Arc<dyn ClientRegistry>,
        token_issuer: Arc<dyn TokenIssuer>,
        clock: Arc<dyn Clock>,
        config: DelegationServiceConfig,
    ) -> Self {
        Self {
            delegations,
            codes,
            clients,
            token_issuer,
            id_token_issuer: None,
            clock,
            config,
        }
    }

    /// Sets the ID token issuer used for OpenID-scoped redemptions.
    #[must_use]
    pub fn with_id_token_issuer(mut self, issuer: Arc<dyn IdTokenIssuer>) -> Self {
        self.id_token_issuer = Some(issuer);
        self
    }

    /// Returns the service configuration.
    #[must_use]
    pub fn config(&self) -> &DelegationServiceConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Consent
    // -------------------------------------------------------------------------

    /// Persists a delegation for a consent decision the caller already obtained.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` for an empty client, subject or scope set
    /// - `ScopeNotAllowed` if the client may not be granted every requested
    ///   scope (no partial grants)
    pub async fn create_delegation_from_consent(
        &self,
        request: ConsentRequest,
    ) -> AuthResult<DelegationId> {
        request.validate()?;

        if !self
            .clients
            .allows_scopes(&request.client_id, &request.scopes)
            .await?
        {
            debug!(
                client_id = %request.client_id,
                scope = %request.scopes,
                "Consent rejected: scopes not allowed for client"
            );
            return Err(AuthError::ScopeNotAllowed);
        }

        let delegation = Delegation::from_consent(request, self.clock.now());
        self.delegations.save(&delegation).await?;

        info!(
            delegation_id = %delegation.id,
            client_id = %delegation.client_id,
            consent_type = %delegation.consent_type,
            scope = %delegation.scopes,
            "Delegation created"
        );

        Ok(delegation.id)
    }

    // -------------------------------------------------------------------------
    // Code issuance
    // -------------------------------------------------------------------------

    /// Issues an authorization code bound to a delegation and redirect URI.
    ///
    /// Returns the opaque code value; nothing else is exposed to the client.
    ///
    /// # Errors
    ///
    /// - `DelegationNotFound` if the delegation does not exist
    /// - `ClientBindingFailed` if it belongs to another client
    /// - `RevokedDelegation` / `ExpiredDelegation` if it is not active
    /// - `RedirectNotAllowed` if the redirect URI is not registered
    /// - `SubjectNotCovered` if the subject is not covered by the delegation
    /// - `ScopeNotAllowed` if the narrowed scope exceeds the delegation
    /// - `InvalidRequest` for malformed or disallowed PKCE parameters
    pub async fn issue_authorization_code(&self, request: IssueCodeRequest) -> AuthResult<String> {
        let now = self.clock.now();

        let delegation = self
            .delegations
            .find_by_id(&request.delegation_id)
            .await?
            .ok_or(AuthError::DelegationNotFound)?;

        if delegation.client_id != request.client_id {
            return Err(AuthError::ClientBindingFailed);
        }

        delegation.is_active_at(now)?;

        if !self
            .clients
            .is_redirect_allowed(&request.client_id, &request.redirect_uri)
            .await?
        {
            return Err(AuthError::RedirectNotAllowed);
        }

        let subject = resolve_subject(&delegation, request.subject.as_deref())?;

        let scope = match request.scope {
            Some(scope) if !delegation.scopes.contains_all(&scope) => {
                return Err(AuthError::ScopeNotAllowed);
            }
            Some(scope) if !scope.is_empty() => scope,
            _ => delegation.scopes.clone(),
        };

        let pkce = self.parse_pkce(
            request.code_challenge,
            request.code_challenge_method.as_deref(),
        )?;
        let (pkce_challenge, pkce_challenge_method) = match pkce {
            Some(challenge) => {
                let (value, method) = challenge.into_parts();
                (Some(value), method)
            }
            None => (None, PkceChallengeMethod::default()),
        };

        let ttl = request
            .ttl
            .filter(|ttl| ttl.is_positive())
            .unwrap_or(self.config.authorization_code_lifetime);
        let expires_at = AuthorizationCode::expiry(now, ttl)
            .ok_or_else(|| AuthError::invalid_request("authorization code ttl is out of range"))?;

        let code = AuthorizationCode {
            code: AuthorizationCode::generate_code(),
            delegation_id: delegation.id.clone(),
            client_id: request.client_id,
            subject,
            redirect_uri: request.redirect_uri,
            scope,
            state: request.state,
            nonce: request.nonce,
            pkce_challenge,
            pkce_challenge_method,
            created_at: now,
            expires_at,
            used_at: None,
        };
        self.codes.issue(&code).await?;

        debug!(
            delegation_id = %delegation.id,
            client_id = %code.client_id,
            pkce = code.has_pkce(),
            expires_at = %code.expires_at,
            "Authorization code issued"
        );

        Ok(code.code)
    }

    fn parse_pkce(
        &self,
        challenge: Option<String>,
        method: Option<&str>,
    ) -> AuthResult<Option<PkceChallenge>> {
        let Some(challenge) = challenge else {
            if method.is_some() {
                return Err(AuthError::invalid_request(
                    "code_challenge_method requires code_challenge",
                ));
            }
            return Ok(None);
        };

        let method = match method {
            Some(method) => PkceChallengeMethod::parse(method)?,
            None => PkceChallengeMethod::S256,
        };
        if method == PkceChallengeMethod::Plain && !self.config.allow_plain_pkce {
            return Err(AuthError::invalid_request(
                "plain code_challenge_method is not allowed",
            ));
        }

        Ok(Some(PkceChallenge::new(challenge, method)?))
    }

    // -------------------------------------------------------------------------
    // Code exchange
    // -------------------------------------------------------------------------

    /// Validates and redeems an authorization code.
    ///
    /// Checks run in order and stop at the first failure. Exactly one of any
    /// number of concurrent exchanges of the same code succeeds.
    ///
    /// # Errors
    ///
    /// - `CodeInvalid` if the code is unknown
    /// - `ClientBindingFailed` if the code was issued to another client
    /// - `RedirectMismatch` if the redirect URI differs from issuance
    /// - `CodeUsedOrExpired` if the code was redeemed or has expired
    /// - `InvalidClientSecret` if a presented secret is wrong, or no secret
    ///   was presented for a code without PKCE
    /// - `PkceVerificationFailed` if the verifier is missing or wrong
    /// - any delegation error from validation at redemption time
    pub async fn exchange_code_for_tokens(&self, request: &ExchangeRequest) -> AuthResult<TokenSet> {
        self.exchange(request).await.inspect_err(|e| {
            if e.is_domain_error() {
                warn!(
                    client_id = %request.client_id,
                    error = %e,
                    category = %e.category(),
                    "Code exchange rejected"
                );
            }
        })
    }

    async fn exchange(&self, request: &ExchangeRequest) -> AuthResult<TokenSet> {
        let now = self.clock.now();

        // 1. Fetch
        let code = self
            .codes
            .get_for_redemption(&request.code)
            .await?
            .ok_or(AuthError::CodeInvalid)?;

        // 2. Client binding
        if code.client_id != request.client_id {
            return Err(AuthError::ClientBindingFailed);
        }

        // 3. Redirect URI
        if !constant_time_str_eq(&code.redirect_uri, &request.redirect_uri) {
            return Err(AuthError::RedirectMismatch);
        }

        // 4. Unused and unexpired (re-checked atomically by mark_used)
        if !code.is_redeemable_at(now) {
            return Err(AuthError::CodeUsedOrExpired);
        }

        // 5. Client authentication
        match request.client_secret.as_deref() {
            Some(secret) => {
                if !self.clients.verify_secret(&request.client_id, secret).await? {
                    return Err(AuthError::InvalidClientSecret);
                }
            }
            None if !code.has_pkce() => return Err(AuthError::InvalidClientSecret),
            None => {}
        }

        // 6. PKCE
        if let Some(challenge) = code.pkce_challenge.as_deref() {
            let verifier = request
                .code_verifier
                .as_deref()
                .ok_or(AuthError::PkceVerificationFailed)?;
            verify_challenge(challenge, code.pkce_challenge_method, verifier)?;
        }

        // 7. Delegation
        let delegation = self
            .delegations
            .find_by_id(&code.delegation_id)
            .await?
            .ok_or(AuthError::DelegationNotFound)?;
        delegation.validate(now, &code.scope, request.audience.as_deref(), request.caller_ip)?;

        let id_token_issuer = if code.scope.is_openid() {
            let issuer = self.id_token_issuer.as_ref().ok_or_else(|| {
                AuthError::configuration("openid scope requested but no ID token issuer is configured")
            })?;
            Some(issuer)
        } else {
            None
        };

        // 8. Redeem
        match self.codes.mark_used(&code.code, now).await? {
            MarkUsedOutcome::Marked => {}
            MarkUsedOutcome::AlreadyUsed | MarkUsedOutcome::Expired => {
                return Err(AuthError::CodeUsedOrExpired);
            }
            MarkUsedOutcome::NotFound => return Err(AuthError::CodeInvalid),
        }

        info!(
            delegation_id = %delegation.id,
            client_id = %code.client_id,
            scope = %code.scope,
            "Authorization code redeemed"
        );

        // 9. Mint
        let granted = delegation.narrowed_to(&code.scope);
        let access = self
            .token_issuer
            .mint_access(&granted, &code.subject, request.audience.as_deref(), now)
            .await?;
        let refresh_token = self
            .token_issuer
            .mint_refresh(&granted, &code.subject, now)
            .await?;
        let id_token = match id_token_issuer {
            Some(issuer) => Some(
                issuer
                    .issue_id_token(&granted, &code.subject, code.nonce.as_deref(), now)
                    .await?,
            ),
            None => None,
        };

        Ok(TokenSet {
            access_token: access.token,
            token_type: "Bearer".to_string(),
            expires_in: access.expires_in,
            refresh_token,
            id_token,
            scopes: granted.scopes.to_vec(),
        })
    }

    // -------------------------------------------------------------------------
    // Revocation and reads
    // -------------------------------------------------------------------------

    /// Revokes a delegation from now on.
    ///
    /// Idempotent: revoking an already-revoked delegation succeeds and keeps
    /// the original revocation time. Tokens already minted are not affected.
    ///
    /// # Errors
    ///
    /// Returns `DelegationNotFound` if the delegation does not exist.
    pub async fn revoke_delegation(&self, id: &DelegationId) -> AuthResult<()> {
        let now = self.clock.now();
        let delegation = self
            .delegations
            .revoke(id, now)
            .await?
            .ok_or(AuthError::DelegationNotFound)?;

        if delegation.revoked_at == Some(now) {
            info!(
                delegation_id = %delegation.id,
                client_id = %delegation.client_id,
                "Delegation revoked"
            );
        } else {
            debug!(delegation_id = %delegation.id, "Delegation already revoked");
        }
        Ok(())
    }

    /// Fetches a delegation, revoked or not.
    ///
    /// # Errors
    ///
    /// Returns `DelegationNotFound` if the delegation does not exist.
    pub async fn get_delegation(&self, id: &DelegationId) -> AuthResult<Delegation> {
        self.delegations
            .find_by_id(id)
            .await?
            .ok_or(AuthError::DelegationNotFound)
    }

    /// Lists the user-consent delegations a subject has granted, revoked ones
    /// included.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn list_delegations_for_subject(&self, subject: &str) -> AuthResult<Vec<Delegation>> {
        let mut delegations = self.delegations.list_by_subject(subject).await?;
        delegations.retain(|d| d.consent_type == ConsentType::User);
        delegations.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(delegations)
    }

    /// Checks that a delegation still backs a refresh for `client_id`.
    ///
    /// # Errors
    ///
    /// - `DelegationNotFound` if the delegation does not exist
    /// - `ClientBindingFailed` if it belongs to another client
    /// - `RevokedDelegation` / `ExpiredDelegation` if it is not active
    pub async fn validate_delegation_for_refresh(
        &self,
        id: &DelegationId,
        client_id: &str,
    ) -> AuthResult<Delegation> {
        let delegation = self.get_delegation(id).await?;
        if delegation.client_id != client_id {
            return Err(AuthError::ClientBindingFailed);
        }
        delegation.is_active_at(self.clock.now())?;
        Ok(delegation)
    }

    /// Removes authorization codes that expired before now, used or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn cleanup_expired_codes(&self) -> AuthResult<u64> {
        let removed = self.codes.cleanup_expired(self.clock.now()).await?;
        if removed > 0 {
            debug!(removed, "Expired authorization codes removed");
        }
        Ok(removed)
    }
}

/// Determines the subject a code is issued for.
fn resolve_subject(delegation: &Delegation, requested: Option<&str>) -> AuthResult<String> {
    match (&delegation.subject, requested) {
        (Some(own), None) => Ok(own.clone()),
        (Some(own), Some(requested)) if own == requested => Ok(own.clone()),
        (None, Some(requested)) if delegation.covers_subject(requested) => {
            Ok(requested.to_string())
        }
        _ => Err(AuthError::SubjectNotCovered),
    }
}
