//! Inputs to code issuance and code exchange.

use std::fmt;
use std::net::IpAddr;

use time::Duration;

use crate::delegation::DelegationId;
use crate::types::ScopeSet;

/// Input to `DelegationService::issue_authorization_code`.
#[derive(Debug, Clone)]
pub struct IssueCodeRequest {
    /// Delegation to bind the code to.
    pub delegation_id: DelegationId,
    /// Client requesting the code.
    pub client_id: String,
    /// Redirect URI the code will be delivered to.
    pub redirect_uri: String,
    /// Subject the code is for. Required for administrator delegations.
    pub subject: Option<String>,
    /// Narrower scope to redeem. Defaults to the delegation's scopes.
    pub scope: Option<ScopeSet>,
    /// `state` parameter from the authorization request.
    pub state: Option<String>,
    /// OpenID Connect nonce.
    pub nonce: Option<String>,
    /// PKCE code challenge.
    pub code_challenge: Option<String>,
    /// PKCE challenge method (`S256` or `plain`). Defaults to `S256`.
    pub code_challenge_method: Option<String>,
    /// Code lifetime. The configured default applies when unset or not positive.
    pub ttl: Option<Duration>,
}

impl IssueCodeRequest {
    /// Creates a request with only the required fields.
    pub fn new(
        delegation_id: DelegationId,
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            delegation_id,
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            subject: None,
            scope: None,
            state: None,
            nonce: None,
            code_challenge: None,
            code_challenge_method: None,
            ttl: None,
        }
    }

    /// Attaches a PKCE challenge.
    #[must_use]
    pub fn with_pkce(mut self, challenge: impl Into<String>, method: impl Into<String>) -> Self {
        self.code_challenge = Some(challenge.into());
        self.code_challenge_method = Some(method.into());
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Narrows the redeemed scope.
    #[must_use]
    pub fn with_scope(mut self, scope: ScopeSet) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Narrows the redeemed scope from a space-delimited string.
    #[must_use]
    pub fn with_scope_str(self, scope: &str) -> Self {
        self.with_scope(ScopeSet::parse(scope))
    }

    /// Sets the `state` parameter.
    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Sets the OpenID Connect nonce.
    #[must_use]
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Sets the code lifetime.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// Input to `DelegationService::exchange_code_for_tokens`.
#[derive(Clone)]
pub struct ExchangeRequest {
    /// The authorization code.
    pub code: String,
    /// Client redeeming the code.
    pub client_id: String,
    /// Client secret, for confidential clients.
    pub client_secret: Option<String>,
    /// Redirect URI; must equal the one recorded at issuance.
    pub redirect_uri: String,
    /// PKCE code verifier.
    pub code_verifier: Option<String>,
    /// Requested token audience.
    pub audience: Option<String>,
    /// Caller IP address, when known.
    pub caller_ip: Option<IpAddr>,
}

impl ExchangeRequest {
    /// Creates a request with only the required fields.
    pub fn new(
        code: impl Into<String>,
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: redirect_uri.into(),
            code_verifier: None,
            audience: None,
            caller_ip: None,
        }
    }

    /// Sets the client secret.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Sets the PKCE code verifier.
    #[must_use]
    pub fn with_verifier(mut self, verifier: impl Into<String>) -> Self {
        self.code_verifier = Some(verifier.into());
        self
    }

    /// Sets the requested audience.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Sets the caller IP address.
    #[must_use]
    pub fn with_caller_ip(mut self, ip: IpAddr) -> Self {
        self.caller_ip = Some(ip);
        self
    }
}

// Keeps the code, secret and verifier out of logs.
impl fmt::Debug for ExchangeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeRequest")
            .field("code", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("redirect_uri", &self.redirect_uri)
            .field(
                "code_verifier",
                &self.code_verifier.as_ref().map(|_| "[REDACTED]"),
            )
            .field("audience", &self.audience)
            .field("caller_ip", &self.caller_ip)
            .finish()
    }
}
