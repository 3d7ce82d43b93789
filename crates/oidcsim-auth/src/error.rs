//! Delegation and authorization-code error types.
//!
//! This module defines every error that can occur while creating delegations,
//! issuing authorization codes, redeeming them for tokens, and revoking
//! delegations.
//!
//! Domain errors describe a request that is invalid or no longer valid; retrying
//! the identical request cannot succeed. Infrastructure errors (storage, token
//! minting) are opaque failures the caller may classify as transient.

use std::fmt;

/// Errors that can occur during delegation and code-exchange operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The referenced delegation does not exist.
    #[error("Delegation not found")]
    DelegationNotFound,

    /// The requested scopes exceed what the client or delegation allows.
    #[error("Requested scopes exceed allowed set")]
    ScopeNotAllowed,

    /// The requested token audience is not permitted by the delegation.
    #[error("Audience not allowed")]
    AudienceNotAllowed,

    /// The caller IP address is outside the delegation's allowed ranges.
    #[error("IP not allowed by constraints")]
    IpNotAllowed,

    /// The delegation is outside its validity window.
    #[error("Delegation expired")]
    ExpiredDelegation,

    /// The delegation has been revoked.
    #[error("Delegation revoked")]
    RevokedDelegation,

    /// The delegation or code belongs to a different client.
    #[error("Not bound to this client")]
    ClientBindingFailed,

    /// The subject is not covered by the delegation.
    #[error("Subject not covered by delegation")]
    SubjectNotCovered,

    /// The redirect URI is not registered for the client.
    #[error("Redirect URI not allowed")]
    RedirectNotAllowed,

    /// The redirect URI differs from the one recorded at issuance.
    #[error("Redirect URI mismatch")]
    RedirectMismatch,

    /// The authorization code is unknown.
    #[error("Authorization code invalid")]
    CodeInvalid,

    /// The authorization code was already redeemed or has expired.
    #[error("Authorization code used or expired")]
    CodeUsedOrExpired,

    /// The presented client secret is wrong, or the client did not
    /// authenticate at all.
    #[error("Invalid client secret")]
    InvalidClientSecret,

    /// PKCE code verifier does not match the code challenge.
    #[error("PKCE verification failed")]
    PkceVerificationFailed,

    /// The request is malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// An error occurred while storing or retrieving delegation data.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// A token issuer failed to mint a token.
    #[error("Token issuance error: {message}")]
    TokenIssuance {
        /// Description of the minting failure.
        message: String,
    },

    /// The configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `TokenIssuance` error.
    #[must_use]
    pub fn token_issuance(message: impl Into<String>) -> Self {
        Self::TokenIssuance {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a caller-visible domain error.
    ///
    /// Domain errors are never retried: the identical request cannot succeed.
    #[must_use]
    pub fn is_domain_error(&self) -> bool {
        !self.is_infrastructure_error()
    }

    /// Returns `true` if this is an infrastructure failure
    /// (storage, minting, configuration, internal).
    #[must_use]
    pub fn is_infrastructure_error(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. }
                | Self::TokenIssuance { .. }
                | Self::Configuration { .. }
                | Self::Internal { .. }
        )
    }

    /// Returns `true` if this error concerns the delegation itself.
    #[must_use]
    pub fn is_delegation_error(&self) -> bool {
        matches!(
            self,
            Self::DelegationNotFound
                | Self::ExpiredDelegation
                | Self::RevokedDelegation
                | Self::ScopeNotAllowed
                | Self::AudienceNotAllowed
                | Self::IpNotAllowed
                | Self::SubjectNotCovered
        )
    }

    /// Returns `true` if this error concerns the authorization code.
    #[must_use]
    pub fn is_code_error(&self) -> bool {
        matches!(
            self,
            Self::CodeInvalid
                | Self::CodeUsedOrExpired
                | Self::RedirectMismatch
                | Self::PkceVerificationFailed
        )
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DelegationNotFound
            | Self::ExpiredDelegation
            | Self::RevokedDelegation
            | Self::SubjectNotCovered => ErrorCategory::Delegation,
            Self::ScopeNotAllowed | Self::AudienceNotAllowed | Self::IpNotAllowed => {
                ErrorCategory::Constraint
            }
            Self::CodeInvalid
            | Self::CodeUsedOrExpired
            | Self::RedirectMismatch
            | Self::PkceVerificationFailed => ErrorCategory::Grant,
            Self::ClientBindingFailed
            | Self::RedirectNotAllowed
            | Self::InvalidClientSecret => ErrorCategory::Client,
            Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::Storage { .. } | Self::TokenIssuance { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the OAuth 2.0 error code for this error.
    ///
    /// Code, PKCE, redirect and delegation problems map to `invalid_grant`;
    /// client authentication problems map to `invalid_client`.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::DelegationNotFound
            | Self::AudienceNotAllowed
            | Self::IpNotAllowed
            | Self::ExpiredDelegation
            | Self::RevokedDelegation
            | Self::SubjectNotCovered
            | Self::RedirectMismatch
            | Self::CodeInvalid
            | Self::CodeUsedOrExpired
            | Self::PkceVerificationFailed => "invalid_grant",
            Self::ScopeNotAllowed => "invalid_scope",
            Self::ClientBindingFailed | Self::InvalidClientSecret => "invalid_client",
            Self::RedirectNotAllowed | Self::InvalidRequest { .. } => "invalid_request",
            Self::Storage { .. }
            | Self::TokenIssuance { .. }
            | Self::Configuration { .. }
            | Self::Internal { .. } => "server_error",
        }
    }
}

/// Categories of delegation errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Delegation lifecycle (missing, expired, revoked).
    Delegation,
    /// Scope, audience and IP constraints.
    Constraint,
    /// Authorization code redemption.
    Grant,
    /// Client binding and authentication.
    Client,
    /// Request validation errors.
    Validation,
    /// Storage and token-minting failures.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Internal errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delegation => write!(f, "delegation"),
            Self::Constraint => write!(f, "constraint"),
            Self::Grant => write!(f, "grant"),
            Self::Client => write!(f, "client"),
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            AuthError::CodeUsedOrExpired.to_string(),
            "Authorization code used or expired"
        );
        assert_eq!(
            AuthError::invalid_request("missing client_id").to_string(),
            "Invalid request: missing client_id"
        );
        assert_eq!(
            AuthError::storage("database down").to_string(),
            "Storage error: database down"
        );
    }

    #[test]
    fn test_error_predicates() {
        assert!(AuthError::RevokedDelegation.is_domain_error());
        assert!(AuthError::RevokedDelegation.is_delegation_error());
        assert!(!AuthError::RevokedDelegation.is_code_error());

        assert!(AuthError::PkceVerificationFailed.is_code_error());
        assert!(!AuthError::PkceVerificationFailed.is_infrastructure_error());

        let err = AuthError::token_issuance("signing key unavailable");
        assert!(err.is_infrastructure_error());
        assert!(!err.is_domain_error());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            AuthError::ExpiredDelegation.category(),
            ErrorCategory::Delegation
        );
        assert_eq!(
            AuthError::IpNotAllowed.category(),
            ErrorCategory::Constraint
        );
        assert_eq!(AuthError::CodeInvalid.category(), ErrorCategory::Grant);
        assert_eq!(
            AuthError::InvalidClientSecret.category(),
            ErrorCategory::Client
        );
        assert_eq!(
            AuthError::storage("x").category(),
            ErrorCategory::Infrastructure
        );
    }

    #[test]
    fn test_oauth_error_code() {
        assert_eq!(AuthError::CodeInvalid.oauth_error_code(), "invalid_grant");
        assert_eq!(
            AuthError::CodeUsedOrExpired.oauth_error_code(),
            "invalid_grant"
        );
        assert_eq!(
            AuthError::PkceVerificationFailed.oauth_error_code(),
            "invalid_grant"
        );
        assert_eq!(
            AuthError::RedirectMismatch.oauth_error_code(),
            "invalid_grant"
        );
        assert_eq!(
            AuthError::RevokedDelegation.oauth_error_code(),
            "invalid_grant"
        );
        assert_eq!(
            AuthError::InvalidClientSecret.oauth_error_code(),
            "invalid_client"
        );
        assert_eq!(
            AuthError::ScopeNotAllowed.oauth_error_code(),
            "invalid_scope"
        );
        assert_eq!(
            AuthError::internal("boom").oauth_error_code(),
            "server_error"
        );
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Delegation.to_string(), "delegation");
        assert_eq!(ErrorCategory::Grant.to_string(), "grant");
        assert_eq!(ErrorCategory::Infrastructure.to_string(), "infrastructure");
    }
}
