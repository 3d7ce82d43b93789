//! Relying-party client registrations.
//!
//! A [`Client`] holds the policy the delegation core consults through a
//! `ClientRegistry`: which redirect URIs are registered, which scopes may be
//! consented to, and the hashed secret of a confidential client.

use serde::{Deserialize, Serialize};

use super::scope::ScopeSet;

// =============================================================================
// Client
// =============================================================================

/// A registered relying party.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Unique client identifier used in OAuth flows.
    pub client_id: String,

    /// Argon2-hashed client secret (PHC string), for confidential clients.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Human-readable display name.
    pub name: String,

    /// Registered redirect URIs. Matching is exact.
    #[serde(default)]
    pub redirect_uris: Vec<String>,

    /// Scopes this client may be granted. Empty means all scopes are allowed.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Whether this is a confidential client (has client secret).
    pub confidential: bool,

    /// Whether this client is currently active and can be used.
    pub active: bool,
}

impl Client {
    /// Creates an active public client with the given redirect URIs.
    #[must_use]
    pub fn public(
        client_id: impl Into<String>,
        name: impl Into<String>,
        redirect_uris: Vec<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            name: name.into(),
            redirect_uris,
            scopes: Vec::new(),
            confidential: false,
            active: true,
        }
    }

    /// Turns this registration into a confidential client with the given
    /// secret hash.
    #[must_use]
    pub fn with_secret_hash(mut self, hash: impl Into<String>) -> Self {
        self.client_secret = Some(hash.into());
        self.confidential = true;
        self
    }

    /// Restricts the scopes this client may be granted.
    #[must_use]
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Validates the client configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the client configuration is invalid.
    pub fn validate(&self) -> Result<(), ClientValidationError> {
        if self.client_id.is_empty() {
            return Err(ClientValidationError::EmptyClientId);
        }

        if self.name.is_empty() {
            return Err(ClientValidationError::EmptyName);
        }

        if self.confidential && self.client_secret.is_none() {
            return Err(ClientValidationError::MissingSecret);
        }

        if self.redirect_uris.is_empty() {
            return Err(ClientValidationError::NoRedirectUris);
        }

        if self.redirect_uris.iter().any(String::is_empty) {
            return Err(ClientValidationError::EmptyRedirectUri);
        }

        Ok(())
    }

    /// Checks if the given redirect URI is registered for this client.
    #[must_use]
    pub fn is_redirect_uri_allowed(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|allowed| allowed == uri)
    }

    /// Checks if the given scope is allowed for this client.
    ///
    /// An empty scopes list means all scopes are allowed.
    #[must_use]
    pub fn is_scope_allowed(&self, scope: &str) -> bool {
        self.scopes.is_empty() || self.scopes.iter().any(|allowed| allowed == scope)
    }

    /// Checks that every requested scope is allowed. No partial grants.
    #[must_use]
    pub fn allows_scopes(&self, requested: &ScopeSet) -> bool {
        requested.iter().all(|scope| self.is_scope_allowed(scope))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Errors that can occur during client validation.
#[derive(Debug, thiserror::Error)]
pub enum ClientValidationError {
    /// Client ID cannot be empty.
    #[error("Client ID cannot be empty")]
    EmptyClientId,

    /// Client name cannot be empty.
    #[error("Client name cannot be empty")]
    EmptyName,

    /// At least one redirect URI is required.
    #[error("At least one redirect URI is required")]
    NoRedirectUris,

    /// A registered redirect URI is empty.
    #[error("Redirect URIs cannot be empty")]
    EmptyRedirectUri,

    /// Confidential clients require a client secret.
    #[error("Confidential clients require a client secret")]
    MissingSecret,
}
