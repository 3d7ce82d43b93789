//! Delegation and token configuration.
//!
//! This module provides the configuration types for the delegation core:
//! authorization code and token lifetimes, PKCE policy, and token signing.
//! Locating and reading the configuration file is left to the embedding
//! process; [`AuthConfig::from_toml_str`] only parses and validates.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound for every configured lifetime (one year).
pub const MAX_LIFETIME: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// Root delegation and token configuration.
///
/// # Example (TOML)
///
/// ```toml
/// issuer = "https://idp.example.com"
///
/// [oauth]
/// authorization_code_lifetime = "5m"
/// access_token_lifetime = "1h"
///
/// [pkce]
/// allow_plain = false
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Issuer URL (used in token `iss` claim).
    pub issuer: String,

    /// Code and token lifetimes.
    pub oauth: OAuthConfig,

    /// PKCE policy.
    pub pkce: PkceConfig,

    /// Token signing configuration.
    pub signing: SigningConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:8080".to_string(),
            oauth: OAuthConfig::default(),
            pkce: PkceConfig::default(),
            signing: SigningConfig::default(),
        }
    }
}

/// Authorization code and token lifetimes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// Authorization code lifetime, applied when a caller supplies no TTL.
    #[serde(with = "humantime_serde")]
    pub authorization_code_lifetime: Duration,

    /// Access token lifetime.
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// ID token lifetime.
    #[serde(with = "humantime_serde")]
    pub id_token_lifetime: Duration,

    /// Audience placed in access tokens when the exchange names none.
    /// Falls back to the issuer when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_audience: Option<String>,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            authorization_code_lifetime: Duration::from_secs(300), // 5 minutes
            access_token_lifetime: Duration::from_secs(3600),      // 1 hour
            id_token_lifetime: Duration::from_secs(3600),          // 1 hour
            default_audience: None,
        }
    }
}

/// PKCE policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PkceConfig {
    /// Accept the `plain` challenge method at code issuance.
    pub allow_plain: bool,
}

impl Default for PkceConfig {
    fn default() -> Self {
        Self { allow_plain: true }
    }
}

/// Token signing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Signing algorithm.
    /// Supported: "RS256", "RS384", "ES384"
    pub algorithm: String,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            algorithm: "RS384".to_string(),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),

    /// The configuration document could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

impl AuthConfig {
    /// Parses a TOML document and validates the result.
    ///
    /// Missing keys take their default values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the document is not valid TOML for
    /// this schema, or any error from [`AuthConfig::validate`].
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The issuer URL is empty
    /// - The signing algorithm is not supported
    /// - Any lifetime is zero or exceeds [`MAX_LIFETIME`]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::InvalidValue(
                "issuer cannot be empty".to_string(),
            ));
        }

        match self.signing.algorithm.as_str() {
            "RS256" | "RS384" | "ES384" => {}
            other => {
                return Err(ConfigError::InvalidValue(format!(
                    "Invalid signing algorithm: '{}'. Must be RS256, RS384, or ES384",
                    other
                )));
            }
        }

        let lifetimes = [
            (
                "authorization_code_lifetime",
                self.oauth.authorization_code_lifetime,
            ),
            ("access_token_lifetime", self.oauth.access_token_lifetime),
            ("id_token_lifetime", self.oauth.id_token_lifetime),
        ];
        for (name, lifetime) in lifetimes {
            if lifetime.is_zero() {
                return Err(ConfigError::InvalidValue(format!("{} must be > 0", name)));
            }
            if lifetime > MAX_LIFETIME {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must not exceed {}s",
                    name,
                    MAX_LIFETIME.as_secs()
                )));
            }
        }

        if matches!(self.oauth.default_audience.as_deref(), Some("")) {
            return Err(ConfigError::InvalidValue(
                "default_audience cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
