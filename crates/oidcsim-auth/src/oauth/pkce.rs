//! PKCE (Proof Key for Code Exchange), RFC 7636.
//!
//! Both the `S256` and `plain` challenge methods are understood; whether
//! `plain` is accepted at code issuance is a configuration decision
//! (`pkce.allow_plain`). Every comparison against a stored challenge is
//! constant-time.
//!
//! # Example
//!
//! ```
//! use oidcsim_auth::oauth::{PkceChallenge, PkceChallengeMethod, PkceVerifier};
//!
//! // Client generates a verifier and challenge
//! let verifier = PkceVerifier::generate();
//! let challenge = PkceChallenge::from_verifier(&verifier);
//!
//! // Server stores the challenge, later verifies the verifier from the token request
//! let stored = PkceChallenge::new(challenge.as_str(), PkceChallengeMethod::S256).unwrap();
//! assert!(stored.verify(verifier.as_str()).is_ok());
//! ```

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::compare::constant_time_str_eq;
use crate::error::AuthError;

/// Length of an unpadded base64url SHA-256 digest.
const S256_CHALLENGE_LEN: usize = 43;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during PKCE operations.
#[derive(Debug, thiserror::Error)]
pub enum PkceError {
    /// Verifier length is outside the valid range (43-128 characters).
    #[error("Invalid verifier length: must be 43-128 characters, got {0}")]
    InvalidVerifierLength(usize),

    /// Verifier contains invalid characters.
    #[error("Invalid verifier characters: must be URL-safe base64 ([A-Za-z0-9-._~])")]
    InvalidVerifierCharacters,

    /// Challenge format is invalid.
    #[error("Invalid challenge format: {0}")]
    InvalidChallengeFormat(&'static str),

    /// Unsupported challenge method.
    #[error("Unsupported challenge method: {0}")]
    UnsupportedMethod(String),

    /// PKCE verification failed (verifier doesn't match challenge).
    #[error("PKCE verification failed: verifier does not match challenge")]
    VerificationFailed,
}

impl PkceError {
    /// Create an `UnsupportedMethod` error.
    #[must_use]
    pub fn unsupported_method(method: impl Into<String>) -> Self {
        Self::UnsupportedMethod(method.into())
    }

    /// Returns `true` if this is a verifier validation error.
    #[must_use]
    pub fn is_verifier_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidVerifierLength(_) | Self::InvalidVerifierCharacters
        )
    }

    /// Returns `true` if this is a challenge validation error.
    #[must_use]
    pub fn is_challenge_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidChallengeFormat(_) | Self::UnsupportedMethod(_)
        )
    }

    /// Get the OAuth 2.0 error code for this error.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::InvalidVerifierLength(_)
            | Self::InvalidVerifierCharacters
            | Self::InvalidChallengeFormat(_)
            | Self::UnsupportedMethod(_) => "invalid_request",
            Self::VerificationFailed => "invalid_grant",
        }
    }
}

impl From<PkceError> for AuthError {
    fn from(err: PkceError) -> Self {
        match err {
            PkceError::VerificationFailed => AuthError::PkceVerificationFailed,
            other => AuthError::invalid_request(other.to_string()),
        }
    }
}

// =============================================================================
// PKCE Challenge Method
// =============================================================================

/// PKCE challenge method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PkceChallengeMethod {
    /// SHA-256 hash of the verifier.
    #[default]
    S256,
    /// The verifier itself.
    #[serde(rename = "plain")]
    Plain,
}

impl PkceChallengeMethod {
    /// Parse challenge method from its wire value.
    ///
    /// # Errors
    ///
    /// Returns `PkceError::UnsupportedMethod` for anything other than
    /// `S256` or `plain`.
    pub fn parse(method: &str) -> Result<Self, PkceError> {
        match method {
            "S256" => Ok(Self::S256),
            "plain" => Ok(Self::Plain),
            other => Err(PkceError::unsupported_method(other)),
        }
    }

    /// Get the method as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S256 => "S256",
            Self::Plain => "plain",
        }
    }
}

impl std::fmt::Display for PkceChallengeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// PKCE Verifier
// =============================================================================

/// An RFC 7636 code verifier: 43-128 characters from `[A-Za-z0-9-._~]`.
///
/// The exchange path compares whatever verifier string the client sends; this
/// type is for clients that want to produce conforming verifiers.
#[derive(Debug, Clone)]
pub struct PkceVerifier(String);

impl PkceVerifier {
    /// Create a new verifier from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Length is not between 43 and 128 characters
    /// - Contains characters other than `[A-Za-z0-9-._~]`
    pub fn new(verifier: String) -> Result<Self, PkceError> {
        let len = verifier.len();

        if !(43..=128).contains(&len) {
            return Err(PkceError::InvalidVerifierLength(len));
        }

        if !verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' || c == '~')
        {
            return Err(PkceError::InvalidVerifierCharacters);
        }

        Ok(Self(verifier))
    }

    /// Generate a cryptographically random verifier.
    ///
    /// 32 random bytes, base64url-encoded (43 characters).
    #[must_use]
    pub fn generate() -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let bytes: [u8; 32] = rng.r#gen();
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Get the verifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the verifier and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for PkceVerifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// PKCE Challenge
// =============================================================================

/// A stored code challenge together with its method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge {
    value: String,
    method: PkceChallengeMethod,
}

/// Computes `BASE64URL(SHA256(ASCII(verifier)))`.
#[must_use]
pub fn s256_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

impl PkceChallenge {
    /// Create an S256 challenge from a verifier.
    #[must_use]
    pub fn from_verifier(verifier: &PkceVerifier) -> Self {
        Self {
            value: s256_challenge(verifier.as_str()),
            method: PkceChallengeMethod::S256,
        }
    }

    /// Create a challenge from the raw value received from a client.
    ///
    /// # Errors
    ///
    /// Returns `PkceError::InvalidChallengeFormat` if the value is empty, or
    /// for `S256`, if it is not an unpadded base64url SHA-256 digest.
    pub fn new(challenge: impl Into<String>, method: PkceChallengeMethod) -> Result<Self, PkceError> {
        let value = challenge.into();
        if value.is_empty() {
            return Err(PkceError::InvalidChallengeFormat("challenge is empty"));
        }
        if method == PkceChallengeMethod::S256 {
            if value.len() != S256_CHALLENGE_LEN {
                return Err(PkceError::InvalidChallengeFormat(
                    "S256 challenge must be 43 characters",
                ));
            }
            if URL_SAFE_NO_PAD.decode(&value).is_err() {
                return Err(PkceError::InvalidChallengeFormat(
                    "S256 challenge must be base64url",
                ));
            }
        }
        Ok(Self { value, method })
    }

    /// Verify that a verifier matches this challenge.
    ///
    /// # Errors
    ///
    /// Returns `PkceError::VerificationFailed` if the verifier doesn't match.
    pub fn verify(&self, verifier: &str) -> Result<(), PkceError> {
        verify_challenge(&self.value, self.method, verifier)
    }

    /// Get the challenge as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The challenge method.
    #[must_use]
    pub fn method(&self) -> PkceChallengeMethod {
        self.method
    }

    /// Consume the challenge and return its parts.
    #[must_use]
    pub fn into_parts(self) -> (String, PkceChallengeMethod) {
        (self.value, self.method)
    }
}

/// Verifies `verifier` against a stored `challenge` in constant time.
///
/// # Errors
///
/// Returns `PkceError::VerificationFailed` on mismatch.
pub fn verify_challenge(
    challenge: &str,
    method: PkceChallengeMethod,
    verifier: &str,
) -> Result<(), PkceError> {
    let matches = match method {
        PkceChallengeMethod::S256 => constant_time_str_eq(&s256_challenge(verifier), challenge),
        PkceChallengeMethod::Plain => constant_time_str_eq(verifier, challenge),
    };
    if matches {
        Ok(())
    } else {
        Err(PkceError::VerificationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 7636 Appendix B
    const RFC_VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    const RFC_CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

    #[test]
    fn test_rfc7636_vector() {
        assert_eq!(s256_challenge(RFC_VERIFIER), RFC_CHALLENGE);
        let verifier = PkceVerifier::new(RFC_VERIFIER.to_string()).unwrap();
        assert_eq!(PkceChallenge::from_verifier(&verifier).as_str(), RFC_CHALLENGE);
    }

    #[test]
    fn test_s256_round_trip() {
        let challenge = PkceChallenge::new(s256_challenge("abc"), PkceChallengeMethod::S256).unwrap();
        assert!(challenge.verify("abc").is_ok());
        assert!(matches!(
            challenge.verify("abd"),
            Err(PkceError::VerificationFailed)
        ));
        assert!(challenge.verify("").is_err());
    }

    #[test]
    fn test_plain_requires_exact_match() {
        let challenge = PkceChallenge::new("my-plain-verifier", PkceChallengeMethod::Plain).unwrap();
        assert!(challenge.verify("my-plain-verifier").is_ok());
        assert!(challenge.verify("my-plain-verifieR").is_err());
        assert!(challenge.verify("my-plain-verifier ").is_err());
    }

    #[test]
    fn test_generated_verifier_is_valid() {
        let verifier = PkceVerifier::generate();
        assert_eq!(verifier.as_str().len(), 43);
        assert!(PkceVerifier::new(verifier.clone().into_inner()).is_ok());
        let challenge = PkceChallenge::from_verifier(&verifier);
        assert!(challenge.verify(verifier.as_str()).is_ok());
    }

    #[test]
    fn test_verifier_validation() {
        assert!(matches!(
            PkceVerifier::new("short".to_string()),
            Err(PkceError::InvalidVerifierLength(5))
        ));
        assert!(matches!(
            PkceVerifier::new("a".repeat(129)),
            Err(PkceError::InvalidVerifierLength(129))
        ));
        assert!(matches!(
            PkceVerifier::new(format!("{}!", "a".repeat(43))),
            Err(PkceError::InvalidVerifierCharacters)
        ));
    }

    #[test]
    fn test_s256_challenge_format_validation() {
        assert!(PkceChallenge::new("", PkceChallengeMethod::Plain).is_err());
        assert!(PkceChallenge::new("tooshort", PkceChallengeMethod::S256).is_err());
        // Right length, but '+' and '/' are not base64url
        let bad = format!("{}+/", "A".repeat(41));
        assert!(PkceChallenge::new(bad, PkceChallengeMethod::S256).is_err());
        assert!(PkceChallenge::new(RFC_CHALLENGE, PkceChallengeMethod::S256).is_ok());
    }

    #[test]
    fn test_method_parse() {
        assert_eq!(
            PkceChallengeMethod::parse("S256").unwrap(),
            PkceChallengeMethod::S256
        );
        assert_eq!(
            PkceChallengeMethod::parse("plain").unwrap(),
            PkceChallengeMethod::Plain
        );
        assert!(PkceChallengeMethod::parse("s256").is_err());
        assert!(PkceChallengeMethod::parse("S512").is_err());
        assert_eq!(PkceChallengeMethod::default(), PkceChallengeMethod::S256);
        assert_eq!(PkceChallengeMethod::Plain.to_string(), "plain");
    }

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            AuthError::from(PkceError::VerificationFailed),
            AuthError::PkceVerificationFailed
        ));
        assert!(matches!(
            AuthError::from(PkceError::unsupported_method("S512")),
            AuthError::InvalidRequest { .. }
        ));
        assert_eq!(PkceError::VerificationFailed.oauth_error_code(), "invalid_grant");
        assert!(PkceError::InvalidChallengeFormat("x").is_challenge_error());
        assert!(PkceError::InvalidVerifierCharacters.is_verifier_error());
    }
}
