//! JWT signing and verification for minted tokens.
//!
//! One [`JwtService`] owns one [`SigningKeyPair`] (RS256, RS384 or ES384).
//! Keys are generated in-process or loaded from PEM; publishing them
//! (JWKS, discovery) is left to the embedding server.
//!
//! ## Example
//!
//! ```ignore
//! use oidcsim_auth::token::jwt::{JwtService, SigningAlgorithm, SigningKeyPair};
//!
//! let keys = SigningKeyPair::generate(SigningAlgorithm::ES384)?;
//! let jwt = JwtService::new(keys, "https://idp.example.com");
//!
//! let token = jwt.encode(&claims)?;
//! let claims = jwt.decode::<AccessTokenClaims>(&token)?.claims;
//! ```

use std::fmt;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation};
use p384::SecretKey as P384SecretKey;
use rand::rngs::OsRng;
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::AuthError;

const RSA_KEY_BITS: usize = 2048;

// ============================================================================
// Errors
// ============================================================================

/// JWT encoding, decoding and key handling failures.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Signing failed.
    #[error("JWT encoding failed: {0}")]
    Encode(String),

    /// The token could not be parsed or verified.
    #[error("JWT decoding failed: {0}")]
    Decode(String),

    /// `exp` is in the past.
    #[error("Token expired")]
    Expired,

    /// Signature does not verify against the service key.
    #[error("Invalid signature")]
    InvalidSignature,

    /// A registered claim (`iss`, `sub`, ...) failed validation.
    #[error("Invalid claims: {0}")]
    InvalidClaims(String),

    /// Key material could not be generated or parsed.
    #[error("Key error: {0}")]
    Key(String),
}

impl JwtError {
    /// Returns `true` if the token itself was rejected.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::Expired | Self::InvalidSignature | Self::InvalidClaims(_)
        )
    }

    fn key(err: impl fmt::Display) -> Self {
        Self::Key(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidSubject
            | ErrorKind::ImmatureSignature
            | ErrorKind::MissingRequiredClaim(_) => Self::InvalidClaims(err.to_string()),
            ErrorKind::InvalidKeyFormat | ErrorKind::InvalidEcdsaKey | ErrorKind::InvalidRsaKey(_) => {
                Self::key(err)
            }
            _ => Self::Decode(err.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        AuthError::token_issuance(err.to_string())
    }
}

// ============================================================================
// Algorithms
// ============================================================================

/// Signing algorithms accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningAlgorithm {
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    RS256,
    /// RSASSA-PKCS1-v1_5 with SHA-384.
    RS384,
    /// ECDSA on P-384 with SHA-384.
    ES384,
}

impl SigningAlgorithm {
    /// Parses the configuration value (`RS256`, `RS384` or `ES384`).
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Key` for any other name.
    pub fn parse(name: &str) -> Result<Self, JwtError> {
        match name {
            "RS256" => Ok(Self::RS256),
            "RS384" => Ok(Self::RS384),
            "ES384" => Ok(Self::ES384),
            other => Err(JwtError::Key(format!(
                "unsupported signing algorithm '{other}'"
            ))),
        }
    }

    /// The `jsonwebtoken` equivalent.
    #[must_use]
    pub fn to_jwt_algorithm(self) -> Algorithm {
        match self {
            Self::RS256 => Algorithm::RS256,
            Self::RS384 => Algorithm::RS384,
            Self::ES384 => Algorithm::ES384,
        }
    }

    /// The `alg` header value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::ES384 => "ES384",
        }
    }

    #[must_use]
    pub fn is_rsa(&self) -> bool {
        !matches!(self, Self::ES384)
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Claims
// ============================================================================

/// Claims carried by a delegated access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessTokenClaims {
    pub iss: String,
    /// Subject the client acts for.
    pub sub: String,
    /// Resource server the token is meant for.
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    /// Granted scopes, space-delimited.
    pub scope: String,
    pub client_id: String,
    /// Delegation the token was minted from.
    pub delegation_id: String,
}

/// OpenID Connect ID token claims. `aud` is the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdTokenClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    /// Echo of the authorization request nonce.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

// ============================================================================
// Keys
// ============================================================================

/// Private/public key material for one signing algorithm.
pub struct SigningKeyPair {
    /// Key ID placed in the `kid` header.
    pub kid: String,
    pub algorithm: SigningAlgorithm,
    pub created_at: OffsetDateTime,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

// Key material stays out of Debug output.
impl fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyPair")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl SigningKeyPair {
    /// Generates fresh key material for `algorithm` with a random `kid`.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Key` if generation or PEM encoding fails.
    pub fn generate(algorithm: SigningAlgorithm) -> Result<Self, JwtError> {
        let (private_pem, public_pem) = if algorithm.is_rsa() {
            let private_key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS).map_err(JwtError::key)?;
            let private_pem = private_key
                .to_pkcs8_pem(LineEnding::LF)
                .map_err(JwtError::key)?;
            let public_pem = private_key
                .to_public_key()
                .to_public_key_pem(LineEnding::LF)
                .map_err(JwtError::key)?;
            (private_pem.to_string(), public_pem)
        } else {
            let secret_key = P384SecretKey::random(&mut OsRng);
            let private_pem = secret_key
                .to_pkcs8_pem(LineEnding::LF)
                .map_err(JwtError::key)?;
            let public_pem = secret_key
                .public_key()
                .to_public_key_pem(LineEnding::LF)
                .map_err(JwtError::key)?;
            (private_pem.to_string(), public_pem)
        };

        Self::from_pem(
            uuid::Uuid::new_v4().to_string(),
            algorithm,
            &private_pem,
            &public_pem,
        )
    }

    /// Loads a PKCS#8 private key and an SPKI public key.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Key` if either PEM does not parse for `algorithm`.
    pub fn from_pem(
        kid: impl Into<String>,
        algorithm: SigningAlgorithm,
        private_pem: &str,
        public_pem: &str,
    ) -> Result<Self, JwtError> {
        let (encoding_key, decoding_key) = if algorithm.is_rsa() {
            (
                EncodingKey::from_rsa_pem(private_pem.as_bytes()).map_err(JwtError::key)?,
                DecodingKey::from_rsa_pem(public_pem.as_bytes()).map_err(JwtError::key)?,
            )
        } else {
            (
                EncodingKey::from_ec_pem(private_pem.as_bytes()).map_err(JwtError::key)?,
                DecodingKey::from_ec_pem(public_pem.as_bytes()).map_err(JwtError::key)?,
            )
        };

        Ok(Self {
            kid: kid.into(),
            algorithm,
            created_at: OffsetDateTime::now_utc(),
            encoding_key,
            decoding_key,
        })
    }
}

// ============================================================================
// Service
// ============================================================================

/// Signs and verifies JWTs with a single key and issuer.
///
/// `Send + Sync`; share it behind an `Arc`.
#[derive(Debug)]
pub struct JwtService {
    keys: SigningKeyPair,
    issuer: String,
}

impl JwtService {
    #[must_use]
    pub fn new(keys: SigningKeyPair, issuer: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
        }
    }

    /// Signs `claims`, setting `alg` and `kid` in the header.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Encode` if serialization or signing fails.
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let mut header = Header::new(self.keys.algorithm.to_jwt_algorithm());
        header.kid = Some(self.keys.kid.clone());
        jsonwebtoken::encode(&header, claims, &self.keys.encoding_key)
            .map_err(|e| JwtError::Encode(e.to_string()))
    }

    /// Verifies signature, issuer and expiry, then deserializes the claims.
    ///
    /// Audience is not checked here; that is the resource server's job.
    ///
    /// # Errors
    ///
    /// Returns the mapped validation failure.
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<TokenData<T>, JwtError> {
        let mut validation = Validation::new(self.keys.algorithm.to_jwt_algorithm());
        validation.set_issuer(&[&self.issuer]);
        validation.validate_aud = false;

        Ok(jsonwebtoken::decode(token, &self.keys.decoding_key, &validation)?)
    }

    /// `kid` of the signing key.
    #[must_use]
    pub fn current_kid(&self) -> &str {
        &self.keys.kid
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }
}
