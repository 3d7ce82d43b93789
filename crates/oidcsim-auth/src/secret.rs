//! Client secret generation and verification.
//!
//! Secrets are 256-bit random values with a `cs_` prefix. Only their Argon2id
//! hash (PHC string, random salt from `OsRng`) is stored.
//!
//! # Example
//!
//! ```
//! use oidcsim_auth::secret::{generate_client_secret, hash_client_secret, verify_client_secret};
//!
//! let secret = generate_client_secret();
//! let hash = hash_client_secret(&secret).unwrap();
//!
//! assert!(verify_client_secret(&secret, &hash).unwrap());
//! assert!(!verify_client_secret("cs_wrong", &hash).unwrap());
//! ```

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;

/// Generate a new client secret.
///
/// Format: `cs_` followed by 43 base64url characters (46 characters total).
#[must_use]
pub fn generate_client_secret() -> String {
    let bytes: [u8; 32] = rand::thread_rng().r#gen();
    format!("cs_{}", URL_SAFE_NO_PAD.encode(bytes))
}

/// Hash a client secret for storage using Argon2id with default parameters.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if hashing fails (rare).
pub fn hash_client_secret(secret: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(secret.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a client secret against a stored Argon2 hash.
///
/// `Ok(false)` on mismatch; `Err` only if the stored hash is malformed.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if `hash` is not a PHC string.
pub fn verify_client_secret(
    secret: &str,
    hash: &str,
) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    let result = Argon2::default().verify_password(secret.as_bytes(), &parsed_hash);
    Ok(result.is_ok())
}
