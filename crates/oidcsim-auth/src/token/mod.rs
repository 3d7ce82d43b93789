//! Token minting.
//!
//! - [`TokenIssuer`] / [`IdTokenIssuer`] - interfaces the delegation service mints through
//! - [`JwtTokenIssuer`] - signed-JWT implementation of both
//! - [`jwt`] - keys, claims and the [`JwtService`] codec

pub mod issuer;
pub mod jwt;
pub mod jwt_issuer;

pub use issuer::{AccessToken, IdTokenIssuer, TokenIssuer, TokenSet};
pub use jwt::{
    AccessTokenClaims, IdTokenClaims, JwtError, JwtService, SigningAlgorithm, SigningKeyPair,
};
pub use jwt_issuer::{JwtTokenIssuer, TokenConfig, generate_refresh_token};
