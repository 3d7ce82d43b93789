//! JWT-backed token issuer.
//!
//! [`JwtTokenIssuer`] implements both [`TokenIssuer`] and [`IdTokenIssuer`]
//! on top of a [`JwtService`]. Access and ID tokens are signed JWTs; refresh
//! tokens are opaque random values.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::issuer::{AccessToken, IdTokenIssuer, TokenIssuer};
use super::jwt::{AccessTokenClaims, IdTokenClaims, JwtService};
use crate::AuthResult;
use crate::config::{AuthConfig, ConfigError, MAX_LIFETIME};
use crate::error::AuthError;
use crate::delegation::Delegation;

/// Token lifetimes and claim defaults.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Issuer URL (`iss`).
    pub issuer: String,

    /// Audience used when the exchange names none. Falls back to the issuer.
    pub default_audience: Option<String>,

    /// Access token lifetime.
    pub access_token_lifetime: Duration,

    /// ID token lifetime.
    pub id_token_lifetime: Duration,
}

impl TokenConfig {
    /// Creates a token configuration with one-hour lifetimes.
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            default_audience: None,
            access_token_lifetime: Duration::hours(1),
            id_token_lifetime: Duration::hours(1),
        }
    }

    /// Sets the default audience.
    #[must_use]
    pub fn with_default_audience(mut self, audience: impl Into<String>) -> Self {
        self.default_audience = Some(audience.into());
        self
    }

    /// Sets the access token lifetime.
    #[must_use]
    pub fn with_access_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.access_token_lifetime = lifetime;
        self
    }

    /// Sets the ID token lifetime.
    #[must_use]
    pub fn with_id_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.id_token_lifetime = lifetime;
        self
    }

    fn audience_for<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .or(self.default_audience.as_deref())
            .unwrap_or(&self.issuer)
    }
}

impl TryFrom<&AuthConfig> for TokenConfig {
    type Error = ConfigError;

    fn try_from(config: &AuthConfig) -> Result<Self, Self::Error> {
        let mut token_config = Self::new(config.issuer.clone())
            .with_access_token_lifetime(to_time_duration(
                "access_token_lifetime",
                config.oauth.access_token_lifetime,
            )?)
            .with_id_token_lifetime(to_time_duration(
                "id_token_lifetime",
                config.oauth.id_token_lifetime,
            )?);
        token_config.default_audience = config.oauth.default_audience.clone();
        Ok(token_config)
    }
}

/// Converts a configured lifetime, rejecting values above [`MAX_LIFETIME`].
pub(crate) fn to_time_duration(
    name: &str,
    duration: std::time::Duration,
) -> Result<Duration, ConfigError> {
    if duration > MAX_LIFETIME {
        return Err(ConfigError::InvalidValue(format!(
            "{} must not exceed {}s",
            name,
            MAX_LIFETIME.as_secs()
        )));
    }
    Duration::try_from(duration)
        .map_err(|_| ConfigError::InvalidValue(format!("{} is out of range", name)))
}

/// Computes `exp` for a token issued at `iat`.
fn expiry_timestamp(iat: i64, lifetime: Duration) -> AuthResult<i64> {
    iat.checked_add(lifetime.whole_seconds())
        .ok_or_else(|| AuthError::token_issuance("token lifetime is out of range"))
}

/// Generates an opaque refresh token: 256 random bits, base64url.
#[must_use]
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; 32];
    rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Issues signed access and ID tokens through a [`JwtService`].
#[derive(Debug, Clone)]
pub struct JwtTokenIssuer {
    jwt: Arc<JwtService>,
    config: TokenConfig,
}

impl JwtTokenIssuer {
    /// Creates an issuer.
    #[must_use]
    pub fn new(jwt: Arc<JwtService>, config: TokenConfig) -> Self {
        Self { jwt, config }
    }

    /// Returns the token configuration.
    #[must_use]
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }
}

#[async_trait]
impl TokenIssuer for JwtTokenIssuer {
    async fn mint_access(
        &self,
        delegation: &Delegation,
        subject: &str,
        audience: Option<&str>,
        now: OffsetDateTime,
    ) -> AuthResult<AccessToken> {
        let iat = now.unix_timestamp();
        let lifetime = self.config.access_token_lifetime.whole_seconds();
        let claims = AccessTokenClaims {
            iss: self.config.issuer.clone(),
            sub: subject.to_string(),
            aud: self.config.audience_for(audience).to_string(),
            exp: expiry_timestamp(iat, self.config.access_token_lifetime)?,
            iat,
            jti: uuid::Uuid::new_v4().to_string(),
            scope: delegation.scopes.to_string(),
            client_id: delegation.client_id.clone(),
            delegation_id: delegation.id.to_string(),
        };

        let token = self.jwt.encode(&claims)?;
        debug!(
            delegation_id = %delegation.id,
            client_id = %delegation.client_id,
            aud = %claims.aud,
            "Minted access token"
        );

        Ok(AccessToken {
            token,
            expires_in: u64::try_from(lifetime).unwrap_or(0),
        })
    }

    async fn mint_refresh(
        &self,
        delegation: &Delegation,
        _subject: &str,
        _now: OffsetDateTime,
    ) -> AuthResult<String> {
        debug!(delegation_id = %delegation.id, "Minted refresh token");
        Ok(generate_refresh_token())
    }
}

#[async_trait]
impl IdTokenIssuer for JwtTokenIssuer {
    async fn issue_id_token(
        &self,
        delegation: &Delegation,
        subject: &str,
        nonce: Option<&str>,
        now: OffsetDateTime,
    ) -> AuthResult<String> {
        let iat = now.unix_timestamp();
        let claims = IdTokenClaims {
            iss: self.config.issuer.clone(),
            sub: subject.to_string(),
            aud: delegation.client_id.clone(),
            exp: expiry_timestamp(iat, self.config.id_token_lifetime)?,
            iat,
            nonce: nonce.map(str::to_string),
        };

        let token = self.jwt.encode(&claims)?;
        debug!(delegation_id = %delegation.id, "Minted ID token");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegation::ConsentRequest;
    use crate::token::jwt::{SigningAlgorithm, SigningKeyPair};

    const ISSUER: &str = "https://idp.example.com";

    fn make_issuer(config: TokenConfig) -> (JwtTokenIssuer, Arc<JwtService>) {
        let jwt = Arc::new(JwtService::new(
            SigningKeyPair::generate(SigningAlgorithm::ES384).unwrap(),
            ISSUER,
        ));
        (JwtTokenIssuer::new(jwt.clone(), config), jwt)
    }

    fn make_delegation(now: OffsetDateTime) -> Delegation {
        Delegation::from_consent(
            ConsentRequest::user("c1", "alice", ["openid", "profile"]),
            now,
        )
    }

    #[tokio::test]
    async fn test_access_token_claims() {
        let (issuer, jwt) = make_issuer(TokenConfig::new(ISSUER));
        let now = OffsetDateTime::now_utc();
        let delegation = make_delegation(now);

        let access = issuer
            .mint_access(&delegation, "alice", Some("api1"), now)
            .await
            .unwrap();
        assert_eq!(access.expires_in, 3600);

        let claims = jwt
            .decode::<AccessTokenClaims>(&access.token)
            .unwrap()
            .claims;
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.aud, "api1");
        assert_eq!(claims.scope, "openid profile");
        assert_eq!(claims.client_id, "c1");
        assert_eq!(claims.delegation_id, delegation.id.to_string());
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[tokio::test]
    async fn test_audience_fallbacks() {
        let now = OffsetDateTime::now_utc();
        let delegation = make_delegation(now);

        let (issuer, jwt) = make_issuer(TokenConfig::new(ISSUER));
        let access = issuer
            .mint_access(&delegation, "alice", None, now)
            .await
            .unwrap();
        let claims = jwt.decode::<AccessTokenClaims>(&access.token).unwrap().claims;
        assert_eq!(claims.aud, ISSUER);

        let (issuer, jwt) =
            make_issuer(TokenConfig::new(ISSUER).with_default_audience("https://api.example.com"));
        let access = issuer
            .mint_access(&delegation, "alice", None, now)
            .await
            .unwrap();
        let claims = jwt.decode::<AccessTokenClaims>(&access.token).unwrap().claims;
        assert_eq!(claims.aud, "https://api.example.com");
    }

    #[tokio::test]
    async fn test_id_token_claims() {
        let (issuer, jwt) = make_issuer(
            TokenConfig::new(ISSUER).with_id_token_lifetime(Duration::minutes(10)),
        );
        let now = OffsetDateTime::now_utc();
        let delegation = make_delegation(now);

        let token = issuer
            .issue_id_token(&delegation, "alice", Some("n-0S6"), now)
            .await
            .unwrap();
        let claims = jwt.decode::<IdTokenClaims>(&token).unwrap().claims;
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.aud, "c1");
        assert_eq!(claims.nonce.as_deref(), Some("n-0S6"));
        assert_eq!(claims.exp - claims.iat, 600);
    }

    #[tokio::test]
    async fn test_refresh_tokens_are_opaque_and_unique() {
        let (issuer, _) = make_issuer(TokenConfig::new(ISSUER));
        let now = OffsetDateTime::now_utc();
        let delegation = make_delegation(now);

        let a = issuer.mint_refresh(&delegation, "alice", now).await.unwrap();
        let b = issuer.mint_refresh(&delegation, "alice", now).await.unwrap();
        assert_eq!(a.len(), 43);
        assert_ne!(a, b);
        assert!(!a.contains('.'));
    }

    #[test]
    fn test_token_config_from_auth_config() {
        let mut auth = AuthConfig::default();
        auth.oauth.access_token_lifetime = std::time::Duration::from_secs(900);
        auth.oauth.default_audience = Some("api".to_string());

        let config = TokenConfig::try_from(&auth).unwrap();
        assert_eq!(config.issuer, auth.issuer);
        assert_eq!(config.access_token_lifetime, Duration::minutes(15));
        assert_eq!(config.id_token_lifetime, Duration::hours(1));
        assert_eq!(config.default_audience.as_deref(), Some("api"));
    }

    #[test]
    fn test_token_config_rejects_oversized_lifetime() {
        let mut auth = AuthConfig::default();
        auth.oauth.id_token_lifetime = std::time::Duration::MAX;
        let err = TokenConfig::try_from(&auth).unwrap_err();
        assert!(err.to_string().contains("id_token_lifetime"));
    }

    #[tokio::test]
    async fn test_overflowing_lifetime_fails_minting() {
        let (issuer, _jwt) = make_issuer(
            TokenConfig::new(ISSUER)
                .with_access_token_lifetime(Duration::MAX)
                .with_id_token_lifetime(Duration::MAX),
        );
        let now = OffsetDateTime::now_utc();
        let delegation = make_delegation(now);

        let err = issuer
            .mint_access(&delegation, "alice", None, now)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenIssuance { .. }));

        let err = issuer
            .issue_id_token(&delegation, "alice", None, now)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenIssuance { .. }));
    }
}
