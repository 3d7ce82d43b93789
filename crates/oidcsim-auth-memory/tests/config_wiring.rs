//! Builds a service from a TOML configuration and checks that the
//! configured lifetimes and policies take effect.

use std::sync::Arc;

use oidcsim_auth::oauth::s256_challenge;
use oidcsim_auth::prelude::*;
use oidcsim_auth::token::{JwtService, SigningAlgorithm, SigningKeyPair, TokenConfig};
use oidcsim_auth_memory::MemoryAuthStorage;
use time::Duration;

const REDIRECT: &str = "https://rp.example/cb";

const CONFIG: &str = r#"
issuer = "https://idp.example"

[oauth]
authorization_code_lifetime = "2m"
access_token_lifetime = "15m"
default_audience = "api-default"

[pkce]
allow_plain = false

[signing]
algorithm = "ES384"
"#;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("oidcsim_auth=debug,oidcsim_auth_memory=debug")
        .try_init();
}

fn service_from(config: &AuthConfig, clock: Arc<ManualClock>) -> (DelegationService, MemoryAuthStorage) {
    let storage = MemoryAuthStorage::new();
    storage
        .clients()
        .register(Client::public("c1", "Relying Party", vec![REDIRECT.to_string()]))
        .unwrap();

    let algorithm = SigningAlgorithm::parse(&config.signing.algorithm).unwrap();
    let jwt = Arc::new(JwtService::new(
        SigningKeyPair::generate(algorithm).unwrap(),
        config.issuer.clone(),
    ));
    let issuer = Arc::new(JwtTokenIssuer::new(jwt, TokenConfig::try_from(config).unwrap()));

    let service = DelegationService::new(
        storage.delegations(),
        storage.codes(),
        storage.clients(),
        issuer.clone(),
        clock,
        DelegationServiceConfig::try_from(config).unwrap(),
    )
    .with_id_token_issuer(issuer);
    (service, storage)
}

#[tokio::test]
async fn test_configured_lifetimes_and_pkce_policy() {
    init_tracing();
    let config = AuthConfig::from_toml_str(CONFIG).unwrap();
    let clock = Arc::new(ManualClock::starting_now());
    let (service, _storage) = service_from(&config, clock.clone());

    let d1 = service
        .create_delegation_from_consent(ConsentRequest::user("c1", "alice", ["profile"]))
        .await
        .unwrap();

    let err = service
        .issue_authorization_code(
            IssueCodeRequest::new(d1.clone(), "c1", REDIRECT).with_pkce("plain-value", "plain"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidRequest { .. }));

    let code = service
        .issue_authorization_code(
            IssueCodeRequest::new(d1.clone(), "c1", REDIRECT)
                .with_pkce(s256_challenge("abc"), "S256"),
        )
        .await
        .unwrap();
    let tokens = service
        .exchange_code_for_tokens(&ExchangeRequest::new(&code, "c1", REDIRECT).with_verifier("abc"))
        .await
        .unwrap();
    assert_eq!(tokens.expires_in, 15 * 60);

    // Two-minute code lifetime from configuration.
    let code = service
        .issue_authorization_code(
            IssueCodeRequest::new(d1, "c1", REDIRECT).with_pkce(s256_challenge("abc"), "S256"),
        )
        .await
        .unwrap();
    clock.advance(Duration::minutes(2) + Duration::seconds(1));
    let err = service
        .exchange_code_for_tokens(&ExchangeRequest::new(&code, "c1", REDIRECT).with_verifier("abc"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::CodeUsedOrExpired));
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let err = AuthConfig::from_toml_str("[signing]\nalgorithm = \"HS256\"\n").unwrap_err();
    assert!(err.to_string().contains("HS256"));
}
