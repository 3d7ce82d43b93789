//! In-memory client registry.

use async_trait::async_trait;
use dashmap::DashMap;
use oidcsim_auth::AuthResult;
use oidcsim_auth::error::AuthError;
use oidcsim_auth::secret::verify_client_secret;
use oidcsim_auth::storage::ClientRegistry;
use oidcsim_auth::types::{Client, ScopeSet};
use tracing::{debug, warn};

/// Registered clients keyed by client ID.
///
/// Unknown and inactive clients fail every policy check.
#[derive(Debug, Default)]
pub struct MemoryClientRegistry {
    clients: DashMap<String, Client>,
}

impl MemoryClientRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a client after validating it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the registration is invalid.
    pub fn register(&self, client: Client) -> AuthResult<()> {
        client
            .validate()
            .map_err(|e| AuthError::invalid_request(e.to_string()))?;
        debug!(client_id = %client.client_id, confidential = client.confidential, "Client registered");
        self.clients.insert(client.client_id.clone(), client);
        Ok(())
    }

    /// Marks a client inactive. Returns `false` if it is unknown.
    pub fn deactivate(&self, client_id: &str) -> bool {
        match self.clients.get_mut(client_id) {
            Some(mut client) => {
                client.active = false;
                true
            }
            None => false,
        }
    }

    /// Returns a registered client, active or not.
    #[must_use]
    pub fn get(&self, client_id: &str) -> Option<Client> {
        self.clients.get(client_id).map(|entry| entry.value().clone())
    }

    fn with_active<T>(&self, client_id: &str, f: impl FnOnce(&Client) -> T) -> Option<T> {
        self.clients
            .get(client_id)
            .filter(|entry| entry.active)
            .map(|entry| f(entry.value()))
    }
}

#[async_trait]
impl ClientRegistry for MemoryClientRegistry {
    async fn is_redirect_allowed(&self, client_id: &str, redirect_uri: &str) -> AuthResult<bool> {
        Ok(self
            .with_active(client_id, |c| c.is_redirect_uri_allowed(redirect_uri))
            .unwrap_or(false))
    }

    async fn allows_scopes(&self, client_id: &str, scopes: &ScopeSet) -> AuthResult<bool> {
        Ok(self
            .with_active(client_id, |c| c.allows_scopes(scopes))
            .unwrap_or(false))
    }

    async fn verify_secret(&self, client_id: &str, secret: &str) -> AuthResult<bool> {
        let Some(hash) = self
            .with_active(client_id, |c| c.client_secret.clone())
            .flatten()
        else {
            return Ok(false);
        };

        verify_client_secret(secret, &hash).map_err(|e| {
            warn!(client_id = %client_id, error = %e, "Stored client secret hash is malformed");
            AuthError::internal("stored client secret hash is malformed")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oidcsim_auth::secret::{generate_client_secret, hash_client_secret};

    const REDIRECT: &str = "https://rp.example/cb";

    fn public_client() -> Client {
        Client::public("c1", "App", vec![REDIRECT.to_string()]).with_scopes(["openid", "profile"])
    }

    #[test]
    fn test_register_validates() {
        let registry = MemoryClientRegistry::new();
        let err = registry
            .register(Client::public("c1", "App", Vec::new()))
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidRequest { .. }));
        assert!(registry.get("c1").is_none());

        registry.register(public_client()).unwrap();
        assert!(registry.get("c1").is_some());
    }

    #[tokio::test]
    async fn test_policy_checks() {
        let registry = MemoryClientRegistry::new();
        registry.register(public_client()).unwrap();

        assert!(registry.is_redirect_allowed("c1", REDIRECT).await.unwrap());
        assert!(
            !registry
                .is_redirect_allowed("c1", "https://rp.example/cb/")
                .await
                .unwrap()
        );
        assert!(
            registry
                .allows_scopes("c1", &ScopeSet::parse("openid profile"))
                .await
                .unwrap()
        );
        assert!(
            !registry
                .allows_scopes("c1", &ScopeSet::parse("openid admin"))
                .await
                .unwrap()
        );
        assert!(!registry.is_redirect_allowed("c9", REDIRECT).await.unwrap());
        assert!(!registry.verify_secret("c1", "anything").await.unwrap());
    }

    #[tokio::test]
    async fn test_inactive_client_is_denied() {
        let registry = MemoryClientRegistry::new();
        registry.register(public_client()).unwrap();
        assert!(registry.deactivate("c1"));
        assert!(!registry.deactivate("c9"));

        assert!(!registry.is_redirect_allowed("c1", REDIRECT).await.unwrap());
        assert!(
            !registry
                .allows_scopes("c1", &ScopeSet::parse("openid"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_verify_secret() {
        let secret = generate_client_secret();
        let registry = MemoryClientRegistry::new();
        registry
            .register(public_client().with_secret_hash(hash_client_secret(&secret).unwrap()))
            .unwrap();

        assert!(registry.verify_secret("c1", &secret).await.unwrap());
        assert!(!registry.verify_secret("c1", "cs_wrong").await.unwrap());

        registry.deactivate("c1");
        assert!(!registry.verify_secret("c1", &secret).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_hash_is_internal_error() {
        let registry = MemoryClientRegistry::new();
        registry
            .register(public_client().with_secret_hash("not-a-phc-string"))
            .unwrap();
        let err = registry.verify_secret("c1", "cs_x").await.unwrap_err();
        assert!(matches!(err, AuthError::Internal { .. }));
    }
}
