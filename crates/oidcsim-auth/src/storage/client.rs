//! Client registry trait.
//!
//! The delegation service never sees client records directly; it asks the
//! registry policy questions. Unknown or inactive clients must be denied by
//! every check.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::ScopeSet;

/// Policy queries over registered clients.
///
/// # Example
///
/// ```ignore
/// use oidcsim_auth::storage::ClientRegistry;
///
/// async fn example(registry: &impl ClientRegistry) -> AuthResult<()> {
///     if registry.is_redirect_allowed("my-app", "https://app.example/cb").await? {
///         println!("redirect registered");
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait ClientRegistry: Send + Sync {
    /// Returns `true` if `redirect_uri` is registered for the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn is_redirect_allowed(&self, client_id: &str, redirect_uri: &str) -> AuthResult<bool>;

    /// Returns `true` if the client may be granted every scope in `scopes`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn allows_scopes(&self, client_id: &str, scopes: &ScopeSet) -> AuthResult<bool>;

    /// Returns `true` if `secret` matches the client's registered secret.
    ///
    /// Public clients have no secret and always fail verification.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn verify_secret(&self, client_id: &str, secret: &str) -> AuthResult<bool>;
}
