//! The delegation entity.
//!
//! A delegation is the persisted record of consent: it binds a client to a
//! subject (or an administrator-selected set of subjects), a scope set,
//! contextual constraints and a validity window. It is never deleted.
//! Revocation sets a tombstone timestamp that is never cleared.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::consent::{ConsentGrantee, ConsentRequest, ConsentType, SubjectSelector};
use crate::error::AuthError;
use crate::types::{Constraints, ScopeSet, TimeWindow};

/// Opaque delegation identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DelegationId(String);

impl DelegationId {
    const PREFIX: &'static str = "dlg_";

    /// Generates a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{}{}", Self::PREFIX, Uuid::new_v4().simple()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DelegationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DelegationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for DelegationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for DelegationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A persisted consent record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delegation {
    /// Unique identifier.
    pub id: DelegationId,

    /// The client (actor) the delegation is granted to.
    pub client_id: String,

    /// The subject, for user consent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// The covered subjects, for administrator consent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<SubjectSelector>,

    /// Granted scopes.
    pub scopes: ScopeSet,

    /// Validity window.
    #[serde(default)]
    pub window: TimeWindow,

    /// Contextual constraints.
    #[serde(default)]
    pub constraints: Constraints,

    /// Whether a user or an administrator consented.
    pub consent_type: ConsentType,

    /// Who granted the delegation.
    pub granted_by: String,

    /// When the delegation was revoked.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub revoked_at: Option<OffsetDateTime>,

    /// When the delegation was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Delegation {
    /// Builds a new delegation from a consent decision.
    ///
    /// The request is assumed to have passed `ConsentRequest::validate`.
    #[must_use]
    pub fn from_consent(request: ConsentRequest, now: OffsetDateTime) -> Self {
        let (subject, selector, consent_type, granted_by) = match request.grantee {
            ConsentGrantee::User { subject } => {
                (Some(subject.clone()), None, ConsentType::User, subject)
            }
            ConsentGrantee::Admin {
                selector,
                granted_by,
            } => (None, Some(selector), ConsentType::Admin, granted_by),
        };

        Self {
            id: DelegationId::generate(),
            client_id: request.client_id,
            subject,
            selector,
            scopes: request.scopes,
            window: request.window,
            constraints: request.constraints,
            consent_type,
            granted_by,
            revoked_at: None,
            created_at: now,
        }
    }

    /// Returns `true` once a revocation timestamp has been recorded.
    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Checks that the delegation is usable at `now`.
    ///
    /// # Errors
    ///
    /// - `RevokedDelegation` if revoked at or before `now`
    /// - `ExpiredDelegation` if `now` is outside the validity window
    pub fn is_active_at(&self, now: OffsetDateTime) -> Result<(), AuthError> {
        if self.revoked_at.is_some_and(|at| at <= now) {
            return Err(AuthError::RevokedDelegation);
        }
        if !self.window.contains(now) {
            return Err(AuthError::ExpiredDelegation);
        }
        Ok(())
    }

    /// Validates the delegation for a redemption at `now`.
    ///
    /// Checks run in order: active, scope containment, audience, caller IP.
    ///
    /// # Errors
    ///
    /// The first failing check's error.
    pub fn validate(
        &self,
        now: OffsetDateTime,
        scope: &ScopeSet,
        audience: Option<&str>,
        caller_ip: Option<IpAddr>,
    ) -> Result<(), AuthError> {
        self.is_active_at(now)?;
        if !self.scopes.contains_all(scope) {
            return Err(AuthError::ScopeNotAllowed);
        }
        if !self.constraints.allows_audience(audience) {
            return Err(AuthError::AudienceNotAllowed);
        }
        if !self.constraints.allows_ip(caller_ip) {
            return Err(AuthError::IpNotAllowed);
        }
        Ok(())
    }

    /// A copy of this delegation limited to `scope`, which must be a subset
    /// of the granted scopes. Tokens are minted from this view.
    #[must_use]
    pub fn narrowed_to(&self, scope: &ScopeSet) -> Self {
        Self {
            scopes: scope.clone(),
            ..self.clone()
        }
    }

    /// Returns `true` if the delegation applies to `subject`.
    #[must_use]
    pub fn covers_subject(&self, subject: &str) -> bool {
        match (&self.subject, &self.selector) {
            (Some(own), _) => own == subject,
            (None, Some(selector)) => selector.covers(subject),
            (None, None) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2025-03-01 12:00 UTC);

    fn user_delegation() -> Delegation {
        Delegation::from_consent(
            ConsentRequest::user("c1", "alice", ["openid", "profile"]),
            NOW,
        )
    }

    #[test]
    fn test_generated_ids_are_prefixed_and_unique() {
        let a = DelegationId::generate();
        let b = DelegationId::generate();
        assert!(a.as_str().starts_with("dlg_"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_user_consent() {
        let d = user_delegation();
        assert_eq!(d.client_id, "c1");
        assert_eq!(d.subject.as_deref(), Some("alice"));
        assert_eq!(d.granted_by, "alice");
        assert_eq!(d.consent_type, ConsentType::User);
        assert!(d.selector.is_none());
        assert_eq!(d.created_at, NOW);
        assert!(!d.is_revoked());
    }

    #[test]
    fn test_from_admin_consent() {
        let d = Delegation::from_consent(
            ConsentRequest::admin("c1", SubjectSelector::subjects(["bob"]), "root", ["read"]),
            NOW,
        );
        assert_eq!(d.consent_type, ConsentType::Admin);
        assert_eq!(d.granted_by, "root");
        assert!(d.subject.is_none());
        assert!(d.covers_subject("bob"));
        assert!(!d.covers_subject("alice"));
    }

    #[test]
    fn test_unbounded_delegation_is_always_active() {
        let d = user_delegation();
        assert!(d.is_active_at(NOW).is_ok());
        assert!(d.is_active_at(NOW + Duration::days(3650)).is_ok());
    }

    #[test]
    fn test_not_yet_valid_delegation_is_inactive() {
        let mut d = user_delegation();
        d.window = TimeWindow::new(Some(NOW + Duration::hours(1)), None);
        assert!(matches!(
            d.is_active_at(NOW),
            Err(AuthError::ExpiredDelegation)
        ));
    }

    #[test]
    fn test_revocation_applies_from_its_instant() {
        let mut d = user_delegation();
        d.revoked_at = Some(NOW);
        assert!(d.is_active_at(NOW - Duration::seconds(1)).is_ok());
        assert!(matches!(
            d.is_active_at(NOW),
            Err(AuthError::RevokedDelegation)
        ));
        assert!(matches!(
            d.is_active_at(NOW + Duration::days(1)),
            Err(AuthError::RevokedDelegation)
        ));
    }

    #[test]
    fn test_validate_order_and_errors() {
        let mut d = user_delegation();
        d.constraints = Constraints::new()
            .with_audiences(["api1"])
            .with_cidrs(["10.0.0.0/8"])
            .unwrap();

        let scope = ScopeSet::parse("openid");
        let ip: IpAddr = "10.0.0.1".parse().unwrap();

        assert!(d.validate(NOW, &scope, Some("api1"), Some(ip)).is_ok());
        assert!(matches!(
            d.validate(NOW, &ScopeSet::parse("openid email"), Some("api1"), Some(ip)),
            Err(AuthError::ScopeNotAllowed)
        ));
        assert!(matches!(
            d.validate(NOW, &scope, Some("api2"), Some(ip)),
            Err(AuthError::AudienceNotAllowed)
        ));
        assert!(matches!(
            d.validate(NOW, &scope, Some("api1"), Some("192.0.2.1".parse().unwrap())),
            Err(AuthError::IpNotAllowed)
        ));

        d.revoked_at = Some(NOW);
        assert!(matches!(
            d.validate(NOW, &ScopeSet::parse("email"), Some("api2"), None),
            Err(AuthError::RevokedDelegation)
        ));
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut d = user_delegation();
        d.revoked_at = Some(NOW + Duration::minutes(1));
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("\"consentType\":\"user\""));
        let parsed: Delegation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, d);
    }
}
