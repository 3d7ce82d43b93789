//! Consent decisions and subject selectors.
//!
//! A consent decision arrives from the interactive layer already made; this
//! module only gives it a typed shape and validates it at the boundary.

use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::types::{Constraints, ScopeSet, TimeWindow};

/// Who gave consent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentType {
    /// The subject consented for themselves.
    User,
    /// An administrator consented on behalf of a set of subjects.
    Admin,
}

impl ConsentType {
    /// Returns the wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for ConsentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The subjects an administrator-granted delegation applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSelector {
    /// Explicit subject IDs.
    #[serde(default)]
    pub subject_ids: Vec<String>,

    /// Group IDs. Membership is resolved by the directory, not here.
    #[serde(default)]
    pub group_ids: Vec<String>,

    /// Applies to every subject.
    #[serde(default)]
    pub all_subjects: bool,
}

impl SubjectSelector {
    /// A selector matching every subject.
    #[must_use]
    pub fn all() -> Self {
        Self {
            all_subjects: true,
            ..Self::default()
        }
    }

    /// A selector matching the listed subjects.
    #[must_use]
    pub fn subjects<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subject_ids: ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Returns `true` if the selector names `subject` directly or covers all
    /// subjects.
    #[must_use]
    pub fn covers(&self, subject: &str) -> bool {
        self.all_subjects || self.subject_ids.iter().any(|id| id == subject)
    }

    /// Returns `true` if nothing could ever match.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.all_subjects && self.subject_ids.is_empty() && self.group_ids.is_empty()
    }
}

/// The party a consent decision grants on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentGrantee {
    /// A single subject consenting for themselves.
    User {
        /// Subject ID.
        subject: String,
    },
    /// Administrator bulk consent.
    Admin {
        /// Subjects covered.
        selector: SubjectSelector,
        /// Administrator who granted it.
        granted_by: String,
    },
}

/// Input to `DelegationService::create_delegation_from_consent`.
#[derive(Debug, Clone)]
pub struct ConsentRequest {
    /// Client the delegation is granted to.
    pub client_id: String,
    /// Who the delegation is granted on behalf of.
    pub grantee: ConsentGrantee,
    /// Requested scopes. All must be allowed for the client.
    pub scopes: ScopeSet,
    /// Validity window. Unbounded when not set.
    pub window: TimeWindow,
    /// Contextual constraints. Unrestricted when not set.
    pub constraints: Constraints,
}

impl ConsentRequest {
    /// Builds a user-consent request.
    pub fn user<I, S>(client_id: impl Into<String>, subject: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            client_id: client_id.into(),
            grantee: ConsentGrantee::User {
                subject: subject.into(),
            },
            scopes: scopes.into_iter().collect(),
            window: TimeWindow::unbounded(),
            constraints: Constraints::default(),
        }
    }

    /// Builds an administrator-consent request.
    pub fn admin<I, S>(
        client_id: impl Into<String>,
        selector: SubjectSelector,
        granted_by: impl Into<String>,
        scopes: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            client_id: client_id.into(),
            grantee: ConsentGrantee::Admin {
                selector,
                granted_by: granted_by.into(),
            },
            scopes: scopes.into_iter().collect(),
            window: TimeWindow::unbounded(),
            constraints: Constraints::default(),
        }
    }

    /// Sets the validity window.
    #[must_use]
    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    /// Sets the contextual constraints.
    #[must_use]
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Rejects structurally invalid requests.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidRequest` for an empty client ID, an empty
    /// subject, an empty administrator, an empty selector, or no scopes.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.client_id.is_empty() {
            return Err(AuthError::invalid_request("client_id is required"));
        }
        match &self.grantee {
            ConsentGrantee::User { subject } if subject.is_empty() => {
                return Err(AuthError::invalid_request("subject is required"));
            }
            ConsentGrantee::Admin {
                selector,
                granted_by,
            } => {
                if granted_by.is_empty() {
                    return Err(AuthError::invalid_request("granted_by is required"));
                }
                if selector.is_empty() {
                    return Err(AuthError::invalid_request(
                        "subject selector matches no subjects",
                    ));
                }
            }
            ConsentGrantee::User { .. } => {}
        }
        if self.scopes.is_empty() {
            return Err(AuthError::invalid_request("at least one scope is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_covers() {
        let selector = SubjectSelector::subjects(["alice", "bob"]);
        assert!(selector.covers("alice"));
        assert!(!selector.covers("carol"));
        assert!(SubjectSelector::all().covers("carol"));
    }

    #[test]
    fn test_selector_with_only_groups_covers_no_explicit_subject() {
        let selector = SubjectSelector {
            group_ids: vec!["staff".to_string()],
            ..SubjectSelector::default()
        };
        assert!(!selector.is_empty());
        assert!(!selector.covers("alice"));
    }

    #[test]
    fn test_user_request_validation() {
        assert!(
            ConsentRequest::user("c1", "alice", ["openid"])
                .validate()
                .is_ok()
        );

        let err = ConsentRequest::user("", "alice", ["openid"])
            .validate()
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidRequest { .. }));

        let err = ConsentRequest::user("c1", "", ["openid"])
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("subject"));

        let err = ConsentRequest::user("c1", "alice", [""])
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("scope"));
    }

    #[test]
    fn test_admin_request_validation() {
        assert!(
            ConsentRequest::admin("c1", SubjectSelector::all(), "root", ["read"])
                .validate()
                .is_ok()
        );

        let err = ConsentRequest::admin("c1", SubjectSelector::default(), "root", ["read"])
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("selector"));

        let err = ConsentRequest::admin("c1", SubjectSelector::all(), "", ["read"])
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("granted_by"));
    }

    #[test]
    fn test_consent_type_display() {
        assert_eq!(ConsentType::User.to_string(), "user");
        assert_eq!(ConsentType::Admin.to_string(), "admin");
    }
}
