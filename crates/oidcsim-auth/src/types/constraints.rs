//! Contextual constraints and validity windows for delegations.

use std::net::IpAddr;

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Narrows where and how a delegation may be used.
///
/// An empty list means "no restriction" for that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    /// Allowed token audiences.
    #[serde(default)]
    pub audiences: Vec<String>,

    /// Allowed caller IP ranges.
    #[serde(default)]
    pub ip_ranges: Vec<IpNetwork>,

    /// Resource-scoping rules (e.g. `doc:123`, `bucket:foo`).
    /// Carried for collaborators; not enforced here.
    #[serde(default)]
    pub resources: Vec<String>,
}

impl Constraints {
    /// Creates an unrestricted constraint set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the allowed audiences. Empty strings are dropped.
    #[must_use]
    pub fn with_audiences<I, S>(mut self, audiences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audiences = audiences
            .into_iter()
            .map(Into::into)
            .filter(|a: &String| !a.is_empty())
            .collect();
        self
    }

    /// Restricts the allowed caller IP ranges.
    #[must_use]
    pub fn with_ip_ranges(mut self, ranges: Vec<IpNetwork>) -> Self {
        self.ip_ranges = ranges;
        self
    }

    /// Parses and restricts the allowed caller IP ranges from CIDR strings.
    ///
    /// # Errors
    ///
    /// Returns the parse error for the first malformed CIDR block.
    pub fn with_cidrs<I, S>(mut self, cidrs: I) -> Result<Self, ipnetwork::IpNetworkError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ip_ranges = cidrs
            .into_iter()
            .map(|cidr| cidr.as_ref().parse::<IpNetwork>())
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    /// Attaches resource-scoping rules.
    #[must_use]
    pub fn with_resources(mut self, resources: Vec<String>) -> Self {
        self.resources = resources;
        self
    }

    /// Returns `true` if tokens may be minted for `audience`.
    ///
    /// With a restriction in place, a missing audience is not allowed.
    #[must_use]
    pub fn allows_audience(&self, audience: Option<&str>) -> bool {
        if self.audiences.is_empty() {
            return true;
        }
        audience.is_some_and(|aud| self.audiences.iter().any(|allowed| allowed == aud))
    }

    /// Returns `true` if a caller at `ip` may use the delegation.
    ///
    /// An unknown caller address is not checked against the ranges.
    #[must_use]
    pub fn allows_ip(&self, ip: Option<IpAddr>) -> bool {
        match ip {
            Some(ip) if !self.ip_ranges.is_empty() => {
                self.ip_ranges.iter().any(|network| network.contains(ip))
            }
            _ => true,
        }
    }
}

/// Validity bounds. An unset bound is open on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    /// Earliest instant the window contains.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub not_before: Option<OffsetDateTime>,

    /// Latest instant the window contains.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub not_after: Option<OffsetDateTime>,
}

impl TimeWindow {
    /// A window open on both sides.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// A window with explicit bounds.
    #[must_use]
    pub fn new(not_before: Option<OffsetDateTime>, not_after: Option<OffsetDateTime>) -> Self {
        Self {
            not_before,
            not_after,
        }
    }

    /// Returns `true` iff `t` is not before `not_before` and not after
    /// `not_after` (for whichever bounds are set). Both bounds are inclusive.
    #[must_use]
    pub fn contains(&self, t: OffsetDateTime) -> bool {
        if self.not_before.is_some_and(|nb| t < nb) {
            return false;
        }
        if self.not_after.is_some_and(|na| t > na) {
            return false;
        }
        true
    }
}
