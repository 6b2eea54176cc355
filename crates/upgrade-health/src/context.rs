//! Upgrade subject passed into every health check invocation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Lifecycle phase of the upgrade being gated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UpgradePhase {
    /// Upgrade has been requested but not scheduled
    #[default]
    New,
    /// Upgrade is scheduled and waiting for its window
    Pending,
    /// Upgrade is in progress
    Upgrading,
    /// Upgrade completed
    Upgraded,
    /// Upgrade failed
    Failed,
}

impl UpgradePhase {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Pending => "Pending",
            Self::Upgrading => "Upgrading",
            Self::Upgraded => "Upgraded",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for UpgradePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpgradePhase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "pending" => Ok(Self::Pending),
            "upgrading" => Ok(Self::Upgrading),
            "upgraded" => Ok(Self::Upgraded),
            "failed" => Ok(Self::Failed),
            other => Err(Error::Config(format!("unknown upgrade phase: {other}"))),
        }
    }
}

/// Identifies the upgrade a health check is evaluated for.
///
/// Read-only input; the engine never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeContext {
    /// Name of the upgrade config resource
    pub name: String,
    /// Namespace of the upgrade config resource
    pub namespace: String,
    /// Current phase of the upgrade
    pub phase: UpgradePhase,
    /// Version the cluster is being upgraded to
    pub target_version: String,
    /// Whether extra worker capacity must be reserved before upgrading
    #[serde(default)]
    pub capacity_reservation_requested: bool,
}

impl UpgradeContext {
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            phase: UpgradePhase::New,
            target_version: String::new(),
            capacity_reservation_requested: false,
        }
    }

    #[must_use]
    pub fn with_phase(mut self, phase: UpgradePhase) -> Self {
        self.phase = phase;
        self
    }

    #[must_use]
    pub fn with_target_version(mut self, version: impl Into<String>) -> Self {
        self.target_version = version.into();
        self
    }

    #[must_use]
    pub fn with_capacity_reservation(mut self, requested: bool) -> Self {
        self.capacity_reservation_requested = requested;
        self
    }
}

impl fmt::Display for UpgradeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_parsing_is_case_insensitive() {
        assert_eq!("upgrading".parse::<UpgradePhase>().unwrap(), UpgradePhase::Upgrading);
        assert_eq!("New".parse::<UpgradePhase>().unwrap(), UpgradePhase::New);
        assert!("rolling".parse::<UpgradePhase>().is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let ctx = UpgradeContext::new("test-upgradeconfig", "test-namespace");
        assert_eq!(ctx.phase, UpgradePhase::New);
        assert!(!ctx.capacity_reservation_requested);
        assert_eq!(ctx.to_string(), "test-namespace/test-upgradeconfig");

        let ctx = ctx
            .with_phase(UpgradePhase::Upgrading)
            .with_target_version("4.15.4")
            .with_capacity_reservation(true);
        assert_eq!(ctx.phase, UpgradePhase::Upgrading);
        assert_eq!(ctx.target_version, "4.15.4");
        assert!(ctx.capacity_reservation_requested);
    }
}
