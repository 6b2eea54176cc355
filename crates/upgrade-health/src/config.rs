//! Operator configuration for the health gate.
//!
//! The surrounding orchestrator ships its settings as a YAML document. Only
//! the sections the health gate reads are modelled here:
//!
//! ```yaml
//! healthCheck:
//!   ignoredCriticals: [alert1, alert2]
//!   ignoredNamespaces: [ns1]
//! featureGate:
//!   enabled: [PreHealthCheck]
//! prometheus:
//!   url: https://prometheus-k8s.openshift-monitoring.svc:9091
//! dvo:
//!   url: http://deployment-validation-operator-metrics.openshift-deployment-validation-operator.svc:8383/metrics
//! ```

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{Error, Result};

/// Feature gate that turns on the extended pre-upgrade probes.
pub const PRE_HEALTH_CHECK_FEATURE: &str = "PreHealthCheck";

/// Namespaces whose critical alerts gate an upgrade by default.
pub const DEFAULT_NAMESPACE_SCOPE: &str = "^openshift.*|^kube.*|^default$";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Immutable per-invocation settings consumed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckConfig {
    /// Alert names that never block an upgrade
    pub ignored_critical_alerts: BTreeSet<String>,
    /// Namespaces whose alerts and budgets are never considered
    pub ignored_namespaces: BTreeSet<String>,
    /// Regex restricting which namespaces' alerts are considered at all
    pub namespace_scope: Option<String>,
    /// Whether capacity, node and PDB probes run before an upgrade
    pub extended_probes_enabled: bool,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            ignored_critical_alerts: BTreeSet::new(),
            ignored_namespaces: BTreeSet::new(),
            namespace_scope: Some(DEFAULT_NAMESPACE_SCOPE.to_string()),
            extended_probes_enabled: false,
        }
    }
}

impl HealthCheckConfig {
    #[must_use]
    pub fn with_ignored_alerts<I, S>(mut self, alerts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_critical_alerts = alerts.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_ignored_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_extended_probes(mut self, enabled: bool) -> Self {
        self.extended_probes_enabled = enabled;
        self
    }
}

/// Root of the operator configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorConfig {
    #[serde(default)]
    pub health_check: HealthCheckSection,
    #[serde(default)]
    pub feature_gate: FeatureGate,
    #[serde(default)]
    pub prometheus: EndpointConfig,
    #[serde(default)]
    pub dvo: EndpointConfig,
}

/// `healthCheck` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckSection {
    #[serde(default)]
    pub ignored_criticals: Vec<String>,
    #[serde(default)]
    pub ignored_namespaces: Vec<String>,
    /// Overrides [`DEFAULT_NAMESPACE_SCOPE`]; an empty string disables scoping.
    #[serde(default)]
    pub namespace_scope: Option<String>,
}

/// `featureGate` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureGate {
    #[serde(default)]
    pub enabled: Vec<String>,
}

impl FeatureGate {
    #[must_use]
    pub fn is_enabled(&self, feature: &str) -> bool {
        self.enabled.iter().any(|f| f == feature)
    }
}

/// Location of an HTTP collaborator.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl OperatorConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&raw)
    }

    /// Reject entries that would inject empty negation clauses into the alert query.
    pub fn validate(&self) -> Result<()> {
        if self
            .health_check
            .ignored_criticals
            .iter()
            .any(|a| a.trim().is_empty())
        {
            return Err(Error::Config(
                "healthCheck.ignoredCriticals contains an empty alert name".to_string(),
            ));
        }
        if self
            .health_check
            .ignored_namespaces
            .iter()
            .any(|ns| ns.trim().is_empty())
        {
            return Err(Error::Config(
                "healthCheck.ignoredNamespaces contains an empty namespace".to_string(),
            ));
        }
        if self.prometheus.timeout_secs == 0 || self.dvo.timeout_secs == 0 {
            return Err(Error::Config("timeoutSecs must be positive".to_string()));
        }
        Ok(())
    }

    /// Settings handed to the engine.
    #[must_use]
    pub fn health_check_config(&self) -> HealthCheckConfig {
        let namespace_scope = match &self.health_check.namespace_scope {
            Some(scope) if scope.is_empty() => None,
            Some(scope) => Some(scope.clone()),
            None => Some(DEFAULT_NAMESPACE_SCOPE.to_string()),
        };

        HealthCheckConfig {
            ignored_critical_alerts: self.health_check.ignored_criticals.iter().cloned().collect(),
            ignored_namespaces: self.health_check.ignored_namespaces.iter().cloned().collect(),
            namespace_scope,
            extended_probes_enabled: self.feature_gate.is_enabled(PRE_HEALTH_CHECK_FEATURE),
        }
    }
}
