//! Independent health probes.
//!
//! A probe pulls from its own collaborator, records its telemetry, and
//! returns a [`ProbeOutcome`]. Probes never return errors: collaborator
//! failures are folded into the outcome so aggregation stays total.

mod alerts;
mod capacity;
mod cordon;
mod operators;
mod pdb;
mod pressure;
mod version;

pub use alerts::critical_alerts;
pub use capacity::capacity_reservation;
pub use cordon::manually_cordoned_nodes;
pub use operators::degraded_operators;
pub use pdb::{invalid_budgets_in_listing, invalid_budgets_in_report, pod_disruption_budgets};
pub use pressure::node_resource_pressure;
pub use version::log_cluster_version;

use serde::Serialize;
use std::fmt;

use crate::collaborators::Collaborators;
use crate::config::HealthCheckConfig;
use crate::context::UpgradeContext;
use crate::metrics::{HealthCheckStage, MetricKind};

/// Identifies a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProbeKind {
    CriticalAlerts,
    DegradedOperators,
    CapacityReservation,
    ManuallyCordonedNodes,
    NodeResourcePressure,
    PodDisruptionBudgets,
}

impl ProbeKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CriticalAlerts => "critical alerts",
            Self::DegradedOperators => "degraded cluster operators",
            Self::CapacityReservation => "capacity reservation",
            Self::ManuallyCordonedNodes => "manually cordoned nodes",
            Self::NodeResourcePressure => "node resource pressure",
            Self::PodDisruptionBudgets => "pod disruption budgets",
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-state probe verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProbeStatus {
    Pass,
    Fail,
    /// The signal could not be read; treated as a pass.
    Inconclusive,
}

/// Result of a single probe invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeOutcome {
    pub probe: ProbeKind,
    pub status: ProbeStatus,
    /// Human-readable explanation
    pub reason: String,
    /// Collaborator error that shaped this outcome, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Structured evidence (alert names, node names, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl ProbeOutcome {
    pub fn pass(probe: ProbeKind, reason: impl Into<String>) -> Self {
        Self {
            probe,
            status: ProbeStatus::Pass,
            reason: reason.into(),
            error: None,
            detail: None,
        }
    }

    pub fn fail(probe: ProbeKind, reason: impl Into<String>) -> Self {
        Self {
            probe,
            status: ProbeStatus::Fail,
            reason: reason.into(),
            error: None,
            detail: None,
        }
    }

    pub fn inconclusive(probe: ProbeKind, reason: impl Into<String>) -> Self {
        Self {
            probe,
            status: ProbeStatus::Inconclusive,
            reason: reason.into(),
            error: None,
            detail: None,
        }
    }

    #[must_use]
    pub fn with_error(mut self, error: &crate::Error) -> Self {
        self.error = Some(error.to_string());
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Whether this outcome lets the gate open. Inconclusive counts as passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        !matches!(self.status, ProbeStatus::Fail)
    }
}

/// Everything a probe needs for one invocation.
pub struct ProbeContext<'a> {
    pub collaborators: &'a Collaborators,
    pub config: &'a HealthCheckConfig,
    pub upgrade: &'a UpgradeContext,
    pub stage: HealthCheckStage,
}

impl ProbeContext<'_> {
    pub(crate) fn succeeded(&self, kind: MetricKind) {
        self.collaborators.metrics.update_metric_healthcheck_succeeded(
            &self.upgrade.name,
            kind,
            &self.upgrade.target_version,
            self.stage,
        );
    }

    pub(crate) fn failed(&self, kind: MetricKind) {
        self.collaborators.metrics.update_metric_healthcheck_failed(
            &self.upgrade.name,
            kind,
            &self.upgrade.target_version,
            self.stage,
        );
    }
}

/// Node name used in probe detail.
pub(crate) fn node_name(node: &k8s_openapi::api::core::v1::Node) -> String {
    node.metadata
        .name
        .clone()
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared doubles for probe unit tests.

    use std::sync::Arc;

    use crate::collaborators::{
        Collaborators, MockAlertQueryEngine, MockCapacityScaler, MockClusterReader,
        MockClusterVersionSource, MockNodeInspector, MockPdbValidatorBuilder, MockResultNotifier,
    };
    use crate::metrics::{MetricKind, MockMetricRecorder};

    pub const UPGRADE_NAME: &str = "test-upgradeconfig";

    /// Mocks with no expectations; tests fill in the ones a probe touches.
    #[derive(Default)]
    pub struct Doubles {
        pub cluster_version: MockClusterVersionSource,
        pub alerts: MockAlertQueryEngine,
        pub nodes: MockNodeInspector,
        pub scaler: MockCapacityScaler,
        pub pdb_validators: MockPdbValidatorBuilder,
        pub cluster: MockClusterReader,
        pub notifier: MockResultNotifier,
        pub metrics: MockMetricRecorder,
    }

    impl Doubles {
        pub fn expect_succeeded(&mut self, kind: MetricKind) {
            self.metrics
                .expect_update_metric_healthcheck_succeeded()
                .withf(move |subject, k, _, _| subject == UPGRADE_NAME && *k == kind)
                .times(1)
                .return_const(());
        }

        pub fn expect_failed(&mut self, kind: MetricKind) {
            self.metrics
                .expect_update_metric_healthcheck_failed()
                .withf(move |subject, k, _, _| subject == UPGRADE_NAME && *k == kind)
                .times(1)
                .return_const(());
        }

        pub fn into_collaborators(self) -> Collaborators {
            Collaborators {
                cluster_version: Arc::new(self.cluster_version),
                alerts: Arc::new(self.alerts),
                nodes: Arc::new(self.nodes),
                scaler: Arc::new(self.scaler),
                pdb_validators: Arc::new(self.pdb_validators),
                cluster: Arc::new(self.cluster),
                notifier: Arc::new(self.notifier),
                metrics: Arc::new(self.metrics),
            }
        }
    }
}
