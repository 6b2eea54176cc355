//! Capability traits the engine consumes.
//!
//! Each trait is deliberately narrow: it exposes only what one probe needs
//! from the outside world. Production implementations live in
//! [`crate::adapters`]; tests substitute `mockall` doubles.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Node;
use k8s_openapi::api::policy::v1::PodDisruptionBudget;
use serde::Serialize;

#[cfg(test)]
use mockall::automock;

use crate::alerts::AlertResponse;
use crate::context::UpgradeContext;
use crate::error::Result;
use crate::metrics::MetricRecorder;
use crate::probes::ProbeOutcome;

/// Snapshot of the cluster's version resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    /// Version requested in the desired update, if any
    pub desired_version: Option<String>,
    /// Update channel
    pub channel: Option<String>,
    /// Most recent completed version from the update history
    pub current_version: Option<String>,
}

/// Result of the degraded operator lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DegradedOperators {
    /// Names of operators reporting `Degraded=True`
    pub degraded: Vec<String>,
}

/// Cordon state of a single node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CordonStatus {
    pub is_cordoned: bool,
    /// When the unschedulable taint was added, if known
    pub added_at: Option<DateTime<Utc>>,
}

/// Cluster version resource and operator status.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterVersionSource: Send + Sync {
    /// Whether the cluster has already started moving to the target version.
    async fn has_upgrade_commenced(&self, upgrade: &UpgradeContext) -> Result<bool>;

    /// Current version information. Informational only.
    async fn get_cluster_version(&self) -> Result<VersionInfo>;

    /// Operators currently reporting degradation.
    async fn has_degraded_operators(&self) -> Result<DegradedOperators>;
}

/// Executes alert queries against the alerting backend.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AlertQueryEngine: Send + Sync {
    async fn query(&self, query: &str) -> Result<AlertResponse>;
}

/// Per-node inspection primitives.
#[cfg_attr(test, automock)]
pub trait NodeInspector: Send + Sync {
    fn is_node_cordoned(&self, node: &Node) -> CordonStatus;

    /// Whether the node is being drained or rebooted by the upgrade itself.
    fn is_node_upgrading(&self, node: &Node) -> bool;

    fn has_memory_pressure(&self, node: &Node) -> bool;

    fn has_disk_pressure(&self, node: &Node) -> bool;

    fn has_pid_pressure(&self, node: &Node) -> bool;
}

/// Decides whether the cluster can add worker capacity for the upgrade.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CapacityScaler: Send + Sync {
    async fn can_scale(&self) -> Result<bool>;
}

/// Source of the external PDB validation report.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PdbValidator: Send + Sync {
    /// Raw validation report in Prometheus text exposition format.
    async fn get_metrics(&self) -> Result<Vec<u8>>;
}

/// Builds a [`PdbValidator`] for one upgrade.
#[cfg_attr(test, automock)]
pub trait PdbValidatorBuilder: Send + Sync {
    fn build(&self, upgrade: &UpgradeContext) -> Result<Box<dyn PdbValidator>>;
}

/// Read access to cluster objects.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterReader: Send + Sync {
    async fn list_nodes(&self) -> Result<Vec<Node>>;

    async fn list_pod_disruption_budgets(&self) -> Result<Vec<PodDisruptionBudget>>;
}

/// Delivers the outcome of a failed pre-upgrade health check.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ResultNotifier: Send + Sync {
    async fn notify_result(&self, upgrade: &UpgradeContext, failures: &[ProbeOutcome])
        -> Result<()>;
}

/// Concrete collaborators wired into the engine.
#[derive(Clone)]
pub struct Collaborators {
    pub cluster_version: Arc<dyn ClusterVersionSource>,
    pub alerts: Arc<dyn AlertQueryEngine>,
    pub nodes: Arc<dyn NodeInspector>,
    pub scaler: Arc<dyn CapacityScaler>,
    pub pdb_validators: Arc<dyn PdbValidatorBuilder>,
    pub cluster: Arc<dyn ClusterReader>,
    pub notifier: Arc<dyn ResultNotifier>,
    pub metrics: Arc<dyn MetricRecorder>,
}
