//! Health check telemetry.
//!
//! Every probe reports one or more succeeded/failed observations through a
//! [`MetricRecorder`]. The production recorder exports them as an
//! OpenTelemetry gauge, one series per upgrade, reason, version and stage.

use opentelemetry::{global, metrics::Gauge, KeyValue};
use serde::Serialize;
use std::fmt;

#[cfg(test)]
use mockall::automock;

/// Name of the exported gauge (1 = failed, 0 = succeeded).
pub const HEALTHCHECK_GAUGE: &str = "upgradeoperator_healthcheck_failed";

/// Reason label attached to a health check observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MetricKind {
    MetricsQueryFailed,
    CriticalAlertsFiring,
    ClusterOperatorsStatusFailed,
    ClusterOperatorsDegraded,
    DefaultWorkerMachinepoolNotFound,
    ClusterNodeQueryFailed,
    ClusterNodesManuallyCordoned,
    ClusterNodesTaintedUnschedulable,
    ClusterInvalidPDB,
}

impl MetricKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MetricsQueryFailed => "MetricsQueryFailed",
            Self::CriticalAlertsFiring => "CriticalAlertsFiring",
            Self::ClusterOperatorsStatusFailed => "ClusterOperatorsStatusFailed",
            Self::ClusterOperatorsDegraded => "ClusterOperatorsDegraded",
            Self::DefaultWorkerMachinepoolNotFound => "DefaultWorkerMachinepoolNotFound",
            Self::ClusterNodeQueryFailed => "ClusterNodeQueryFailed",
            Self::ClusterNodesManuallyCordoned => "ClusterNodesManuallyCordoned",
            Self::ClusterNodesTaintedUnschedulable => "ClusterNodesTaintedUnschedulable",
            Self::ClusterInvalidPDB => "ClusterInvalidPDB",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the upgrade an observation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthCheckStage {
    PreUpgrade,
    PostUpgrade,
}

impl HealthCheckStage {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PreUpgrade => "PreUpgradeHealthCheck",
            Self::PostUpgrade => "PostUpgradeHealthCheck",
        }
    }
}

impl fmt::Display for HealthCheckStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sink for per-probe health check observations.
#[cfg_attr(test, automock)]
pub trait MetricRecorder: Send + Sync {
    /// Record that the check identified by `kind` passed.
    fn update_metric_healthcheck_succeeded(
        &self,
        subject: &str,
        kind: MetricKind,
        version: &str,
        stage: HealthCheckStage,
    );

    /// Record that the check identified by `kind` failed.
    fn update_metric_healthcheck_failed(
        &self,
        subject: &str,
        kind: MetricKind,
        version: &str,
        stage: HealthCheckStage,
    );
}

/// OpenTelemetry-backed recorder.
#[derive(Debug)]
pub struct OtelMetricRecorder {
    healthcheck_failed: Gauge<u64>,
}

impl OtelMetricRecorder {
    /// Create a recorder on the global meter provider.
    #[must_use]
    pub fn new() -> Self {
        let meter = global::meter("upgrade_health");

        let healthcheck_failed = meter
            .u64_gauge(HEALTHCHECK_GAUGE)
            .with_description("Whether an upgrade health check failed (1) or succeeded (0)")
            .build();

        Self { healthcheck_failed }
    }

    fn record(
        &self,
        subject: &str,
        kind: MetricKind,
        version: &str,
        stage: HealthCheckStage,
        failed: bool,
    ) {
        let labels = [
            KeyValue::new("upgradeconfig_name", subject.to_string()),
            KeyValue::new("reason", kind.as_str()),
            KeyValue::new("version", version.to_string()),
            KeyValue::new("state", stage.as_str()),
        ];
        self.healthcheck_failed.record(u64::from(failed), &labels);
    }
}

impl Default for OtelMetricRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricRecorder for OtelMetricRecorder {
    fn update_metric_healthcheck_succeeded(
        &self,
        subject: &str,
        kind: MetricKind,
        version: &str,
        stage: HealthCheckStage,
    ) {
        self.record(subject, kind, version, stage, false);
    }

    fn update_metric_healthcheck_failed(
        &self,
        subject: &str,
        kind: MetricKind,
        version: &str,
        stage: HealthCheckStage,
    ) {
        self.record(subject, kind, version, stage, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_kind_labels_are_verbatim() {
        assert_eq!(MetricKind::ClusterInvalidPDB.to_string(), "ClusterInvalidPDB");
        assert_eq!(
            MetricKind::DefaultWorkerMachinepoolNotFound.as_str(),
            "DefaultWorkerMachinepoolNotFound"
        );
        assert_eq!(
            MetricKind::ClusterNodesTaintedUnschedulable.as_str(),
            "ClusterNodesTaintedUnschedulable"
        );
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(HealthCheckStage::PreUpgrade.as_str(), "PreUpgradeHealthCheck");
        assert_eq!(HealthCheckStage::PostUpgrade.as_str(), "PostUpgradeHealthCheck");
    }

    #[test]
    fn test_otel_recorder_records_without_provider() {
        // No provider installed: the global meter is a no-op and recording must not panic.
        let recorder = OtelMetricRecorder::new();
        recorder.update_metric_healthcheck_failed(
            "test-upgradeconfig",
            MetricKind::CriticalAlertsFiring,
            "4.15.4",
            HealthCheckStage::PreUpgrade,
        );
        recorder.update_metric_healthcheck_succeeded(
            "test-upgradeconfig",
            MetricKind::CriticalAlertsFiring,
            "4.15.4",
            HealthCheckStage::PreUpgrade,
        );
    }
}
