//! Upgrade health gate.
//!
//! Decides, before and after a cluster upgrade, whether the cluster is healthy
//! enough to proceed. The decision is built from independent probes (critical
//! alerts, degraded operators, capacity, node cordons, node pressure and pod
//! disruption budgets), each of which records its own telemetry.
//!
//! ```no_run
//! use upgrade_health::{adapters, HealthCheckEngine, OperatorConfig, UpgradeContext};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = OperatorConfig::load("/etc/upgrade/config.yaml")?;
//! let client = kube::Client::try_default().await?;
//! let collaborators = adapters::production_collaborators(client, &config)?;
//! let engine = HealthCheckEngine::new(config.health_check_config(), collaborators);
//!
//! let upgrade = UpgradeContext::new("managed-upgrade-config", "openshift-managed-upgrade-operator")
//!     .with_target_version("4.15.4");
//! let healthy = engine.pre_upgrade_health_check(&upgrade).await?;
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod aggregate;
pub mod alerts;
pub mod collaborators;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod probes;

pub use aggregate::AggregateResult;
pub use alerts::{AlertFilter, AlertResponse};
pub use collaborators::Collaborators;
pub use config::{HealthCheckConfig, OperatorConfig};
pub use context::{UpgradeContext, UpgradePhase};
pub use engine::HealthCheckEngine;
pub use error::{Error, Result};
pub use metrics::{HealthCheckStage, MetricKind, MetricRecorder, OtelMetricRecorder};
pub use probes::{ProbeKind, ProbeOutcome, ProbeStatus};
