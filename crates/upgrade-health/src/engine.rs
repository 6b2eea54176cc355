//! Health check engine.
//!
//! Owns the immutable configuration and the collaborator handles, and exposes
//! the two entry points the upgrade orchestrator calls.

use tracing::instrument;

use crate::aggregate::{self, AggregateResult};
use crate::collaborators::Collaborators;
use crate::config::HealthCheckConfig;
use crate::context::UpgradeContext;
use crate::error::Result;
use crate::metrics::HealthCheckStage;
use crate::probes::ProbeContext;

/// Stateless health gate; each call evaluates a fresh snapshot of the cluster.
#[derive(Clone)]
pub struct HealthCheckEngine {
    config: HealthCheckConfig,
    collaborators: Collaborators,
}

impl HealthCheckEngine {
    #[must_use]
    pub fn new(config: HealthCheckConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
        }
    }

    #[must_use]
    pub fn config(&self) -> &HealthCheckConfig {
        &self.config
    }

    fn probe_context<'a>(
        &'a self,
        upgrade: &'a UpgradeContext,
        stage: HealthCheckStage,
    ) -> ProbeContext<'a> {
        ProbeContext {
            collaborators: &self.collaborators,
            config: &self.config,
            upgrade,
            stage,
        }
    }

    /// Run the pre-upgrade check and return every failing probe.
    #[instrument(skip(self, upgrade), fields(upgrade = %upgrade, phase = %upgrade.phase))]
    pub async fn evaluate_pre_upgrade(&self, upgrade: &UpgradeContext) -> AggregateResult {
        let cx = self.probe_context(upgrade, HealthCheckStage::PreUpgrade);
        aggregate::pre_upgrade(&cx).await
    }

    /// Whether the cluster is healthy enough to start the upgrade.
    ///
    /// Only a failure to evaluate the upgrade-commenced gate is returned as an
    /// error; probe failures yield `Ok(false)`.
    pub async fn pre_upgrade_health_check(&self, upgrade: &UpgradeContext) -> Result<bool> {
        self.evaluate_pre_upgrade(upgrade).await.into_result()
    }

    /// Whether the upgraded cluster is healthy.
    ///
    /// The first failing probe is returned as [`crate::Error::HealthCheckFailed`].
    #[instrument(skip(self, upgrade), fields(upgrade = %upgrade, phase = %upgrade.phase))]
    pub async fn post_upgrade_health_check(&self, upgrade: &UpgradeContext) -> Result<bool> {
        let cx = self.probe_context(upgrade, HealthCheckStage::PostUpgrade);
        aggregate::post_upgrade(&cx).await
    }
}
