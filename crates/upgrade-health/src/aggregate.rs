//! Pre- and post-upgrade aggregation.
//!
//! Pre-upgrade runs every applicable probe and ANDs the outcomes; post-upgrade
//! stops at the first failing probe. The two are kept as separate functions
//! because their error contracts differ.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::probes::{
    capacity_reservation, critical_alerts, degraded_operators, log_cluster_version,
    manually_cordoned_nodes, node_resource_pressure, pod_disruption_budgets, ProbeContext,
    ProbeOutcome,
};

/// Full picture of a pre-upgrade evaluation.
#[derive(Debug, Serialize)]
pub struct AggregateResult {
    pub healthy: bool,
    /// Failing probes in evaluation order
    pub failing_probes: Vec<ProbeOutcome>,
    /// Set only when the upgrade-commenced gate could not be evaluated
    #[serde(skip)]
    pub hard_error: Option<Error>,
}

impl AggregateResult {
    fn aborted(error: Error) -> Self {
        Self {
            healthy: false,
            failing_probes: Vec::new(),
            hard_error: Some(error),
        }
    }

    fn from_outcomes(outcomes: Vec<ProbeOutcome>) -> Self {
        let failing_probes: Vec<ProbeOutcome> =
            outcomes.into_iter().filter(|o| !o.passed()).collect();
        Self {
            healthy: failing_probes.is_empty(),
            failing_probes,
            hard_error: None,
        }
    }

    /// Collapse into the `(healthy, error)` shape callers act on.
    pub fn into_result(self) -> Result<bool> {
        match self.hard_error {
            Some(e) => Err(e),
            None => Ok(self.healthy),
        }
    }
}

/// Gate, then every applicable probe to completion, then notify on failure.
pub async fn pre_upgrade(cx: &ProbeContext<'_>) -> AggregateResult {
    let collaborators = cx.collaborators;

    match collaborators
        .cluster_version
        .has_upgrade_commenced(cx.upgrade)
        .await
    {
        Err(e) => {
            error!(upgrade = %cx.upgrade, error = %e, "Unable to determine whether upgrade has commenced");
            return AggregateResult::aborted(e);
        }
        Ok(true) => {
            info!(upgrade = %cx.upgrade, "Upgrade has already commenced, skipping health check");
            return AggregateResult::from_outcomes(Vec::new());
        }
        Ok(false) => {}
    }

    log_cluster_version(cx).await;

    let mut outcomes = vec![critical_alerts(cx).await, degraded_operators(cx).await];

    if cx.config.extended_probes_enabled {
        if cx.upgrade.capacity_reservation_requested {
            outcomes.push(capacity_reservation(cx).await);
        } else {
            debug!("Capacity reservation not requested, skipping scaling check");
        }
        outcomes.push(manually_cordoned_nodes(cx).await);
        outcomes.push(node_resource_pressure(cx).await);
        outcomes.push(pod_disruption_budgets(cx).await);
    }

    let result = AggregateResult::from_outcomes(outcomes);

    if result.healthy {
        info!(upgrade = %cx.upgrade, "Pre-upgrade health check passed");
        return result;
    }

    let failed: Vec<&str> = result.failing_probes.iter().map(|o| o.probe.as_str()).collect();
    warn!(upgrade = %cx.upgrade, failed = ?failed, "Pre-upgrade health check failed");

    if let Err(e) = collaborators
        .notifier
        .notify_result(cx.upgrade, &result.failing_probes)
        .await
    {
        error!(upgrade = %cx.upgrade, error = %e, "Failed to send health check notification");
    }

    result
}

/// Reduced probe set, stopping at the first failure.
pub async fn post_upgrade(cx: &ProbeContext<'_>) -> Result<bool> {
    log_cluster_version(cx).await;

    require(critical_alerts(cx).await)?;
    require(degraded_operators(cx).await)?;

    info!(upgrade = %cx.upgrade, "Post-upgrade health check passed");
    Ok(true)
}

fn require(outcome: ProbeOutcome) -> Result<()> {
    if outcome.passed() {
        return Ok(());
    }
    warn!(probe = %outcome.probe, reason = %outcome.reason, "Post-upgrade health check failed");
    Err(Error::HealthCheckFailed {
        probe: outcome.probe,
        reason: outcome.reason,
    })
}
