use tracing::warn;

use super::{ProbeContext, ProbeKind, ProbeOutcome};
use crate::metrics::MetricKind;

/// Fail unless the cluster can add the worker capacity reserved for the upgrade.
pub async fn capacity_reservation(cx: &ProbeContext<'_>) -> ProbeOutcome {
    match cx.collaborators.scaler.can_scale().await {
        Ok(true) => {
            cx.succeeded(MetricKind::DefaultWorkerMachinepoolNotFound);
            ProbeOutcome::pass(ProbeKind::CapacityReservation, "capacity can be reserved")
        }
        Ok(false) => {
            warn!("Cluster cannot scale for capacity reservation");
            cx.failed(MetricKind::DefaultWorkerMachinepoolNotFound);
            ProbeOutcome::fail(ProbeKind::CapacityReservation, "insufficient capacity")
        }
        Err(e) => {
            warn!(error = %e, "Capacity reservation check failed");
            cx.failed(MetricKind::DefaultWorkerMachinepoolNotFound);
            ProbeOutcome::fail(ProbeKind::CapacityReservation, "capacity check failed")
                .with_error(&e)
        }
    }
}
