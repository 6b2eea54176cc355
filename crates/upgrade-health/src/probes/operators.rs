use serde_json::json;
use tracing::warn;

use super::{ProbeContext, ProbeKind, ProbeOutcome};
use crate::metrics::MetricKind;

/// Fail when any cluster operator reports degradation, or when operator
/// status cannot be read at all.
pub async fn degraded_operators(cx: &ProbeContext<'_>) -> ProbeOutcome {
    let result = match cx.collaborators.cluster_version.has_degraded_operators().await {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "Unable to read cluster operator status");
            cx.failed(MetricKind::ClusterOperatorsStatusFailed);
            return ProbeOutcome::fail(
                ProbeKind::DegradedOperators,
                "unable to read cluster operator status",
            )
            .with_error(&e);
        }
    };

    if !result.degraded.is_empty() {
        warn!(operators = ?result.degraded, "Cluster operators are degraded");
        cx.failed(MetricKind::ClusterOperatorsDegraded);
        return ProbeOutcome::fail(
            ProbeKind::DegradedOperators,
            format!("degraded operators: {}", result.degraded.join(", ")),
        )
        .with_detail(json!(result.degraded));
    }

    cx.succeeded(MetricKind::ClusterOperatorsStatusFailed);
    cx.succeeded(MetricKind::ClusterOperatorsDegraded);
    ProbeOutcome::pass(ProbeKind::DegradedOperators, "no degraded cluster operators")
}
