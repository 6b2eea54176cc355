use serde_json::json;
use tracing::{debug, warn};

use super::{ProbeContext, ProbeKind, ProbeOutcome};
use crate::alerts::AlertFilter;
use crate::metrics::MetricKind;

/// Fail when any critical alert outside the ignore lists is firing.
///
/// A failed query is inconclusive: an alerting outage alone does not block
/// the upgrade, but it is recorded as `MetricsQueryFailed`.
pub async fn critical_alerts(cx: &ProbeContext<'_>) -> ProbeOutcome {
    let query = AlertFilter::new(cx.config).query();
    debug!(query = %query, "Querying critical alerts");

    let response = match cx.collaborators.alerts.query(&query).await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "Unable to query critical alerts");
            cx.failed(MetricKind::MetricsQueryFailed);
            return ProbeOutcome::inconclusive(
                ProbeKind::CriticalAlerts,
                "unable to query critical alerts",
            )
            .with_error(&e);
        }
    };

    if response.is_firing() {
        let firing: Vec<_> = response
            .data
            .result
            .iter()
            .map(|r| json!({ "alertname": r.alert_name(), "namespace": r.namespace() }))
            .collect();
        warn!(count = firing.len(), "Critical alerts are firing");
        cx.failed(MetricKind::CriticalAlertsFiring);
        return ProbeOutcome::fail(
            ProbeKind::CriticalAlerts,
            format!("{} critical alert(s) firing", firing.len()),
        )
        .with_detail(json!(firing));
    }

    cx.succeeded(MetricKind::MetricsQueryFailed);
    cx.succeeded(MetricKind::CriticalAlertsFiring);
    ProbeOutcome::pass(ProbeKind::CriticalAlerts, "no critical alerts firing")
}
