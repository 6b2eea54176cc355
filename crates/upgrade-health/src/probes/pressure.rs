use std::collections::BTreeMap;

use serde_json::json;
use tracing::warn;

use super::{node_name, ProbeContext, ProbeKind, ProbeOutcome};
use crate::metrics::MetricKind;

/// Fail when any node reports memory, disk or PID pressure.
///
/// Every node and every pressure dimension is evaluated, so the detail lists
/// the complete set of pressured nodes.
pub async fn node_resource_pressure(cx: &ProbeContext<'_>) -> ProbeOutcome {
    let nodes = match cx.collaborators.cluster.list_nodes().await {
        Ok(nodes) => nodes,
        Err(e) => {
            warn!(error = %e, "Unable to list cluster nodes");
            cx.failed(MetricKind::ClusterNodeQueryFailed);
            return ProbeOutcome::fail(ProbeKind::NodeResourcePressure, "unable to list nodes")
                .with_error(&e);
        }
    };

    let inspector = &cx.collaborators.nodes;
    let mut pressured: BTreeMap<String, Vec<&'static str>> = BTreeMap::new();
    for node in &nodes {
        let memory = inspector.has_memory_pressure(node);
        let disk = inspector.has_disk_pressure(node);
        let pid = inspector.has_pid_pressure(node);

        let kinds: Vec<&'static str> = [(memory, "memory"), (disk, "disk"), (pid, "pid")]
            .into_iter()
            .filter_map(|(under_pressure, kind)| under_pressure.then_some(kind))
            .collect();
        if !kinds.is_empty() {
            pressured.insert(node_name(node), kinds);
        }
    }

    if !pressured.is_empty() {
        warn!(nodes = ?pressured, "Nodes are under resource pressure");
        cx.failed(MetricKind::ClusterNodesTaintedUnschedulable);
        return ProbeOutcome::fail(
            ProbeKind::NodeResourcePressure,
            format!("{} node(s) under resource pressure", pressured.len()),
        )
        .with_detail(json!(pressured));
    }

    cx.succeeded(MetricKind::ClusterNodeQueryFailed);
    cx.succeeded(MetricKind::ClusterNodesTaintedUnschedulable);
    ProbeOutcome::pass(ProbeKind::NodeResourcePressure, "no node resource pressure")
}
