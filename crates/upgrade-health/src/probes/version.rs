use tracing::{debug, info};

use super::ProbeContext;

/// Log the cluster's current version. Lookup failures are ignored entirely.
pub async fn log_cluster_version(cx: &ProbeContext<'_>) {
    match cx.collaborators.cluster_version.get_cluster_version().await {
        Ok(version) => info!(
            upgrade = %cx.upgrade,
            current = version.current_version.as_deref().unwrap_or("unknown"),
            desired = version.desired_version.as_deref().unwrap_or("none"),
            channel = version.channel.as_deref().unwrap_or("none"),
            "Evaluating cluster health"
        ),
        Err(e) => debug!(upgrade = %cx.upgrade, error = %e, "Cluster version unavailable"),
    }
}
