use serde_json::json;
use tracing::{debug, warn};

use super::{node_name, ProbeContext, ProbeKind, ProbeOutcome};
use crate::metrics::MetricKind;

/// Fail when a node is cordoned by someone other than the upgrade itself.
pub async fn manually_cordoned_nodes(cx: &ProbeContext<'_>) -> ProbeOutcome {
    let nodes = match cx.collaborators.cluster.list_nodes().await {
        Ok(nodes) => nodes,
        Err(e) => {
            warn!(error = %e, "Unable to list cluster nodes");
            cx.failed(MetricKind::ClusterNodeQueryFailed);
            return ProbeOutcome::fail(ProbeKind::ManuallyCordonedNodes, "unable to list nodes")
                .with_error(&e);
        }
    };

    let inspector = &cx.collaborators.nodes;
    let mut manual = Vec::new();
    for node in &nodes {
        let cordon = inspector.is_node_cordoned(node);
        if !cordon.is_cordoned {
            continue;
        }
        if inspector.is_node_upgrading(node) {
            debug!(node = %node_name(node), "Node cordoned by upgrade");
            continue;
        }
        manual.push(json!({
            "node": node_name(node),
            "since": cordon.added_at.map(|t| t.to_rfc3339()),
        }));
    }

    if !manual.is_empty() {
        warn!(count = manual.len(), "Nodes are manually cordoned");
        cx.failed(MetricKind::ClusterNodesManuallyCordoned);
        return ProbeOutcome::fail(
            ProbeKind::ManuallyCordonedNodes,
            format!("{} node(s) manually cordoned", manual.len()),
        )
        .with_detail(json!(manual));
    }

    cx.succeeded(MetricKind::ClusterNodeQueryFailed);
    cx.succeeded(MetricKind::ClusterNodesManuallyCordoned);
    ProbeOutcome::pass(ProbeKind::ManuallyCordonedNodes, "no manually cordoned nodes")
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::Node;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    use super::*;
    use crate::collaborators::CordonStatus;
    use crate::config::HealthCheckConfig;
    use crate::context::UpgradeContext;
    use crate::metrics::HealthCheckStage;
    use crate::probes::testing::{Doubles, UPGRADE_NAME};
    use crate::probes::ProbeStatus;
    use crate::Error;

    fn node(name: &str) -> Node {
        Node {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..ObjectMeta::default()
            },
            ..Node::default()
        }
    }

    async fn run(doubles: Doubles) -> ProbeOutcome {
        let collaborators = doubles.into_collaborators();
        let config = HealthCheckConfig::default();
        let upgrade = UpgradeContext::new(UPGRADE_NAME, "test-namespace");
        let cx = ProbeContext {
            collaborators: &collaborators,
            config: &config,
            upgrade: &upgrade,
            stage: HealthCheckStage::PreUpgrade,
        };
        manually_cordoned_nodes(&cx).await
    }

    #[tokio::test]
    async fn test_upgrading_check_only_runs_for_cordoned_nodes() {
        let mut doubles = Doubles::default();
        doubles
            .cluster
            .expect_list_nodes()
            .times(1)
            .return_once(|| Ok(vec![node("a"), node("b")]));
        doubles
            .nodes
            .expect_is_node_cordoned()
            .times(2)
            .returning(|n| CordonStatus {
                is_cordoned: n.metadata.name.as_deref() == Some("b"),
                added_at: None,
            });
        doubles
            .nodes
            .expect_is_node_upgrading()
            .withf(|n| n.metadata.name.as_deref() == Some("b"))
            .times(1)
            .return_const(true);
        doubles.expect_succeeded(MetricKind::ClusterNodeQueryFailed);
        doubles.expect_succeeded(MetricKind::ClusterNodesManuallyCordoned);

        assert_eq!(run(doubles).await.status, ProbeStatus::Pass);
    }

    #[tokio::test]
    async fn test_manual_cordon_fails() {
        let mut doubles = Doubles::default();
        doubles
            .cluster
            .expect_list_nodes()
            .times(1)
            .return_once(|| Ok(vec![node("testNode")]));
        doubles
            .nodes
            .expect_is_node_cordoned()
            .times(1)
            .returning(|_| CordonStatus {
                is_cordoned: true,
                added_at: None,
            });
        doubles
            .nodes
            .expect_is_node_upgrading()
            .times(1)
            .return_const(false);
        doubles.expect_failed(MetricKind::ClusterNodesManuallyCordoned);

        let outcome = run(doubles).await;
        assert_eq!(outcome.status, ProbeStatus::Fail);
        assert_eq!(outcome.detail.unwrap()[0]["node"], serde_json::json!("testNode"));
    }

    #[tokio::test]
    async fn test_list_failure_records_query_failed() {
        let mut doubles = Doubles::default();
        doubles
            .cluster
            .expect_list_nodes()
            .times(1)
            .return_once(|| Err(Error::Config("forbidden".to_string())));
        doubles.expect_failed(MetricKind::ClusterNodeQueryFailed);

        assert_eq!(run(doubles).await.status, ProbeStatus::Fail);
    }
}
