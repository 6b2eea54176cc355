use k8s_openapi::api::core::v1::{Node, Taint};

use crate::collaborators::{CordonStatus, NodeInspector};

const TAINT_UNSCHEDULABLE: &str = "node.kubernetes.io/unschedulable";
const TAINT_MEMORY_PRESSURE: &str = "node.kubernetes.io/memory-pressure";
const TAINT_DISK_PRESSURE: &str = "node.kubernetes.io/disk-pressure";
const TAINT_PID_PRESSURE: &str = "node.kubernetes.io/pid-pressure";

const ANNOTATION_CURRENT_CONFIG: &str = "machineconfiguration.openshift.io/currentConfig";
const ANNOTATION_DESIRED_CONFIG: &str = "machineconfiguration.openshift.io/desiredConfig";
const ANNOTATION_MCD_STATE: &str = "machineconfiguration.openshift.io/state";
const MCD_STATE_WORKING: &str = "Working";

/// Reads cordon, upgrade and pressure state straight off the node object.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeMachinery;

impl NodeMachinery {
    fn taint<'a>(node: &'a Node, key: &str) -> Option<&'a Taint> {
        node.spec
            .as_ref()?
            .taints
            .as_ref()?
            .iter()
            .find(|t| t.key == key)
    }

    fn condition_true(node: &Node, condition: &str) -> bool {
        node.status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .is_some_and(|conditions| {
                conditions
                    .iter()
                    .any(|c| c.type_ == condition && c.status == "True")
            })
    }

    fn annotation<'a>(node: &'a Node, key: &str) -> Option<&'a str> {
        node.metadata
            .annotations
            .as_ref()?
            .get(key)
            .map(String::as_str)
    }

    fn pressure(node: &Node, taint: &str, condition: &str) -> bool {
        Self::taint(node, taint).is_some() || Self::condition_true(node, condition)
    }
}

impl NodeInspector for NodeMachinery {
    fn is_node_cordoned(&self, node: &Node) -> CordonStatus {
        let is_cordoned = node
            .spec
            .as_ref()
            .and_then(|s| s.unschedulable)
            .unwrap_or(false);

        let added_at = if is_cordoned {
            Self::taint(node, TAINT_UNSCHEDULABLE)
                .and_then(|t| t.time_added.as_ref())
                .map(|t| t.0)
        } else {
            None
        };

        CordonStatus {
            is_cordoned,
            added_at,
        }
    }

    fn is_node_upgrading(&self, node: &Node) -> bool {
        if Self::annotation(node, ANNOTATION_MCD_STATE) == Some(MCD_STATE_WORKING) {
            return true;
        }
        match (
            Self::annotation(node, ANNOTATION_CURRENT_CONFIG),
            Self::annotation(node, ANNOTATION_DESIRED_CONFIG),
        ) {
            (Some(current), Some(desired)) => current != desired,
            _ => false,
        }
    }

    fn has_memory_pressure(&self, node: &Node) -> bool {
        Self::pressure(node, TAINT_MEMORY_PRESSURE, "MemoryPressure")
    }

    fn has_disk_pressure(&self, node: &Node) -> bool {
        Self::pressure(node, TAINT_DISK_PRESSURE, "DiskPressure")
    }

    fn has_pid_pressure(&self, node: &Node) -> bool {
        Self::pressure(node, TAINT_PID_PRESSURE, "PIDPressure")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};
    use k8s_openapi::api::core::v1::{NodeCondition, NodeSpec, NodeStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};

    use super::*;

    fn taint(key: &str) -> Taint {
        Taint {
            key: key.to_string(),
            effect: "NoSchedule".to_string(),
            ..Taint::default()
        }
    }

    fn node_with(spec: NodeSpec, annotations: &[(&str, &str)]) -> Node {
        Node {
            metadata: ObjectMeta {
                name: Some("worker-0".to_string()),
                annotations: Some(
                    annotations
                        .iter()
                        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                        .collect::<BTreeMap<_, _>>(),
                ),
                ..ObjectMeta::default()
            },
            spec: Some(spec),
            ..Node::default()
        }
    }

    #[test]
    fn test_cordoned_node_reports_taint_time() {
        let added = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let node = node_with(
            NodeSpec {
                unschedulable: Some(true),
                taints: Some(vec![Taint {
                    time_added: Some(Time(added)),
                    ..taint(TAINT_UNSCHEDULABLE)
                }]),
                ..NodeSpec::default()
            },
            &[],
        );

        let status = NodeMachinery.is_node_cordoned(&node);
        assert!(status.is_cordoned);
        assert_eq!(status.added_at, Some(added));
    }

    #[test]
    fn test_schedulable_node_is_not_cordoned() {
        let node = node_with(NodeSpec::default(), &[]);
        assert_eq!(NodeMachinery.is_node_cordoned(&node), CordonStatus::default());
    }

    #[test]
    fn test_upgrading_when_machine_config_differs() {
        let node = node_with(
            NodeSpec::default(),
            &[
                (ANNOTATION_CURRENT_CONFIG, "rendered-worker-a"),
                (ANNOTATION_DESIRED_CONFIG, "rendered-worker-b"),
            ],
        );
        assert!(NodeMachinery.is_node_upgrading(&node));
    }

    #[test]
    fn test_upgrading_when_daemon_working() {
        let node = node_with(
            NodeSpec::default(),
            &[
                (ANNOTATION_CURRENT_CONFIG, "rendered-worker-a"),
                (ANNOTATION_DESIRED_CONFIG, "rendered-worker-a"),
                (ANNOTATION_MCD_STATE, MCD_STATE_WORKING),
            ],
        );
        assert!(NodeMachinery.is_node_upgrading(&node));
    }

    #[test]
    fn test_settled_node_is_not_upgrading() {
        let node = node_with(
            NodeSpec::default(),
            &[
                (ANNOTATION_CURRENT_CONFIG, "rendered-worker-a"),
                (ANNOTATION_DESIRED_CONFIG, "rendered-worker-a"),
                (ANNOTATION_MCD_STATE, "Done"),
            ],
        );
        assert!(!NodeMachinery.is_node_upgrading(&node));
    }

    #[test]
    fn test_pressure_from_taint() {
        let node = node_with(
            NodeSpec {
                taints: Some(vec![taint(TAINT_DISK_PRESSURE)]),
                ..NodeSpec::default()
            },
            &[],
        );
        assert!(NodeMachinery.has_disk_pressure(&node));
        assert!(!NodeMachinery.has_memory_pressure(&node));
        assert!(!NodeMachinery.has_pid_pressure(&node));
    }

    #[test]
    fn test_pressure_from_condition() {
        let mut node = node_with(NodeSpec::default(), &[]);
        node.status = Some(NodeStatus {
            conditions: Some(vec![
                NodeCondition {
                    type_: "MemoryPressure".to_string(),
                    status: "True".to_string(),
                    ..NodeCondition::default()
                },
                NodeCondition {
                    type_: "PIDPressure".to_string(),
                    status: "False".to_string(),
                    ..NodeCondition::default()
                },
            ]),
            ..NodeStatus::default()
        });
        assert!(NodeMachinery.has_memory_pressure(&node));
        assert!(!NodeMachinery.has_pid_pressure(&node));
    }
}
