use async_trait::async_trait;
use kube::api::{Api, DynamicObject, ListParams};
use kube::discovery::ApiResource;
use kube::Client;
use serde_json::Value;
use tracing::debug;

use crate::collaborators::{ClusterVersionSource, DegradedOperators, VersionInfo};
use crate::context::UpgradeContext;
use crate::error::{Error, Result};

/// Name of the singleton cluster version resource.
const CLUSTER_VERSION_NAME: &str = "version";

fn cluster_version_api() -> ApiResource {
    ApiResource {
        group: "config.openshift.io".to_string(),
        version: "v1".to_string(),
        api_version: "config.openshift.io/v1".to_string(),
        kind: "ClusterVersion".to_string(),
        plural: "clusterversions".to_string(),
    }
}

fn cluster_operator_api() -> ApiResource {
    ApiResource {
        group: "config.openshift.io".to_string(),
        version: "v1".to_string(),
        api_version: "config.openshift.io/v1".to_string(),
        kind: "ClusterOperator".to_string(),
        plural: "clusteroperators".to_string(),
    }
}

/// Reads `ClusterVersion` and `ClusterOperator` resources.
#[derive(Clone)]
pub struct KubeClusterVersion {
    client: Client,
}

impl KubeClusterVersion {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn fetch(&self) -> Result<DynamicObject> {
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &cluster_version_api());
        api.get_opt(CLUSTER_VERSION_NAME).await?.ok_or_else(|| {
            Error::ClusterVersion(format!("clusterversion/{CLUSTER_VERSION_NAME} not found"))
        })
    }
}

#[async_trait]
impl ClusterVersionSource for KubeClusterVersion {
    async fn has_upgrade_commenced(&self, upgrade: &UpgradeContext) -> Result<bool> {
        let cv = self.fetch().await?;
        let commenced = upgrade_commenced(&cv.data, &upgrade.target_version);
        debug!(upgrade = %upgrade, commenced, "Checked upgrade progress");
        Ok(commenced)
    }

    async fn get_cluster_version(&self) -> Result<VersionInfo> {
        let cv = self.fetch().await?;
        Ok(version_info(&cv.data))
    }

    async fn has_degraded_operators(&self) -> Result<DegradedOperators> {
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &cluster_operator_api());
        let list = api.list(&ListParams::default()).await?;

        let degraded = list
            .items
            .iter()
            .filter(|op| condition_true(&op.data, "Degraded"))
            .filter_map(|op| op.metadata.name.clone())
            .collect();

        Ok(DegradedOperators { degraded })
    }
}

fn str_at<'a>(data: &'a Value, pointer: &str) -> Option<&'a str> {
    data.pointer(pointer).and_then(Value::as_str)
}

fn history(data: &Value) -> &[Value] {
    data.pointer("/status/history")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Extract version details from a `ClusterVersion` object's data.
fn version_info(data: &Value) -> VersionInfo {
    let current_version = history(data)
        .iter()
        .find(|h| str_at(h, "/state") == Some("Completed"))
        .and_then(|h| str_at(h, "/version"))
        .map(ToString::to_string);

    VersionInfo {
        desired_version: str_at(data, "/spec/desiredUpdate/version").map(ToString::to_string),
        channel: str_at(data, "/spec/channel").map(ToString::to_string),
        current_version,
    }
}

/// The cluster has been told to move to `target` and has started doing so.
fn upgrade_commenced(data: &Value, target: &str) -> bool {
    if target.is_empty() {
        return false;
    }
    let desired = str_at(data, "/spec/desiredUpdate/version") == Some(target);
    let recorded = history(data)
        .iter()
        .any(|h| str_at(h, "/version") == Some(target));
    desired && recorded
}

fn condition_true(data: &Value, condition: &str) -> bool {
    data.pointer("/status/conditions")
        .and_then(Value::as_array)
        .is_some_and(|conditions| {
            conditions.iter().any(|c| {
                str_at(c, "/type") == Some(condition) && str_at(c, "/status") == Some("True")
            })
        })
}
