use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use k8s_openapi::api::policy::v1::PodDisruptionBudget;
use kube::api::{Api, ListParams};
use kube::Client;
use tracing::debug;

use crate::collaborators::ClusterReader;
use crate::error::Result;

/// Lists cluster objects through the Kubernetes API.
#[derive(Clone)]
pub struct KubeClusterReader {
    client: Client,
}

impl KubeClusterReader {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterReader for KubeClusterReader {
    async fn list_nodes(&self) -> Result<Vec<Node>> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let list = nodes.list(&ListParams::default()).await?;
        debug!(count = list.items.len(), "Listed nodes");
        Ok(list.items)
    }

    async fn list_pod_disruption_budgets(&self) -> Result<Vec<PodDisruptionBudget>> {
        let budgets: Api<PodDisruptionBudget> = Api::all(self.client.clone());
        let list = budgets.list(&ListParams::default()).await?;
        debug!(count = list.items.len(), "Listed pod disruption budgets");
        Ok(list.items)
    }
}
