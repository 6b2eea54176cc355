use async_trait::async_trait;
use kube::api::{Api, DynamicObject, ListParams};
use kube::discovery::ApiResource;
use kube::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::collaborators::CapacityScaler;
use crate::error::{Error, Result};

const MACHINE_API_NAMESPACE: &str = "openshift-machine-api";
const WORKER_POOL_SELECTOR: &str = "hive.openshift.io/machine-pool=worker";

fn machine_set_api() -> ApiResource {
    ApiResource {
        group: "machine.openshift.io".to_string(),
        version: "v1beta1".to_string(),
        api_version: "machine.openshift.io/v1beta1".to_string(),
        kind: "MachineSet".to_string(),
        plural: "machinesets".to_string(),
    }
}

/// Decides scaling readiness from the default worker pool's machine sets.
#[derive(Clone)]
pub struct MachinePoolScaler {
    client: Client,
}

impl MachinePoolScaler {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CapacityScaler for MachinePoolScaler {
    async fn can_scale(&self) -> Result<bool> {
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), MACHINE_API_NAMESPACE, &machine_set_api());
        let sets = api
            .list(&ListParams::default().labels(WORKER_POOL_SELECTOR))
            .await?;

        if sets.items.is_empty() {
            return Err(Error::Capacity(
                "default worker machine pool not found".to_string(),
            ));
        }

        let not_ready: Vec<String> = sets
            .items
            .iter()
            .filter(|ms| !machine_set_available(&ms.data))
            .filter_map(|ms| ms.metadata.name.clone())
            .collect();

        if not_ready.is_empty() {
            debug!(count = sets.items.len(), "Worker machine sets fully available");
            Ok(true)
        } else {
            info!(machine_sets = ?not_ready, "Worker machine sets not fully available");
            Ok(false)
        }
    }
}

/// Every requested replica of the machine set is available.
fn machine_set_available(data: &Value) -> bool {
    let replicas = data
        .pointer("/spec/replicas")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let available = data
        .pointer("/status/availableReplicas")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    available >= replicas
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_fully_available_machine_set() {
        let ms = json!({ "spec": { "replicas": 3 }, "status": { "availableReplicas": 3 } });
        assert!(machine_set_available(&ms));
    }

    #[test]
    fn test_partially_available_machine_set() {
        let ms = json!({ "spec": { "replicas": 3 }, "status": { "availableReplicas": 2 } });
        assert!(!machine_set_available(&ms));
    }

    #[test]
    fn test_machine_set_without_status_is_unavailable() {
        let ms = json!({ "spec": { "replicas": 1 } });
        assert!(!machine_set_available(&ms));
    }

    #[test]
    fn test_scaled_to_zero_machine_set_is_available() {
        assert!(machine_set_available(&json!({ "spec": { "replicas": 0 } })));
    }
}
