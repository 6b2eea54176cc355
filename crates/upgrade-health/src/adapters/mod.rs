//! Production implementations of the collaborator traits.

mod cluster_reader;
mod cluster_version;
mod dvo;
mod machinery;
mod notifier;
mod prometheus;
mod scaler;

pub use cluster_reader::KubeClusterReader;
pub use cluster_version::KubeClusterVersion;
pub use dvo::{DvoClient, DvoClientBuilder, DvoConfig};
pub use machinery::NodeMachinery;
pub use notifier::WebhookResultNotifier;
pub use prometheus::{PrometheusAlertClient, PrometheusConfig};
pub use scaler::MachinePoolScaler;

use std::sync::Arc;

use kube::Client;

use crate::collaborators::Collaborators;
use crate::config::OperatorConfig;
use crate::error::Result;
use crate::metrics::OtelMetricRecorder;

/// Wire every production adapter against one Kubernetes client.
pub fn production_collaborators(client: Client, config: &OperatorConfig) -> Result<Collaborators> {
    let prometheus = PrometheusAlertClient::new(PrometheusConfig::from_endpoint(&config.prometheus))?;

    Ok(Collaborators {
        cluster_version: Arc::new(KubeClusterVersion::new(client.clone())),
        alerts: Arc::new(prometheus),
        nodes: Arc::new(NodeMachinery),
        scaler: Arc::new(MachinePoolScaler::new(client.clone())),
        pdb_validators: Arc::new(DvoClientBuilder::new(DvoConfig::from_endpoint(&config.dvo))),
        cluster: Arc::new(KubeClusterReader::new(client)),
        notifier: Arc::new(WebhookResultNotifier::new(notify::Notifier::from_env())),
        metrics: Arc::new(OtelMetricRecorder::new()),
    })
}
