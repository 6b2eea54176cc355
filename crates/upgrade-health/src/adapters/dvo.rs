//! Deployment validation operator client.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::collaborators::{PdbValidator, PdbValidatorBuilder};
use crate::config::EndpointConfig;
use crate::context::UpgradeContext;
use crate::error::{Error, Result};

const DEFAULT_DVO_METRICS_URL: &str = "http://deployment-validation-operator-metrics.openshift-deployment-validation-operator.svc:8383/metrics";

const ENV_DVO_METRICS_URL: &str = "DVO_METRICS_URL";

/// Where to find the validator's metrics endpoint.
#[derive(Debug, Clone)]
pub struct DvoConfig {
    pub metrics_url: String,
    pub timeout_secs: u64,
}

impl DvoConfig {
    /// Resolve from the operator config; `DVO_METRICS_URL` takes precedence.
    #[must_use]
    pub fn from_endpoint(endpoint: &EndpointConfig) -> Self {
        let metrics_url = std::env::var(ENV_DVO_METRICS_URL)
            .ok()
            .or_else(|| endpoint.url.clone())
            .unwrap_or_else(|| DEFAULT_DVO_METRICS_URL.to_string());

        Self {
            metrics_url,
            timeout_secs: endpoint.timeout_secs,
        }
    }
}

/// Builds a [`DvoClient`] per upgrade.
#[derive(Debug, Clone)]
pub struct DvoClientBuilder {
    config: DvoConfig,
}

impl DvoClientBuilder {
    #[must_use]
    pub fn new(config: DvoConfig) -> Self {
        Self { config }
    }
}

impl PdbValidatorBuilder for DvoClientBuilder {
    fn build(&self, upgrade: &UpgradeContext) -> Result<Box<dyn PdbValidator>> {
        debug!(upgrade = %upgrade, url = %self.config.metrics_url, "Building DVO client");
        Ok(Box::new(DvoClient::new(&self.config)?))
    }
}

/// Fetches the validator's report in Prometheus text format.
#[derive(Debug, Clone)]
pub struct DvoClient {
    metrics_url: String,
    client: reqwest::Client,
}

impl DvoClient {
    pub fn new(config: &DvoConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            metrics_url: config.metrics_url.clone(),
            client,
        })
    }
}

#[async_trait]
impl PdbValidator for DvoClient {
    async fn get_metrics(&self) -> Result<Vec<u8>> {
        let response = self.client.get(&self.metrics_url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::Validator(format!(
                "DVO metrics request failed with status {status}"
            )));
        }

        let body = response.bytes().await?;
        debug!(bytes = body.len(), "Fetched DVO metrics");
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const REPORT: &str = "deployment_validation_operator_pdb_min_available{kind=\"PodDisruptionBudget\",name=\"db\",namespace_name=\"app\"} 1\n";

    fn builder(server: &MockServer) -> DvoClientBuilder {
        DvoClientBuilder::new(DvoConfig {
            metrics_url: format!("{}/metrics", server.uri()),
            timeout_secs: 5,
        })
    }

    #[tokio::test]
    async fn test_fetches_report_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metrics"))
            .respond_with(ResponseTemplate::new(200).set_body_string(REPORT))
            .expect(1)
            .mount(&server)
            .await;

        let upgrade = UpgradeContext::new("test-upgradeconfig", "test-namespace");
        let validator = builder(&server).build(&upgrade).unwrap();
        let report = validator.get_metrics().await.unwrap();

        assert_eq!(report, REPORT.as_bytes());
    }

    #[tokio::test]
    async fn test_non_success_is_validator_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let upgrade = UpgradeContext::new("test-upgradeconfig", "test-namespace");
        let validator = builder(&server).build(&upgrade).unwrap();
        let err = validator.get_metrics().await.unwrap_err();

        assert!(matches!(err, Error::Validator(_)));
    }
}
