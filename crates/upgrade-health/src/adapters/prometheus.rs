//! Prometheus client for critical alert queries.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::alerts::AlertResponse;
use crate::collaborators::AlertQueryEngine;
use crate::config::EndpointConfig;
use crate::error::{Error, Result};

/// In-cluster Prometheus of the platform monitoring stack
const DEFAULT_PROMETHEUS_URL: &str = "https://prometheus-k8s.openshift-monitoring.svc:9091";

const ENV_PROMETHEUS_URL: &str = "PROMETHEUS_URL";
const ENV_PROMETHEUS_TOKEN: &str = "PROMETHEUS_TOKEN";

const SERVICE_ACCOUNT_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
const SERVICE_CA_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/service-ca.crt";

/// Configuration for the Prometheus client
#[derive(Debug, Clone)]
pub struct PrometheusConfig {
    /// Base URL for the Prometheus API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Bearer token sent with every query
    pub bearer_token: Option<String>,
    /// Token file read when no explicit token is set
    pub token_path: Option<PathBuf>,
    /// PEM bundle trusted in addition to the system roots
    pub ca_cert_path: Option<PathBuf>,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self::from_endpoint(&EndpointConfig::default())
    }
}

impl PrometheusConfig {
    /// Resolve from the operator config; `PROMETHEUS_URL` takes precedence.
    #[must_use]
    pub fn from_endpoint(endpoint: &EndpointConfig) -> Self {
        let base_url = std::env::var(ENV_PROMETHEUS_URL)
            .ok()
            .or_else(|| endpoint.url.clone())
            .unwrap_or_else(|| DEFAULT_PROMETHEUS_URL.to_string());

        Self {
            base_url,
            timeout_secs: endpoint.timeout_secs,
            bearer_token: std::env::var(ENV_PROMETHEUS_TOKEN).ok(),
            token_path: Some(PathBuf::from(SERVICE_ACCOUNT_TOKEN_PATH)),
            ca_cert_path: Some(PathBuf::from(SERVICE_CA_PATH)),
        }
    }

    /// The in-cluster endpoint only answers to the service account over the service CA.
    fn requires_service_credentials(&self) -> bool {
        self.base_url.trim_end_matches('/') == DEFAULT_PROMETHEUS_URL
    }
}

/// [`AlertQueryEngine`] over the Prometheus HTTP API.
#[derive(Debug, Clone)]
pub struct PrometheusAlertClient {
    config: PrometheusConfig,
    client: reqwest::Client,
}

impl PrometheusAlertClient {
    /// Build the client, loading the service account token and service CA.
    ///
    /// Missing credentials are an error for the in-cluster default endpoint,
    /// since every query would otherwise be rejected.
    pub fn new(mut config: PrometheusConfig) -> Result<Self> {
        let strict = config.requires_service_credentials();
        let mut builder =
            reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs));

        if config.bearer_token.is_none() {
            if let Some(path) = &config.token_path {
                match std::fs::read_to_string(path) {
                    Ok(token) => config.bearer_token = Some(token.trim().to_string()),
                    Err(e) if strict => {
                        return Err(Error::Config(format!(
                            "failed to read service account token {}: {e}",
                            path.display()
                        )));
                    }
                    Err(e) => debug!(path = %path.display(), error = %e, "No service account token"),
                }
            }
        }
        if strict && config.bearer_token.is_none() {
            return Err(Error::Config(
                "no bearer token for the in-cluster Prometheus".to_string(),
            ));
        }

        if let Some(path) = &config.ca_cert_path {
            match std::fs::read(path) {
                Ok(pem) => {
                    let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                        Error::Config(format!("invalid CA bundle {}: {e}", path.display()))
                    })?;
                    info!(path = %path.display(), "Trusting service CA for Prometheus");
                    builder = builder.add_root_certificate(cert);
                }
                Err(e) if strict => {
                    return Err(Error::Config(format!(
                        "failed to read service CA {}: {e}",
                        path.display()
                    )));
                }
                Err(e) => debug!(path = %path.display(), error = %e, "No service CA"),
            }
        }

        let client = builder.build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl AlertQueryEngine for PrometheusAlertClient {
    async fn query(&self, query: &str) -> Result<AlertResponse> {
        let url = format!(
            "{}/api/v1/query",
            self.config.base_url.trim_end_matches('/')
        );

        debug!(query = %query, "Executing Prometheus query");

        let mut request = self.client.get(&url).query(&[("query", query)]);
        if let Some(token) = &self.config.bearer_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Query(format!(
                "Prometheus query failed with status {status}: {body}"
            )));
        }

        let alerts: AlertResponse = response.json().await?;

        if alerts.status != "success" {
            return Err(Error::Query(format!(
                "Prometheus query returned status: {}",
                alerts.status
            )));
        }

        Ok(alerts)
    }
}
