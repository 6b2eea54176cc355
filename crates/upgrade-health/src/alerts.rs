//! Critical alert query construction and response model.

use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};

use crate::config::HealthCheckConfig;

/// Base selector: only firing alerts of critical severity gate an upgrade.
const CRITICAL_FIRING_SELECTOR: &str = r#"alertstate="firing",severity="critical""#;

/// Builds the alert query for one invocation from the configured exclusions.
///
/// Every ignored alert name and namespace adds its own negation clause, so the
/// resulting selector is the intersection of all "not this one" constraints.
#[derive(Debug, Clone, Copy)]
pub struct AlertFilter<'a> {
    ignored_alerts: &'a BTreeSet<String>,
    ignored_namespaces: &'a BTreeSet<String>,
    namespace_scope: Option<&'a str>,
}

impl<'a> AlertFilter<'a> {
    #[must_use]
    pub fn new(config: &'a HealthCheckConfig) -> Self {
        Self {
            ignored_alerts: &config.ignored_critical_alerts,
            ignored_namespaces: &config.ignored_namespaces,
            namespace_scope: config.namespace_scope.as_deref(),
        }
    }

    /// Render the PromQL selector.
    #[must_use]
    pub fn query(&self) -> String {
        let clauses: Vec<String> = std::iter::once(CRITICAL_FIRING_SELECTOR.to_string())
            .chain(
                self.namespace_scope
                    .map(|scope| format!(r#"namespace=~"{scope}""#)),
            )
            .chain(
                self.ignored_alerts
                    .iter()
                    .map(|alert| format!(r#"alertname!="{alert}""#)),
            )
            .chain(
                self.ignored_namespaces
                    .iter()
                    .map(|namespace| format!(r#"namespace!="{namespace}""#)),
            )
            .collect();

        format!("ALERTS{{{}}}", clauses.join(","))
    }
}

/// Response of an instant alert query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub data: AlertData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertData {
    #[serde(rename = "resultType", default)]
    pub result_type: String,
    #[serde(default)]
    pub result: Vec<AlertResult>,
}

/// One alert series.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertResult {
    #[serde(default)]
    pub metric: HashMap<String, String>,
    #[serde(default)]
    pub value: Option<(f64, String)>,
}

impl AlertResult {
    #[must_use]
    pub fn alert_name(&self) -> &str {
        self.metric.get("alertname").map_or("", String::as_str)
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        self.metric.get("namespace").map_or("", String::as_str)
    }
}

impl AlertResponse {
    /// Whether any alert matched the query.
    #[must_use]
    pub fn is_firing(&self) -> bool {
        !self.data.result.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> HealthCheckConfig {
        HealthCheckConfig::default()
            .with_ignored_alerts(["alert1", "alert2"])
            .with_ignored_namespaces(["ns1"])
    }

    #[test]
    fn test_query_excludes_each_ignored_alert() {
        let config = config();
        let query = AlertFilter::new(&config).query();
        assert!(query.contains(r#"alertname!="alert1""#));
        assert!(query.contains(r#"alertname!="alert2""#));
    }

    #[test]
    fn test_query_excludes_ignored_namespace() {
        let config = config();
        let query = AlertFilter::new(&config).query();
        assert!(query.contains(r#"namespace!="ns1""#));
    }

    #[test]
    fn test_query_shape() {
        let config = config();
        assert_eq!(
            AlertFilter::new(&config).query(),
            r#"ALERTS{alertstate="firing",severity="critical",namespace=~"^openshift.*|^kube.*|^default$",alertname!="alert1",alertname!="alert2",namespace!="ns1"}"#
        );
    }

    #[test]
    fn test_query_without_scope_or_exclusions() {
        let config = HealthCheckConfig {
            namespace_scope: None,
            ..HealthCheckConfig::default()
        };
        assert_eq!(
            AlertFilter::new(&config).query(),
            r#"ALERTS{alertstate="firing",severity="critical"}"#
        );
    }

    #[test]
    fn test_query_is_deterministic() {
        let a = HealthCheckConfig::default().with_ignored_alerts(["b", "a", "c"]);
        let b = HealthCheckConfig::default().with_ignored_alerts(["c", "b", "a"]);
        assert_eq!(AlertFilter::new(&a).query(), AlertFilter::new(&b).query());
    }

    #[test]
    fn test_response_deserializes_prometheus_payload() {
        let raw = r#"{
            "status": "success",
            "data": {
                "resultType": "vector",
                "result": [
                    {"metric": {"alertname": "KubeAPIDown", "namespace": "openshift-kube-apiserver"}, "value": [1700000000.0, "1"]}
                ]
            }
        }"#;
        let response: AlertResponse = serde_json::from_str(raw).unwrap();
        assert!(response.is_firing());
        assert_eq!(response.data.result[0].alert_name(), "KubeAPIDown");
        assert_eq!(response.data.result[0].namespace(), "openshift-kube-apiserver");
    }

    #[test]
    fn test_empty_response_is_not_firing() {
        assert!(!AlertResponse::default().is_firing());
    }
}
