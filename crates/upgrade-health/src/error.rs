//! Error types for the upgrade health gate.

use thiserror::Error;

use crate::probes::ProbeKind;

/// Errors raised by the health gate and its collaborators.
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API call failed
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is present but invalid
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The alerting backend rejected or failed the query
    #[error("Alert query failed: {0}")]
    Query(String),

    /// Cluster version or operator status could not be determined
    #[error("Cluster version unavailable: {0}")]
    ClusterVersion(String),

    /// Capacity reservation check could not be completed
    #[error("Capacity check failed: {0}")]
    Capacity(String),

    /// PDB validator could not be built or queried
    #[error("PDB validation unavailable: {0}")]
    Validator(String),

    /// Result notification could not be delivered
    #[error("Notification failed: {0}")]
    Notification(String),

    /// A post-upgrade probe failed
    #[error("{probe} health check failed: {reason}")]
    HealthCheckFailed { probe: ProbeKind, reason: String },
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
