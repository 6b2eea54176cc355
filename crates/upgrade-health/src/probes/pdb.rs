use std::collections::BTreeSet;

use k8s_openapi::api::policy::v1::PodDisruptionBudget;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use tracing::{debug, warn};

use super::{ProbeContext, ProbeKind, ProbeOutcome};
use crate::error::Result;
use crate::metrics::MetricKind;

/// Prefix shared by the validator's PDB checks.
const PDB_CHECK_PREFIX: &str = "deployment_validation_operator_pdb_";

lazy_static! {
    static ref SAMPLE_LINE: Regex =
        Regex::new(r"^([a-zA-Z_:][a-zA-Z0-9_:]*)\{([^}]*)\}\s+(\S+)").expect("valid sample regex");
    static ref LABEL_PAIR: Regex =
        Regex::new(r#"([a-zA-Z_][a-zA-Z0-9_]*)="((?:[^"\\]|\\.)*)""#).expect("valid label regex");
}

/// Fail when any pod disruption budget would block node drains.
pub async fn pod_disruption_budgets(cx: &ProbeContext<'_>) -> ProbeOutcome {
    match find_invalid_budgets(cx).await {
        Ok(invalid) if invalid.is_empty() => {
            cx.succeeded(MetricKind::ClusterInvalidPDB);
            ProbeOutcome::pass(ProbeKind::PodDisruptionBudgets, "no invalid pod disruption budgets")
        }
        Ok(invalid) => {
            warn!(budgets = ?invalid, "Invalid pod disruption budgets found");
            cx.failed(MetricKind::ClusterInvalidPDB);
            ProbeOutcome::fail(
                ProbeKind::PodDisruptionBudgets,
                format!("{} invalid pod disruption budget(s)", invalid.len()),
            )
            .with_detail(json!(invalid))
        }
        Err(e) => {
            warn!(error = %e, "Unable to validate pod disruption budgets");
            cx.failed(MetricKind::ClusterInvalidPDB);
            ProbeOutcome::fail(
                ProbeKind::PodDisruptionBudgets,
                "unable to validate pod disruption budgets",
            )
            .with_error(&e)
        }
    }
}

async fn find_invalid_budgets(cx: &ProbeContext<'_>) -> Result<Vec<String>> {
    let budgets = cx.collaborators.cluster.list_pod_disruption_budgets().await?;
    debug!(count = budgets.len(), "Listed pod disruption budgets");

    let validator = cx.collaborators.pdb_validators.build(cx.upgrade)?;
    let report = validator.get_metrics().await?;

    let ignored = &cx.config.ignored_namespaces;
    let invalid: BTreeSet<String> = invalid_budgets_in_listing(&budgets, ignored)
        .into_iter()
        .chain(invalid_budgets_in_report(&report, ignored))
        .collect();
    Ok(invalid.into_iter().collect())
}

/// Budgets whose spec can never allow a voluntary eviction, as `namespace/name`.
#[must_use]
pub fn invalid_budgets_in_listing(
    budgets: &[PodDisruptionBudget],
    ignored_namespaces: &BTreeSet<String>,
) -> Vec<String> {
    budgets
        .iter()
        .filter(|pdb| {
            let namespace = pdb.metadata.namespace.as_deref().unwrap_or_default();
            !ignored_namespaces.contains(namespace)
        })
        .filter(|pdb| {
            pdb.spec.as_ref().is_some_and(|spec| {
                spec.max_unavailable.as_ref().is_some_and(blocks_all_disruption)
                    || spec.min_available.as_ref().is_some_and(requires_every_pod)
            })
        })
        .map(|pdb| {
            format!(
                "{}/{}",
                pdb.metadata.namespace.as_deref().unwrap_or_default(),
                pdb.metadata.name.as_deref().unwrap_or_default()
            )
        })
        .collect()
}

fn blocks_all_disruption(value: &IntOrString) -> bool {
    match value {
        IntOrString::Int(n) => *n == 0,
        IntOrString::String(s) => matches!(s.trim(), "0" | "0%"),
    }
}

fn requires_every_pod(value: &IntOrString) -> bool {
    matches!(value, IntOrString::String(s) if s.trim() == "100%")
}

/// Budgets flagged by the validator report, as `namespace/name`.
///
/// The report is Prometheus text exposition; any PDB check sample with a
/// non-zero value marks its budget invalid.
#[must_use]
pub fn invalid_budgets_in_report(
    report: &[u8],
    ignored_namespaces: &BTreeSet<String>,
) -> Vec<String> {
    let text = String::from_utf8_lossy(report);
    let mut invalid = BTreeSet::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(caps) = SAMPLE_LINE.captures(line) else {
            continue;
        };
        if !caps[1].starts_with(PDB_CHECK_PREFIX) {
            continue;
        }
        let flagged = caps[3].parse::<f64>().is_ok_and(|v| v != 0.0);
        if !flagged {
            continue;
        }

        let mut namespace = "";
        let mut name = "";
        for pair in LABEL_PAIR.captures_iter(&caps[2]) {
            let (key, value) = (pair.get(1), pair.get(2));
            match (key.map(|k| k.as_str()), value) {
                (Some("namespace_name" | "namespace"), Some(v)) => namespace = v.as_str(),
                (Some("name"), Some(v)) => name = v.as_str(),
                _ => {}
            }
        }
        if ignored_namespaces.contains(namespace) {
            continue;
        }
        invalid.insert(format!("{namespace}/{name}"));
    }

    invalid.into_iter().collect()
}
