use async_trait::async_trait;
use chrono::Utc;
use notify::{FailedCheck, Notifier, NotifyEvent};
use tracing::info;

use crate::collaborators::ResultNotifier;
use crate::context::UpgradeContext;
use crate::error::{Error, Result};
use crate::probes::ProbeOutcome;

/// Sends failed health checks through the configured notification channels.
pub struct WebhookResultNotifier {
    notifier: Notifier,
}

impl WebhookResultNotifier {
    #[must_use]
    pub fn new(notifier: Notifier) -> Self {
        Self { notifier }
    }
}

fn health_check_failed(upgrade: &UpgradeContext, failures: &[ProbeOutcome]) -> NotifyEvent {
    NotifyEvent::HealthCheckFailed {
        upgrade: upgrade.name.clone(),
        namespace: upgrade.namespace.clone(),
        phase: upgrade.phase.to_string(),
        version: upgrade.target_version.clone(),
        failures: failures
            .iter()
            .map(|outcome| FailedCheck {
                name: outcome.probe.to_string(),
                reason: match &outcome.error {
                    Some(error) => format!("{} ({error})", outcome.reason),
                    None => outcome.reason.clone(),
                },
            })
            .collect(),
        timestamp: Utc::now(),
    }
}

#[async_trait]
impl ResultNotifier for WebhookResultNotifier {
    async fn notify_result(
        &self,
        upgrade: &UpgradeContext,
        failures: &[ProbeOutcome],
    ) -> Result<()> {
        if !self.notifier.has_channels() {
            info!(upgrade = %upgrade, "No notification channels, skipping notification");
            return Ok(());
        }

        let results = self
            .notifier
            .notify_and_wait(health_check_failed(upgrade, failures))
            .await;

        let first_error = results
            .into_iter()
            .find_map(|(channel, r)| r.err().map(|e| (channel, e)));
        match first_error {
            Some((channel, e)) => Err(Error::Notification(format!("{channel}: {e}"))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use notify::{ChannelError, NotifyChannel};

    use super::*;
    use crate::context::UpgradePhase;
    use crate::probes::ProbeKind;

    #[derive(Default)]
    struct Capture {
        events: Mutex<Vec<NotifyEvent>>,
        reject: bool,
    }

    #[async_trait]
    impl NotifyChannel for Capture {
        fn name(&self) -> &'static str {
            "capture"
        }

        fn enabled(&self) -> bool {
            true
        }

        async fn send(&self, event: &NotifyEvent) -> std::result::Result<(), ChannelError> {
            self.events.lock().unwrap().push(event.clone());
            if self.reject {
                Err(ChannelError::NotConfigured("capture".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn upgrade() -> UpgradeContext {
        UpgradeContext::new("test-upgradeconfig", "test-namespace")
            .with_phase(UpgradePhase::Upgrading)
            .with_target_version("4.15.4")
    }

    #[tokio::test]
    async fn test_event_carries_failures_and_phase() {
        let capture = Arc::new(Capture::default());
        let channels: Vec<Arc<dyn NotifyChannel>> = vec![capture.clone()];
        let notifier = WebhookResultNotifier::new(Notifier::with_channels(channels));

        let failures = vec![
            ProbeOutcome::fail(ProbeKind::CriticalAlerts, "1 critical alert(s) firing"),
            ProbeOutcome::fail(ProbeKind::PodDisruptionBudgets, "unable to validate")
                .with_error(&Error::Validator("timeout".to_string())),
        ];
        notifier.notify_result(&upgrade(), &failures).await.unwrap();

        let events = capture.events.lock().unwrap();
        let NotifyEvent::HealthCheckFailed {
            phase,
            version,
            failures,
            ..
        } = &events[0];
        assert_eq!(phase, "Upgrading");
        assert_eq!(version, "4.15.4");
        assert_eq!(failures[0].name, "critical alerts");
        assert_eq!(
            failures[1].reason,
            "unable to validate (PDB validation unavailable: timeout)"
        );
    }

    #[tokio::test]
    async fn test_channel_error_is_returned() {
        let capture = Arc::new(Capture {
            reject: true,
            ..Capture::default()
        });
        let channels: Vec<Arc<dyn NotifyChannel>> = vec![capture];
        let notifier = WebhookResultNotifier::new(Notifier::with_channels(channels));

        let err = notifier.notify_result(&upgrade(), &[]).await.unwrap_err();
        assert!(matches!(err, Error::Notification(ref msg) if msg.starts_with("capture:")));
    }

    #[tokio::test]
    async fn test_no_channels_is_not_an_error() {
        let notifier = WebhookResultNotifier::new(Notifier::disabled());
        notifier.notify_result(&upgrade(), &[]).await.unwrap();
    }
}
