//! Alert notification dispatch

use async_trait::async_trait;
use procwatch_domain::{Alert, ChannelType, DomainResult, ProcessMonitor};

/// Delivers newly raised alerts to a monitor's channels
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn notify(&self, monitor: &ProcessMonitor, alert: &Alert) -> DomainResult<()>;
}

/// Notifier that records deliveries in the log
///
/// Channel integrations (mail, chat, webhooks) plug in behind [`AlertNotifier`].
#[derive(Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl AlertNotifier for TracingNotifier {
    async fn notify(&self, monitor: &ProcessMonitor, alert: &Alert) -> DomainResult<()> {
        let channels: Vec<_> = monitor
            .alert_settings
            .channels
            .iter()
            .filter(|c| c.enabled)
            .collect();

        if channels.is_empty() {
            tracing::warn!(
                monitor_id = %monitor.id,
                alert_id = %alert.alert_id,
                severity = ?alert.severity,
                "Alert raised: {}",
                alert.message
            );
            return Ok(());
        }

        for channel in channels {
            let kind = match channel.channel_type {
                ChannelType::Email => "email",
                ChannelType::Slack => "slack",
                ChannelType::Webhook => "webhook",
                ChannelType::Sms => "sms",
            };
            tracing::warn!(
                monitor_id = %monitor.id,
                alert_id = %alert.alert_id,
                severity = ?alert.severity,
                channel = kind,
                target = %channel.target,
                "Alert dispatched: {}",
                alert.message
            );
        }

        Ok(())
    }
}

/// Whether the monitor's settings ask for this alert to be pushed
pub fn should_notify(monitor: &ProcessMonitor, alert: &Alert) -> bool {
    monitor
        .alert_settings
        .notify_on_severity
        .contains(&alert.severity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use procwatch_domain::{
        Actor, AlertSettings, AlertType, ProcessId, Severity, SlaTargets, Thresholds,
    };

    fn monitor() -> ProcessMonitor {
        ProcessMonitor::new(
            ProcessId::new(),
            "m",
            Thresholds::default(),
            AlertSettings::default(),
            SlaTargets::default(),
            &Actor::system(),
        )
    }

    #[test]
    fn test_default_settings_notify_high_and_critical() {
        let monitor = monitor();
        let high = Alert::new(monitor.id, AlertType::Manual, Severity::High, "x", Default::default());
        let low = Alert::new(monitor.id, AlertType::Manual, Severity::Low, "x", Default::default());

        assert!(should_notify(&monitor, &high));
        assert!(!should_notify(&monitor, &low));
    }

    #[test]
    fn test_tracing_notifier_never_fails() {
        let monitor = monitor();
        let alert = Alert::new(monitor.id, AlertType::Manual, Severity::High, "x", Default::default());
        tokio_test::block_on(async {
            TracingNotifier.notify(&monitor, &alert).await.unwrap();
        });
    }
}
