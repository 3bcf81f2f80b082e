//! In-Memory Alert Repository Implementation

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use procwatch_domain::{Alert, AlertId, AlertRepository, DomainResult, MonitorId};

use super::check_revision;
use crate::error::PersistenceError;

/// Alerts per monitor, kept in trigger order and never removed
#[derive(Debug, Default)]
pub struct InMemoryAlertRepository {
    alerts: RwLock<HashMap<MonitorId, Vec<Alert>>>,
}

impl InMemoryAlertRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlertRepository for InMemoryAlertRepository {
    async fn insert(&self, alert: &Alert) -> DomainResult<()> {
        self.alerts
            .write()
            .entry(alert.monitor_id)
            .or_default()
            .push(alert.clone());
        Ok(())
    }

    async fn insert_if_no_open(&self, alert: &Alert) -> DomainResult<Option<Alert>> {
        let mut alerts = self.alerts.write();
        let monitor_alerts = alerts.entry(alert.monitor_id).or_default();
        if let Some(open) = monitor_alerts
            .iter()
            .find(|a| a.is_open() && a.alert_type == alert.alert_type)
        {
            return Ok(Some(open.clone()));
        }
        monitor_alerts.push(alert.clone());
        Ok(None)
    }

    async fn find(&self, monitor_id: &MonitorId, alert_id: &AlertId) -> DomainResult<Option<Alert>> {
        Ok(self
            .alerts
            .read()
            .get(monitor_id)
            .and_then(|alerts| alerts.iter().find(|a| a.alert_id == *alert_id))
            .cloned())
    }

    async fn find_by_monitor(&self, monitor_id: &MonitorId) -> DomainResult<Vec<Alert>> {
        Ok(self
            .alerts
            .read()
            .get(monitor_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_all(&self) -> DomainResult<Vec<Alert>> {
        Ok(self.alerts.read().values().flatten().cloned().collect())
    }

    async fn update_if_revision(&self, alert: &Alert) -> DomainResult<Alert> {
        let mut alerts = self.alerts.write();
        let stored = alerts
            .get_mut(&alert.monitor_id)
            .and_then(|alerts| alerts.iter_mut().find(|a| a.alert_id == alert.alert_id))
            .ok_or_else(|| PersistenceError::not_found("Alert", alert.alert_id))?;
        check_revision("Alert", alert.alert_id, alert.revision, stored.revision)?;

        let mut next = alert.clone();
        next.revision += 1;
        *stored = next.clone();
        Ok(next)
    }
}
