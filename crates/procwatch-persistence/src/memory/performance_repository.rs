//! In-Memory Performance History Implementation

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};

use procwatch_domain::{DomainResult, MonitorId, PerformanceRepository, PerformanceSample};

#[derive(Debug, Default)]
pub struct InMemoryPerformanceRepository {
    samples: RwLock<HashMap<MonitorId, VecDeque<PerformanceSample>>>,
}

impl InMemoryPerformanceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PerformanceRepository for InMemoryPerformanceRepository {
    async fn append(
        &self,
        monitor_id: &MonitorId,
        sample: PerformanceSample,
        retain: usize,
    ) -> DomainResult<()> {
        let mut samples = self.samples.write();
        let series = samples.entry(*monitor_id).or_default();
        series.push_back(sample);
        while series.len() > retain.max(1) {
            series.pop_front();
        }
        Ok(())
    }

    async fn find_by_monitor(&self, monitor_id: &MonitorId) -> DomainResult<Vec<PerformanceSample>> {
        Ok(self
            .samples
            .read()
            .get(monitor_id)
            .map(|series| series.iter().cloned().collect())
            .unwrap_or_default())
    }
}
