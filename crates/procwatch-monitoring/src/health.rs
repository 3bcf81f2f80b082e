//! Health score and SLA status calculations

use chrono::{DateTime, Utc};
use procwatch_domain::{
    HealthStatus, MetricsSample, PerformanceSample, SlaStatus, SlaTargets, Thresholds,
};

use crate::alerting::round2;

const BREACH_PENALTY: f64 = 10.0;
const FAILURE_PENALTY: f64 = 15.0;

/// Score a sample from 0 to 100
///
/// Starts at the success rate (100 when unknown), loses 10 points for each
/// execution-time, memory and CPU breach and 15 per consecutive failure.
pub fn health_score(sample: &MetricsSample, thresholds: &Thresholds, consecutive_failures: u32) -> f64 {
    let mut score = sample.success_rate().unwrap_or(100.0);

    let breaches = [
        sample
            .execution_time
            .map_or(false, |t| t > thresholds.max_execution_time),
        sample
            .memory_usage
            .map_or(false, |m| m > thresholds.max_memory_usage),
        sample.cpu_usage.map_or(false, |c| c > thresholds.max_cpu_usage),
    ];
    score -= BREACH_PENALTY * breaches.iter().filter(|b| **b).count() as f64;
    score -= FAILURE_PENALTY * consecutive_failures as f64;

    (score.clamp(0.0, 100.0) * 10.0).round() / 10.0
}

pub fn status_for_score(score: f64) -> HealthStatus {
    if score >= 80.0 {
        HealthStatus::Healthy
    } else if score >= 50.0 {
        HealthStatus::Warning
    } else if score > 0.0 {
        HealthStatus::Critical
    } else {
        HealthStatus::Down
    }
}

/// Recompute SLA figures over the retained performance history
///
/// Only targets whose observed figure is defined take part in the
/// compliance percentage.
pub fn compute_sla_status(
    samples: &[PerformanceSample],
    targets: &SlaTargets,
    now: DateTime<Utc>,
) -> SlaStatus {
    if samples.is_empty() {
        return SlaStatus::default();
    }

    let up = samples
        .iter()
        .filter(|s| s.status != HealthStatus::Down)
        .count();
    let availability = up as f64 / samples.len() as f64 * 100.0;

    let times: Vec<f64> = samples
        .iter()
        .filter_map(|s| s.metrics.execution_time)
        .map(|t| t as f64)
        .collect();
    let response_time = mean(&times);

    let successes = samples
        .iter()
        .filter_map(|s| s.metrics.success_count)
        .fold(0u64, u64::saturating_add);
    let errors = samples
        .iter()
        .filter_map(|s| s.metrics.error_count)
        .fold(0u64, u64::saturating_add);
    let reported_counts = samples
        .iter()
        .any(|s| s.metrics.success_count.is_some() || s.metrics.error_count.is_some());

    let throughput = reported_counts.then(|| {
        let first = samples.first().map(|s| s.timestamp).unwrap_or(now);
        let last = samples.last().map(|s| s.timestamp).unwrap_or(now);
        let hours = ((last - first).num_seconds() as f64 / 3600.0).max(1.0);
        successes as f64 / hours
    });
    let counted = successes as f64 + errors as f64;
    let error_rate = (counted > 0.0).then(|| errors as f64 / counted * 100.0);

    let checks = [
        Some(availability >= targets.availability),
        response_time.map(|r| r <= targets.response_time),
        throughput.map(|t| t >= targets.throughput),
        error_rate.map(|e| e <= targets.error_rate),
    ];
    let evaluated = checks.iter().flatten().count();
    let met = checks.iter().flatten().filter(|ok| **ok).count();
    let compliance = met as f64 / evaluated as f64 * 100.0;

    SlaStatus {
        current_availability: Some(round2(availability)),
        current_response_time: response_time.map(round2),
        current_throughput: throughput.map(round2),
        current_error_rate: error_rate.map(round2),
        compliance_percentage: round2(compliance),
        is_compliant: met == evaluated,
        last_calculated: Some(now),
    }
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn sample(at: DateTime<Utc>, metrics: MetricsSample, status: HealthStatus) -> PerformanceSample {
        PerformanceSample {
            timestamp: at,
            metrics,
            status,
        }
    }

    #[test]
    fn test_clean_sample_scores_full() {
        let score = health_score(&MetricsSample::default(), &Thresholds::default(), 0);
        assert_eq!(score, 100.0);
        assert_eq!(status_for_score(score), HealthStatus::Healthy);
    }

    #[test]
    fn test_breaches_and_failures_lower_score() {
        let metrics = MetricsSample {
            cpu_usage: Some(95.0),
            success_count: Some(18),
            error_count: Some(2),
            ..Default::default()
        };
        // 90 - 10 (cpu) - 15 (one failure)
        assert_eq!(health_score(&metrics, &Thresholds::default(), 1), 65.0);
        assert_eq!(status_for_score(65.0), HealthStatus::Warning);
    }

    #[test]
    fn test_score_floor_is_down() {
        let metrics = MetricsSample {
            success_count: Some(0),
            error_count: Some(4),
            ..Default::default()
        };
        let score = health_score(&metrics, &Thresholds::default(), 4);
        assert_eq!(score, 0.0);
        assert_eq!(status_for_score(score), HealthStatus::Down);
    }

    #[test]
    fn test_sla_compliance() {
        let now = Utc::now();
        let samples = vec![
            sample(
                now - TimeDelta::hours(2),
                MetricsSample {
                    execution_time: Some(1_000),
                    success_count: Some(20),
                    error_count: Some(0),
                    ..Default::default()
                },
                HealthStatus::Healthy,
            ),
            sample(
                now,
                MetricsSample {
                    execution_time: Some(3_000),
                    success_count: Some(20),
                    error_count: Some(0),
                    ..Default::default()
                },
                HealthStatus::Healthy,
            ),
        ];

        let status = compute_sla_status(&samples, &SlaTargets::default(), now);
        assert_eq!(status.current_availability, Some(100.0));
        assert_eq!(status.current_response_time, Some(2_000.0));
        assert_eq!(status.current_throughput, Some(20.0));
        assert_eq!(status.current_error_rate, Some(0.0));
        assert_eq!(status.compliance_percentage, 100.0);
        assert!(status.is_compliant);
    }

    #[test]
    fn test_sla_breach_lowers_compliance() {
        let now = Utc::now();
        let samples = vec![
            sample(now, MetricsSample::default(), HealthStatus::Down),
            sample(now, MetricsSample::default(), HealthStatus::Healthy),
        ];

        let status = compute_sla_status(&samples, &SlaTargets::default(), now);
        assert_eq!(status.current_availability, Some(50.0));
        assert_eq!(status.compliance_percentage, 0.0);
        assert!(!status.is_compliant);
    }

    #[test]
    fn test_huge_counts_saturate() {
        let now = Utc::now();
        let heavy = MetricsSample {
            success_count: Some(u64::MAX),
            error_count: Some(1),
            ..Default::default()
        };
        let samples = vec![
            sample(now, heavy.clone(), HealthStatus::Healthy),
            sample(now, heavy, HealthStatus::Healthy),
        ];

        let status = compute_sla_status(&samples, &SlaTargets::default(), now);
        assert_eq!(status.current_error_rate, Some(0.0));
        assert!(status.current_throughput.unwrap() > 0.0);
    }

    #[test]
    fn test_compliance_counts_only_reported_figures() {
        let now = Utc::now();
        let samples = vec![sample(
            now,
            MetricsSample {
                execution_time: Some(8_000),
                ..Default::default()
            },
            HealthStatus::Healthy,
        )];

        // availability met, response time missed, no counts reported
        let status = compute_sla_status(&samples, &SlaTargets::default(), now);
        assert_eq!(status.current_throughput, None);
        assert_eq!(status.current_error_rate, None);
        assert_eq!(status.compliance_percentage, 50.0);
        assert!(!status.is_compliant);
    }

    #[test]
    fn test_no_samples_leaves_status_uncalculated() {
        let status = compute_sla_status(&[], &SlaTargets::default(), Utc::now());
        assert!(status.last_calculated.is_none());
    }
}
