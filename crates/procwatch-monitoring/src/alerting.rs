//! Threshold evaluation
//!
//! Pure functions from a metrics sample and a monitor's thresholds to the
//! alerts that sample should raise. Persisting the result is the caller's job.

use procwatch_domain::{AlertType, MetricsSample, Severity, Thresholds};
use serde::Serialize;
use serde_json::json;

/// An alert that should be raised, before it is stored
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertIntent {
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    pub metadata: serde_json::Value,
}

/// Alert rule engine
pub struct AlertEvaluator;

impl AlertEvaluator {
    /// Evaluate a sample against the thresholds
    ///
    /// Raises one intent per independently breached threshold. Fields missing
    /// from the sample never raise anything.
    pub fn evaluate(sample: &MetricsSample, thresholds: &Thresholds) -> Vec<AlertIntent> {
        Self::evaluate_with_failures(sample, thresholds, 0)
    }

    /// Like [`AlertEvaluator::evaluate`], also checking a running count of
    /// consecutive failed runs against `max_consecutive_failures`
    pub fn evaluate_with_failures(
        sample: &MetricsSample,
        thresholds: &Thresholds,
        consecutive_failures: u32,
    ) -> Vec<AlertIntent> {
        let mut intents = Vec::new();

        if let Some(execution_time) = sample.execution_time {
            if execution_time > thresholds.max_execution_time {
                intents.push(AlertIntent {
                    alert_type: AlertType::ExecutionTimeout,
                    severity: Severity::High,
                    message: format!(
                        "Execution time {}ms exceeded threshold of {}ms",
                        execution_time, thresholds.max_execution_time
                    ),
                    metadata: json!({
                        "executionTime": execution_time,
                        "threshold": thresholds.max_execution_time,
                    }),
                });
            }
        }

        if let Some(memory_usage) = sample.memory_usage {
            if memory_usage > thresholds.max_memory_usage {
                intents.push(AlertIntent {
                    alert_type: AlertType::MemoryThreshold,
                    severity: Severity::Medium,
                    message: format!(
                        "Memory usage {}MB exceeded threshold of {}MB",
                        memory_usage, thresholds.max_memory_usage
                    ),
                    metadata: json!({
                        "memoryUsage": memory_usage,
                        "threshold": thresholds.max_memory_usage,
                    }),
                });
            }
        }

        if let Some(cpu_usage) = sample.cpu_usage {
            if cpu_usage > thresholds.max_cpu_usage {
                intents.push(AlertIntent {
                    alert_type: AlertType::CpuThreshold,
                    severity: Severity::Medium,
                    message: format!(
                        "CPU usage {}% exceeded threshold of {}%",
                        cpu_usage, thresholds.max_cpu_usage
                    ),
                    metadata: json!({
                        "cpuUsage": cpu_usage,
                        "threshold": thresholds.max_cpu_usage,
                    }),
                });
            }
        }

        if let Some(success_rate) = sample.success_rate() {
            if success_rate < thresholds.min_success_rate {
                let rounded = round2(success_rate);
                intents.push(AlertIntent {
                    alert_type: AlertType::HighErrorRate,
                    severity: Severity::High,
                    message: format!(
                        "Success rate {:.2}% below threshold of {}%",
                        success_rate, thresholds.min_success_rate
                    ),
                    metadata: json!({
                        "successRate": rounded,
                        "threshold": thresholds.min_success_rate,
                        "successCount": sample.success_count,
                        "errorCount": sample.error_count,
                    }),
                });
            }
        }

        if consecutive_failures > 0 && consecutive_failures >= thresholds.max_consecutive_failures {
            intents.push(AlertIntent {
                alert_type: AlertType::ConsecutiveFailures,
                severity: Severity::Critical,
                message: format!(
                    "{} consecutive failed runs (limit {})",
                    consecutive_failures, thresholds.max_consecutive_failures
                ),
                metadata: json!({
                    "consecutiveFailures": consecutive_failures,
                    "threshold": thresholds.max_consecutive_failures,
                }),
            });
        }

        intents
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_timeout_just_over_threshold() {
        let sample = MetricsSample {
            execution_time: Some(301_000),
            ..Default::default()
        };
        let intents = AlertEvaluator::evaluate(&sample, &Thresholds::default());

        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].alert_type, AlertType::ExecutionTimeout);
        assert_eq!(intents[0].severity, Severity::High);
    }

    #[test]
    fn test_within_bounds_raises_nothing() {
        let sample = MetricsSample {
            execution_time: Some(100_000),
            memory_usage: Some(256.0),
            cpu_usage: Some(40.0),
            success_count: Some(99),
            error_count: Some(1),
        };
        assert!(AlertEvaluator::evaluate(&sample, &Thresholds::default()).is_empty());
    }

    #[test]
    fn test_threshold_value_itself_is_not_a_breach() {
        let sample = MetricsSample {
            execution_time: Some(300_000),
            cpu_usage: Some(80.0),
            ..Default::default()
        };
        assert!(AlertEvaluator::evaluate(&sample, &Thresholds::default()).is_empty());
    }

    #[test]
    fn test_low_success_rate() {
        let sample = MetricsSample {
            success_count: Some(18),
            error_count: Some(2),
            ..Default::default()
        };
        let intents = AlertEvaluator::evaluate(&sample, &Thresholds::default());

        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].alert_type, AlertType::HighErrorRate);
        assert_eq!(intents[0].severity, Severity::High);
        let rate = intents[0].metadata["successRate"].as_f64().unwrap();
        assert!((rate - 90.0).abs() < 0.001);
    }

    #[test]
    fn test_each_breach_raises_its_own_alert() {
        let sample = MetricsSample {
            execution_time: Some(400_000),
            memory_usage: Some(1024.0),
            cpu_usage: Some(99.0),
            success_count: Some(1),
            error_count: Some(9),
        };
        let types: Vec<_> = AlertEvaluator::evaluate(&sample, &Thresholds::default())
            .into_iter()
            .map(|i| i.alert_type)
            .collect();

        assert_eq!(
            types,
            vec![
                AlertType::ExecutionTimeout,
                AlertType::MemoryThreshold,
                AlertType::CpuThreshold,
                AlertType::HighErrorRate,
            ]
        );
    }

    #[test]
    fn test_consecutive_failures_at_limit() {
        let sample = MetricsSample::default();
        let thresholds = Thresholds::default();

        assert!(AlertEvaluator::evaluate_with_failures(&sample, &thresholds, 2).is_empty());
        let intents = AlertEvaluator::evaluate_with_failures(&sample, &thresholds, 3);
        assert_eq!(intents[0].alert_type, AlertType::ConsecutiveFailures);
        assert_eq!(intents[0].severity, Severity::Critical);
    }

    #[test]
    fn test_empty_sample_raises_nothing() {
        assert!(AlertEvaluator::evaluate(&MetricsSample::default(), &Thresholds::default()).is_empty());
    }
}
