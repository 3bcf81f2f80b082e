//! API request and response models

use procwatch_domain::{
    AlertType, HealthStatus, MetricsSample, ProcessId, ProcessStatus, Severity,
};
use procwatch_execution::ProcessFilter;
use procwatch_monitoring::{AlertHistoryFilter, MonitorFilter};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Success envelope
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Uptime in seconds
    pub uptime: u64,
    /// Executions waiting for completion
    pub in_flight_executions: usize,
}

/// Query parameters for process listing
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListProcessesQuery {
    /// Active, Inactive or Archived
    #[param(value_type = Option<String>)]
    pub status: Option<ProcessStatus>,
    pub category: Option<String>,
    /// Include soft-deleted processes
    pub include_inactive: Option<bool>,
}

impl From<ListProcessesQuery> for ProcessFilter {
    fn from(query: ListProcessesQuery) -> Self {
        ProcessFilter {
            status: query.status,
            category: query.category,
            include_inactive: query.include_inactive.unwrap_or(false),
        }
    }
}

/// Query parameters for history listings
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitQuery {
    /// Maximum number of entries, newest first
    pub limit: Option<usize>,
}

/// Query parameters for monitor listing
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListMonitorsQuery {
    /// Healthy, Warning, Critical or Down
    #[param(value_type = Option<String>)]
    pub status: Option<HealthStatus>,
    #[param(value_type = Option<String>)]
    pub process_id: Option<ProcessId>,
    pub include_inactive: Option<bool>,
}

impl From<ListMonitorsQuery> for MonitorFilter {
    fn from(query: ListMonitorsQuery) -> Self {
        MonitorFilter {
            status: query.status,
            process_id: query.process_id,
            include_inactive: query.include_inactive.unwrap_or(false),
        }
    }
}

/// Query parameters for alert history
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AlertHistoryQuery {
    #[param(value_type = Option<String>)]
    pub severity: Option<Severity>,
    /// e.g. Execution_Timeout, CPU_Threshold, Manual
    #[param(value_type = Option<String>)]
    pub alert_type: Option<AlertType>,
    /// Only resolved (true) or only open (false) alerts
    pub resolved: Option<bool>,
    pub limit: Option<usize>,
}

impl From<AlertHistoryQuery> for AlertHistoryFilter {
    fn from(query: AlertHistoryQuery) -> Self {
        AlertHistoryFilter {
            severity: query.severity,
            alert_type: query.alert_type,
            resolved: query.resolved,
            limit: query.limit,
        }
    }
}

/// Query parameters for the dashboard
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    /// 1h, 24h, 7d or 30d (default 24h)
    pub timeframe: Option<String>,
}

/// Performance sample posted for a monitor
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceDataRequest {
    #[serde(flatten)]
    pub metrics: MetricsSample,
    /// Explicit health status; derived from the health score when absent
    pub status: Option<HealthStatus>,
}
