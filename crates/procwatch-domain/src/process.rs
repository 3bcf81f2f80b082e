//! Automated process aggregate
//!
//! A process is a named, ordered list of steps owned by a data steward.
//! Steps keep a dense `order` sequence; every update bumps `version` and
//! appends a change-log entry.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::execution::{ExecutionRecord, ExecutionStatus};
use crate::value_objects::{Actor, ProcessId};

const MAX_NAME_LEN: usize = 200;

/// Process lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessStatus {
    Active,
    Inactive,
    Archived,
}

impl Default for ProcessStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// A single step of a process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStep {
    pub step_id: String,
    pub order: u32,
    pub name: String,
    #[serde(default)]
    pub step_type: Option<String>,
    #[serde(default)]
    pub config: serde_json::Value,
}

/// Step as supplied by a caller, `order` may be absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepInput {
    pub step_id: String,
    #[serde(default)]
    pub order: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub step_type: Option<String>,
    #[serde(default)]
    pub config: serde_json::Value,
}

impl StepInput {
    pub fn new(step_id: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            ..Default::default()
        }
    }
}

/// Schedule descriptor; evaluation of the cron expression is left to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub cron_expression: Option<String>,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub next_run: Option<DateTime<Utc>>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            enabled: false,
            cron_expression: None,
            timezone: default_timezone(),
            next_run: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub executors: Vec<String>,
    #[serde(default)]
    pub viewers: Vec<String>,
}

/// Aggregate execution counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMetrics {
    pub total_executions: u64,
    pub successful_executions: u64,
    pub failed_executions: u64,
    pub cancelled_executions: u64,
    /// Running mean over completed and failed runs, in milliseconds
    pub average_execution_time: f64,
    pub last_execution_time: Option<DateTime<Utc>>,
}

impl ProcessMetrics {
    /// Fold a finished execution into the counters
    pub fn record(&mut self, execution: &ExecutionRecord) {
        self.total_executions += 1;
        self.last_execution_time = execution.end_time.or(Some(execution.start_time));

        match execution.status {
            ExecutionStatus::Completed => self.successful_executions += 1,
            ExecutionStatus::Failed => self.failed_executions += 1,
            ExecutionStatus::Cancelled => {
                self.cancelled_executions += 1;
                return;
            }
            ExecutionStatus::Running => return,
        }

        let timed = self.successful_executions + self.failed_executions;
        let duration = execution.duration.unwrap_or(0) as f64;
        self.average_execution_time += (duration - self.average_execution_time) / timed as f64;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogEntry {
    pub version: u32,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
    pub summary: String,
}

/// Automated process aggregate root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomatedProcess {
    pub id: ProcessId,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub status: ProcessStatus,
    pub steps: Vec<ProcessStep>,
    pub schedule: Schedule,
    pub dependencies: Vec<ProcessId>,
    pub permissions: Permissions,
    pub metrics: ProcessMetrics,
    pub version: u32,
    pub change_log: Vec<ChangeLogEntry>,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Storage revision used for optimistic concurrency
    pub revision: u64,
}

/// Input for creating a process
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProcess {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    #[serde(default)]
    pub status: Option<ProcessStatus>,
    #[serde(default)]
    pub steps: Vec<StepInput>,
    #[serde(default)]
    pub schedule: Option<Schedule>,
    #[serde(default)]
    pub dependencies: Vec<ProcessId>,
    #[serde(default)]
    pub permissions: Option<Permissions>,
}

/// Partial update of a process; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub status: Option<ProcessStatus>,
    pub steps: Option<Vec<StepInput>>,
    pub schedule: Option<Schedule>,
    pub dependencies: Option<Vec<ProcessId>>,
    pub permissions: Option<Permissions>,
}

impl AutomatedProcess {
    /// Create a new process with invariant validation
    ///
    /// # Errors
    /// Returns `ValidationError` for an empty name or category, or duplicate step ids
    pub fn create(input: NewProcess, actor: &Actor) -> DomainResult<Self> {
        let name = validate_name(&input.name)?;
        let category = validate_category(&input.category)?;
        let steps = normalize_steps(input.steps)?;
        let id = ProcessId::new();
        validate_dependencies(&id, &input.dependencies)?;

        let now = Utc::now();
        Ok(Self {
            id,
            name,
            description: input.description,
            category,
            status: input.status.unwrap_or_default(),
            steps,
            schedule: input.schedule.unwrap_or_default(),
            dependencies: input.dependencies,
            permissions: input.permissions.unwrap_or_default(),
            metrics: ProcessMetrics::default(),
            version: 1,
            change_log: vec![ChangeLogEntry {
                version: 1,
                changed_by: actor.id.clone(),
                changed_at: now,
                summary: "Process created".to_string(),
            }],
            is_active: true,
            created_by: actor.id.clone(),
            created_at: now,
            updated_at: now,
            revision: 0,
        })
    }

    /// Apply a partial update, bumping the version and recording the change
    ///
    /// Returns the status the process had before the update.
    pub fn apply(&mut self, patch: ProcessPatch, actor: &Actor) -> DomainResult<ProcessStatus> {
        let previous_status = self.status;
        let mut changed = Vec::new();

        if let Some(name) = patch.name {
            self.name = validate_name(&name)?;
            changed.push("name");
        }
        if let Some(category) = patch.category {
            self.category = validate_category(&category)?;
            changed.push("category");
        }
        if let Some(steps) = patch.steps {
            self.steps = normalize_steps(steps)?;
            changed.push("steps");
        }
        if let Some(dependencies) = patch.dependencies {
            validate_dependencies(&self.id, &dependencies)?;
            self.dependencies = dependencies;
            changed.push("dependencies");
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
            changed.push("description");
        }
        if let Some(status) = patch.status {
            self.status = status;
            changed.push("status");
        }
        if let Some(schedule) = patch.schedule {
            self.schedule = schedule;
            changed.push("schedule");
        }
        if let Some(permissions) = patch.permissions {
            self.permissions = permissions;
            changed.push("permissions");
        }

        let now = Utc::now();
        self.version += 1;
        self.updated_at = now;
        let summary = if changed.is_empty() {
            "No fields changed".to_string()
        } else {
            format!("Updated {}", changed.join(", "))
        };
        self.change_log.push(ChangeLogEntry {
            version: self.version,
            changed_by: actor.id.clone(),
            changed_at: now,
            summary,
        });

        Ok(previous_status)
    }

    /// Soft delete; the record is kept for audit queries
    pub fn deactivate(&mut self, actor: &Actor) {
        let now = Utc::now();
        self.is_active = false;
        self.version += 1;
        self.updated_at = now;
        self.change_log.push(ChangeLogEntry {
            version: self.version,
            changed_by: actor.id.clone(),
            changed_at: now,
            summary: "Process deleted".to_string(),
        });
    }

    /// Whether new executions may be started
    pub fn is_runnable(&self) -> bool {
        self.is_active && self.status == ProcessStatus::Active
    }
}

fn validate_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name", "Process name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::validation(
            "name",
            format!("Process name too long (max {} characters)", MAX_NAME_LEN),
        ));
    }
    Ok(name.to_string())
}

fn validate_category(category: &str) -> DomainResult<String> {
    let category = category.trim();
    if category.is_empty() {
        return Err(DomainError::validation("category", "Category is required"));
    }
    Ok(category.to_string())
}

fn validate_dependencies(id: &ProcessId, dependencies: &[ProcessId]) -> DomainResult<()> {
    if dependencies.contains(id) {
        return Err(DomainError::validation(
            "dependencies",
            "A process cannot depend on itself",
        ));
    }
    Ok(())
}

/// Validate step ids and assign a dense `1..=n` order
///
/// Steps without an explicit order take their list position. Steps are then
/// sorted by order (stable, so ties keep list order) and renumbered.
pub fn normalize_steps(inputs: Vec<StepInput>) -> DomainResult<Vec<ProcessStep>> {
    let mut seen = HashSet::new();
    for step in &inputs {
        let step_id = step.step_id.trim();
        if step_id.is_empty() {
            return Err(DomainError::validation("steps", "Every step needs a stepId"));
        }
        if !seen.insert(step_id.to_string()) {
            return Err(DomainError::validation(
                "steps",
                format!("Duplicate stepId: {}", step_id),
            ));
        }
    }

    let mut ranked: Vec<(u32, StepInput)> = inputs
        .into_iter()
        .enumerate()
        .map(|(index, step)| (step.order.unwrap_or(index as u32 + 1), step))
        .collect();
    ranked.sort_by_key(|(order, _)| *order);

    Ok(ranked
        .into_iter()
        .enumerate()
        .map(|(index, (_, step))| {
            let step_id = step.step_id.trim().to_string();
            ProcessStep {
                name: step.name.unwrap_or_else(|| step_id.clone()),
                step_id,
                order: index as u32 + 1,
                step_type: step.step_type,
                config: step.config,
            }
        })
        .collect())
}
