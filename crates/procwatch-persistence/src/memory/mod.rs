//! In-Memory Repository Implementations
//!
//! Thread-safe in-memory implementations of domain repository interfaces.
//! Each map sits behind a `parking_lot::RwLock`; compare-and-swap updates
//! check the revision and write under the same write guard.

mod alert_repository;
mod execution_repository;
mod monitor_repository;
mod performance_repository;
mod process_repository;

pub use alert_repository::InMemoryAlertRepository;
pub use execution_repository::InMemoryExecutionRepository;
pub use monitor_repository::InMemoryMonitorRepository;
pub use performance_repository::InMemoryPerformanceRepository;
pub use process_repository::InMemoryProcessRepository;

use crate::error::PersistenceError;

/// Fail unless the stored revision is the one the writer read
pub(crate) fn check_revision(
    entity_type: &'static str,
    id: impl ToString,
    expected: u64,
    actual: u64,
) -> Result<(), PersistenceError> {
    if expected != actual {
        tracing::debug!(entity_type, expected, actual, "Rejected stale write");
        return Err(PersistenceError::stale(entity_type, id, expected, actual));
    }
    Ok(())
}
