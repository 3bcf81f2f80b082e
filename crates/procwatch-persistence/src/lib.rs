//! procwatch Persistence Layer
//!
//! Infrastructure layer providing repository implementations for the
//! interfaces defined in `procwatch-domain`.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Infrastructure Layer                     │
//! │  InMemoryProcessRepository     InMemoryMonitorRepository  │
//! │  InMemoryExecutionRepository   InMemoryAlertRepository    │
//! │  InMemoryPerformanceRepository                            │
//! └──────────────────────────────────────────────────────────┘
//!                           ▲ implements
//! ┌──────────────────────────────────────────────────────────┐
//! │                      Domain Layer                         │
//! │  ProcessRepository, ExecutionRepository, MonitorRepository│
//! │  AlertRepository, PerformanceRepository                   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ```ignore
//! use procwatch_persistence::InMemoryProcessRepository;
//! use procwatch_domain::ProcessRepository;
//! use std::sync::Arc;
//!
//! let repo: Arc<dyn ProcessRepository> = Arc::new(InMemoryProcessRepository::new());
//! ```

pub mod error;
pub mod memory;

pub use error::PersistenceError;

pub use memory::{
    InMemoryAlertRepository, InMemoryExecutionRepository, InMemoryMonitorRepository,
    InMemoryPerformanceRepository, InMemoryProcessRepository,
};
