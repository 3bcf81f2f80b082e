//! procwatch execution
//!
//! The process catalog and the simulated execution engine. Executions are
//! tokio tasks that can be cancelled and awaited; their terminal write is
//! guarded by the record revision.

pub mod catalog;
pub mod simulator;

pub use catalog::{ProcessCatalog, ProcessFilter};
pub use simulator::{ExecutionObserver, ExecutionOptions, ExecutionSimulator};
