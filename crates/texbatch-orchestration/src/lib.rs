//! # texbatch-orchestration
//!
//! Two-level worker pools, per-project and global scheduling, and run reports.

pub mod interfaces;
pub mod pool;
pub mod report;
pub mod runner;
pub mod scheduler;

pub use interfaces::{BuildEvent, BuildObserver, NullObserver, ProjectOutcome};
pub use pool::{PoolError, TaskFault, WorkerPool};
pub use report::{ReportAggregator, RunReport};
pub use runner::ProjectRunner;
pub use scheduler::ProjectScheduler;
