//! Pipeline entry points.
//!
//! - `Pipeline::run_cycle`: one fetch → extract → publish → diff → notify pass
//! - `run_scheduler`: drive cycles on a fixed interval

pub mod cycle;
pub mod diff;
pub mod scheduler;

pub use cycle::{CycleReport, Pipeline};
pub use diff::{DiffResult, detect_changes};
pub use scheduler::run_scheduler;
