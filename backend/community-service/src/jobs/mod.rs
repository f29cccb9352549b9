//! Background jobs
//!
//! - `sweeper`: promotes due scheduled posts on a fixed interval

pub mod sweeper;

pub use sweeper::{run_sweep_cycle, start_sweeper, SweepReport, SWEEP_JOB_NAME};
