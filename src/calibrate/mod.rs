//! Calibration: bounded or unbounded forward passes that populate observer
//! statistics.
//!
//! The runner owns none of the data pipeline: batches arrive as any iterator,
//! finite or not, and faults inside a forward function propagate unmodified.
//! The only guarantee layered on top is train/eval mode restoration.

mod data;
mod runner;

#[cfg(test)]
mod tests;

pub use data::{Batch, BatchSource, SyntheticBatches};
pub use runner::{run_calibration_forward, CalibrationForward, EvalModeGuard};
