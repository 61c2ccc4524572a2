//! Error types with actionable diagnostics.
//!
//! All fatal conditions in the lifecycle engine are configuration errors and
//! are detected eagerly at the lifecycle callback that receives the bad
//! configuration, never deferred into the calibration loop.

use thiserror::Error;

use crate::modifier::ModifierKind;

/// Result type alias for comprimir operations.
pub type Result<T> = std::result::Result<T, CompressionError>;

/// Errors that can occur in the compression lifecycle engine.
#[derive(Error, Debug)]
pub enum CompressionError {
    /// A bounded duration window was requested for a modifier kind that must
    /// run for the remainder of the process or exactly once.
    #[error("end epoch is disabled for {kind} and can only be set to -1 or left unset, got {end}\n  → Remove `end` from the modifier or set it to -1")]
    BoundedDuration { kind: ModifierKind, end: f64 },

    /// Calibration steps were requested but no data source was supplied.
    #[error("num_calibration_steps is {steps} but no calibration data was set\n  → Pass calibration data through ModifierState before initializing")]
    MissingCalibrationData { steps: usize },

    /// A target or ignore pattern could not be compiled.
    #[error("invalid target pattern '{pattern}': {reason}\n  → Use an exact module name, a class tag, or an `re:`-prefixed regular expression")]
    InvalidTargetPattern { pattern: String, reason: String },
}

impl CompressionError {
    /// Check whether this error is a configuration error.
    ///
    /// Every current variant is; the predicate keeps call sites stable if a
    /// runtime fault category is ever added.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::BoundedDuration { .. }
                | Self::MissingCalibrationData { .. }
                | Self::InvalidTargetPattern { .. }
        )
    }
}
