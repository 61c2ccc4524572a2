//! Explicit cross-call state for lifecycle modifiers.

use std::fmt;

use crate::calibrate::{Batch, BatchSource};

/// Scheduling window and calibration resources for one run.
///
/// Configured once before the run and passed by reference through every
/// lifecycle call; the engine only consumes the calibration data, it never
/// rewrites the schedule. `start`, `end`, and `disable_observer_epoch` keep
/// the conventional sentinel: `-1.0` (or unset) means one-shot / run-once /
/// never.
pub struct ModifierState {
    /// Index at which the modifier becomes active; `-1` or unset = one-shot
    pub start: Option<f64>,
    /// Index at which the modifier would deactivate; quantization modifiers
    /// only accept `-1` or unset
    pub end: Option<f64>,
    /// Calibration batch source; length may be unknown
    pub calibration_data: Option<BatchSource>,
    /// Bound on calibration batches; unset = exhaust the source
    pub calibration_steps: Option<usize>,
    /// Index at which observers freeze for the rest of the run
    pub disable_observer_epoch: Option<f64>,
}

impl ModifierState {
    /// Create an empty state: one-shot schedule, no calibration resources.
    pub fn new() -> Self {
        Self {
            start: None,
            end: None,
            calibration_data: None,
            calibration_steps: None,
            disable_observer_epoch: None,
        }
    }

    /// Set the start index.
    pub fn with_start(mut self, start: f64) -> Self {
        self.start = Some(start);
        self
    }

    /// Set the end index.
    pub fn with_end(mut self, end: f64) -> Self {
        self.end = Some(end);
        self
    }

    /// Supply calibration data.
    pub fn with_calibration_data<I>(mut self, batches: I) -> Self
    where
        I: IntoIterator<Item = Batch> + 'static,
        I::IntoIter: 'static,
    {
        self.calibration_data = Some(Box::new(batches.into_iter()));
        self
    }

    /// Bound the number of calibration batches.
    pub fn with_calibration_steps(mut self, steps: usize) -> Self {
        self.calibration_steps = Some(steps);
        self
    }

    /// Set the observer-disable index.
    pub fn with_disable_observer_epoch(mut self, epoch: f64) -> Self {
        self.disable_observer_epoch = Some(epoch);
        self
    }

    /// Check whether calibration data is present.
    pub fn has_calibration_data(&self) -> bool {
        self.calibration_data.is_some()
    }

    /// Take the calibration data, leaving the state without it.
    pub fn take_calibration_data(&mut self) -> Option<BatchSource> {
        self.calibration_data.take()
    }
}

impl Default for ModifierState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ModifierState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModifierState")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("calibration_data", &self.calibration_data.as_ref().map(|_| "<batches>"))
            .field("calibration_steps", &self.calibration_steps)
            .field("disable_observer_epoch", &self.disable_observer_epoch)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_one_shot() {
        let state = ModifierState::new();
        assert_eq!(state.start, None);
        assert_eq!(state.end, None);
        assert!(!state.has_calibration_data());
    }

    #[test]
    fn test_take_calibration_data_consumes() {
        let mut state =
            ModifierState::new().with_calibration_data(vec![Batch::new(vec![1.0])]);
        assert!(state.has_calibration_data());

        let data = state.take_calibration_data().expect("data present");
        assert_eq!(data.count(), 1);
        assert!(!state.has_calibration_data());
    }

    #[test]
    fn test_debug_does_not_require_iterating() {
        let state = ModifierState::new()
            .with_calibration_data(vec![Batch::new(vec![1.0])])
            .with_disable_observer_epoch(2.0);
        let debug = format!("{state:?}");
        assert!(debug.contains("<batches>"));
        assert!(debug.contains("2.0"));
    }
}
