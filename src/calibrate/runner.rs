//! Calibration forward-pass runner.

use crate::error::Result;
use crate::model::Model;

use super::data::Batch;

/// Forward function invoked per calibration batch.
///
/// Defaults to plain `Model::forward` when not supplied. Errors propagate to
/// the caller unmodified; the engine does not own the data pipeline's error
/// semantics.
pub type CalibrationForward<'a> = &'a mut dyn FnMut(&mut Model, &Batch) -> Result<()>;

/// Holds a model in evaluation mode, restoring the prior mode on drop.
///
/// Restoration happens whether the calibration loop completes or unwinds
/// through `?`.
pub struct EvalModeGuard<'m> {
    model: &'m mut Model,
    was_training: bool,
}

impl<'m> EvalModeGuard<'m> {
    /// Switch the model to evaluation mode, remembering the prior flag.
    pub fn new(model: &'m mut Model) -> Self {
        let was_training = model.is_training();
        model.eval();
        Self { model, was_training }
    }

    /// The guarded model.
    pub fn model(&mut self) -> &mut Model {
        self.model
    }
}

impl Drop for EvalModeGuard<'_> {
    fn drop(&mut self) {
        self.model.set_training(self.was_training);
    }
}

/// Drive calibration forward passes over a batch source.
///
/// The model runs in evaluation mode for the duration of the loop and its
/// prior mode is restored afterward regardless of outcome. Consumes at most
/// `max_steps` batches when given, otherwise exhausts the source (which may
/// have unknown length). There is no gradient tracking and no optimizer
/// step; the only side effect is observer statistics widening on quantized
/// modules in calibration mode.
///
/// Returns the number of batches consumed. The batch boundary is the one
/// cooperative cancellation point: a bounded `max_steps` never pulls an
/// extra batch from the source.
pub fn run_calibration_forward(
    model: &mut Model,
    batches: impl IntoIterator<Item = Batch>,
    max_steps: Option<usize>,
    mut forward: Option<CalibrationForward<'_>>,
) -> Result<usize> {
    let mut guard = EvalModeGuard::new(model);
    let mut iter = batches.into_iter();
    let mut consumed = 0usize;

    loop {
        if let Some(limit) = max_steps {
            if consumed >= limit {
                break;
            }
        }
        let Some(batch) = iter.next() else {
            break;
        };
        match forward.as_mut() {
            Some(f) => f(guard.model(), &batch)?,
            None => {
                guard.model().forward(&batch);
            }
        }
        consumed += 1;
    }

    Ok(consumed)
}
