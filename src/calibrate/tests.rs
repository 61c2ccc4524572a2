//! Tests for the calibration runner.

use std::cell::Cell;
use std::rc::Rc;

use super::*;
use crate::error::CompressionError;
use crate::model::{Model, ModuleNode};
use crate::quant::{
    apply_quantization_config, set_module_for_calibration, QuantizationConfig, QuantizationScheme,
};

fn calibrating_model() -> Model {
    let root = ModuleNode::new("model", "Sequential")
        .with_child(ModuleNode::new("fc", "Linear"));
    let mut model = Model::new(root);
    let config = QuantizationConfig::new()
        .with_group("group_0", QuantizationScheme::symmetric(8, vec!["Linear".into()]));
    apply_quantization_config(&mut model, &config).expect("apply");
    set_module_for_calibration(&mut model);
    model
}

// Wraps a batch source so the test can count how many batches were pulled.
fn counted_source(batches: Vec<Batch>) -> (impl Iterator<Item = Batch>, Rc<Cell<usize>>) {
    let pulled = Rc::new(Cell::new(0));
    let counter = Rc::clone(&pulled);
    let iter = batches.into_iter().inspect(move |_| counter.set(counter.get() + 1));
    (iter, pulled)
}

#[test]
fn test_unbounded_run_exhausts_source() {
    let mut model = calibrating_model();
    let batches = SyntheticBatches::new(10, 4).generate();

    let consumed = run_calibration_forward(&mut model, batches, None, None).expect("run");
    assert_eq!(consumed, 10);
}

#[test]
fn test_max_steps_bounds_consumption() {
    let mut model = calibrating_model();
    let (source, pulled) = counted_source(SyntheticBatches::new(10, 4).generate());

    let consumed = run_calibration_forward(&mut model, source, Some(3), None).expect("run");
    assert_eq!(consumed, 3);
    assert_eq!(pulled.get(), 3);
}

#[test]
fn test_zero_steps_pulls_nothing() {
    let mut model = calibrating_model();
    let (source, pulled) = counted_source(SyntheticBatches::new(5, 4).generate());

    let consumed = run_calibration_forward(&mut model, source, Some(0), None).expect("run");
    assert_eq!(consumed, 0);
    assert_eq!(pulled.get(), 0);
}

#[test]
fn test_unknown_length_source_with_bound() {
    let mut model = calibrating_model();
    let endless = std::iter::repeat_with(|| Batch::new(vec![0.5, -0.5]));

    let consumed = run_calibration_forward(&mut model, endless, Some(7), None).expect("run");
    assert_eq!(consumed, 7);
}

#[test]
fn test_model_runs_in_eval_mode_and_is_restored() {
    let mut model = calibrating_model();
    assert!(model.is_training());

    let saw_training = Rc::new(Cell::new(false));
    let spy = Rc::clone(&saw_training);
    let mut forward = |model: &mut Model, batch: &Batch| -> crate::error::Result<()> {
        if model.is_training() {
            spy.set(true);
        }
        model.forward(batch);
        Ok(())
    };

    run_calibration_forward(
        &mut model,
        SyntheticBatches::new(3, 4).generate(),
        None,
        Some(&mut forward),
    )
    .expect("run");

    assert!(!saw_training.get(), "forward passes must run in eval mode");
    assert!(model.is_training(), "prior mode restored after the run");
}

#[test]
fn test_mode_restored_when_forward_fails() {
    let mut model = calibrating_model();
    model.eval();

    let mut forward = |_: &mut Model, _: &Batch| -> crate::error::Result<()> {
        Err(CompressionError::InvalidTargetPattern {
            pattern: "batch".into(),
            reason: "malformed".into(),
        })
    };

    let result = run_calibration_forward(
        &mut model,
        SyntheticBatches::new(3, 4).generate(),
        None,
        Some(&mut forward),
    );

    assert!(result.is_err());
    assert!(!model.is_training(), "prior (eval) mode restored after failure");
}

#[test]
fn test_observers_widen_during_run() {
    let mut model = calibrating_model();
    let batches = vec![Batch::new(vec![-1.0, 0.0]), Batch::new(vec![0.0, 3.0])];

    run_calibration_forward(&mut model, batches, None, None).expect("run");

    model.for_each_module(|_, module| {
        if let Some(state) = module.quantization() {
            let (min, max) = state.observer.range().expect("observed");
            assert!(min <= -1.0);
            assert!(max >= 3.0);
            assert_eq!(state.observer.batches_seen(), 2);
        }
    });
}

#[test]
fn test_weights_untouched_by_calibration() {
    let root = ModuleNode::new("model", "Sequential")
        .with_child(ModuleNode::new("fc", "Linear").with_weights(vec![1.5, -2.5]));
    let mut model = Model::new(root);
    let config = QuantizationConfig::new()
        .with_group("group_0", QuantizationScheme::symmetric(4, vec!["Linear".into()]));
    apply_quantization_config(&mut model, &config).expect("apply");
    set_module_for_calibration(&mut model);

    run_calibration_forward(&mut model, SyntheticBatches::new(4, 8).generate(), None, None)
        .expect("run");

    model.for_each_module(|_, module| {
        if module.is_leaf() {
            assert_eq!(module.weights(), &[1.5, -2.5]);
        }
    });
}
