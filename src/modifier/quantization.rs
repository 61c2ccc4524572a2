//! Quantization lifecycle modifier.
//!
//! Enables post-training quantization (PTQ) and quantization-aware training
//! (QAT) for the modules of a model. After calibration (PTQ) or the start
//! index (QAT), matched modules emulate quantized execution and the modifier
//! stays active until the run completes.

use crate::calibrate::run_calibration_forward;
use crate::error::{CompressionError, Result};
use crate::model::Model;
use crate::quant::{
    apply_quantization_config, freeze_module_quantization, set_module_for_calibration,
    ConfigGroup, QuantizationConfig, QuantizationScheme, QuantizationStatus,
};

use super::event::{EventType, LifecycleEvent};
use super::state::ModifierState;
use super::{Modifier, ModifierKind};

/// Sentinel index meaning "unset": one-shot start, run-once end, never
/// disable observers.
const UNSET_INDEX: f64 = -1.0;

/// Event-driven state machine attaching quantization behavior to a model.
///
/// Lifecycle: `on_initialize` applies schemes to matched modules and, for a
/// one-shot schedule, calibrates and freezes immediately. For scheduled runs
/// `on_start` resumes observer updates, `on_update` freezes them once the
/// configured disable index is reached, and `on_end` freezes them
/// unconditionally. `on_finalize` is terminal and touches nothing.
///
/// # Example
///
/// ```
/// use comprimir::model::{Model, ModuleNode};
/// use comprimir::modifier::{Modifier, ModifierState, QuantizationModifier};
/// use comprimir::quant::{QuantizationScheme, QuantizationStatus};
///
/// let mut model = Model::new(
///     ModuleNode::new("net", "Sequential").with_child(ModuleNode::new("fc", "Linear")),
/// );
/// let mut modifier = QuantizationModifier::new()
///     .with_group("group_0", QuantizationScheme::symmetric(8, vec!["Linear".into()]));
/// let mut state = ModifierState::new();
///
/// modifier.on_initialize(&mut state, &mut model).unwrap();
/// assert_eq!(modifier.status(), QuantizationStatus::Frozen);
/// ```
#[derive(Clone, Debug, Default)]
pub struct QuantizationModifier {
    config_groups: Vec<ConfigGroup>,
    ignore: Vec<String>,
    status: QuantizationStatus,
    finalized: bool,
    calibration_batches: Option<usize>,
}

impl QuantizationModifier {
    /// Create a modifier with no config groups.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a modifier from a persisted quantization config.
    pub fn from_config(config: QuantizationConfig) -> Self {
        Self { config_groups: config.config_groups, ignore: config.ignore, ..Self::default() }
    }

    /// Add a named config group.
    pub fn with_group(mut self, name: impl Into<String>, scheme: QuantizationScheme) -> Self {
        self.config_groups.push(ConfigGroup::new(name, scheme));
        self
    }

    /// Add an ignore pattern.
    pub fn with_ignore(mut self, pattern: impl Into<String>) -> Self {
        self.ignore.push(pattern.into());
        self
    }

    /// Current lifecycle status.
    pub fn status(&self) -> QuantizationStatus {
        self.status
    }

    /// Check whether `on_finalize` has run.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Number of batches consumed by one-shot calibration, once it has run.
    pub fn calibration_batches(&self) -> Option<usize> {
        self.calibration_batches
    }

    /// Registered config groups.
    pub fn config_groups(&self) -> &[ConfigGroup] {
        &self.config_groups
    }

    /// Snapshot the modifier's configuration as an initialized config.
    pub fn create_init_config(&self) -> QuantizationConfig {
        QuantizationConfig {
            config_groups: self.config_groups.clone(),
            ignore: self.ignore.clone(),
            status: QuantizationStatus::Initialized,
        }
    }

    /// The start index, or the sentinel `-1` meaning one-shot.
    pub fn resolve_start(&self, state: &ModifierState) -> f64 {
        state.start.unwrap_or(UNSET_INDEX)
    }

    /// The observer-disable index, or the sentinel `-1` meaning "never
    /// disable automatically".
    pub fn resolve_disable_observer_epoch(&self, state: &ModifierState) -> f64 {
        state.disable_observer_epoch.unwrap_or(UNSET_INDEX)
    }

    /// Given the current index, determine whether observers should freeze.
    pub fn should_disable_observer(&self, state: &ModifierState, event: &LifecycleEvent) -> bool {
        let disable_epoch = self.resolve_disable_observer_epoch(state);
        disable_epoch != UNSET_INDEX && event.current_index >= disable_epoch
    }

    fn apply_to_model(&self, model: &mut Model) -> Result<usize> {
        apply_quantization_config(model, &self.create_init_config())
    }

    // Fatal calibration preconditions, checked before any module mutation.
    fn validate_calibration(&self, state: &ModifierState) -> Result<()> {
        match state.calibration_steps {
            Some(steps) if steps > 0 && !state.has_calibration_data() => {
                Err(CompressionError::MissingCalibrationData { steps })
            }
            _ => Ok(()),
        }
    }

    fn calibrate_if_possible(
        &mut self,
        state: &mut ModifierState,
        model: &mut Model,
    ) -> Result<()> {
        if state.calibration_steps == Some(0) && state.has_calibration_data() {
            eprintln!(
                "[{}] num_calibration_steps is 0; calibration data will not be used",
                self.kind()
            );
            return Ok(());
        }
        self.validate_calibration(state)?;
        let Some(data) = state.take_calibration_data() else {
            return Ok(());
        };

        let consumed = run_calibration_forward(model, data, state.calibration_steps, None)?;
        self.calibration_batches = Some(consumed);
        eprintln!("[{}] calibration complete over {consumed} batches", self.kind());
        Ok(())
    }
}

impl Modifier for QuantizationModifier {
    fn kind(&self) -> ModifierKind {
        ModifierKind::Quantization
    }

    fn on_initialize_structure(
        &mut self,
        _state: &mut ModifierState,
        model: &mut Model,
    ) -> Result<()> {
        self.apply_to_model(model)?;
        freeze_module_quantization(model);
        self.status = QuantizationStatus::Initialized;
        Ok(())
    }

    fn on_initialize(&mut self, state: &mut ModifierState, model: &mut Model) -> Result<bool> {
        if let Some(end) = state.end {
            if end != UNSET_INDEX {
                return Err(CompressionError::BoundedDuration { kind: self.kind(), end });
            }
        }

        let one_shot = self.resolve_start(state) == UNSET_INDEX;
        if one_shot {
            self.validate_calibration(state)?;
        }

        self.apply_to_model(model)?;
        self.status = QuantizationStatus::Initialized;

        if one_shot {
            set_module_for_calibration(model);
            self.status = QuantizationStatus::Calibration;
            self.calibrate_if_possible(state, model)?;
            freeze_module_quantization(model);
            self.status = QuantizationStatus::Frozen;
        }

        Ok(true)
    }

    fn on_start(&mut self, _state: &mut ModifierState, model: &mut Model, _event: &LifecycleEvent) {
        set_module_for_calibration(model);
        self.status = QuantizationStatus::Calibration;
    }

    fn on_update(&mut self, state: &mut ModifierState, model: &mut Model, event: &LifecycleEvent) {
        if event.event_type == EventType::BatchStart && self.should_disable_observer(state, event) {
            freeze_module_quantization(model);
            self.status = QuantizationStatus::Frozen;
        }
    }

    fn on_end(&mut self, _state: &mut ModifierState, model: &mut Model, _event: &LifecycleEvent) {
        freeze_module_quantization(model);
        self.status = QuantizationStatus::Frozen;
    }

    fn on_finalize(&mut self, _state: &mut ModifierState, _model: &mut Model) -> Result<bool> {
        self.finalized = true;
        Ok(true)
    }
}
