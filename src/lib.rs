//! Comprimir: model-compression lifecycle engine
//!
//! Attaches quantization behavior to a live model across a training or
//! calibration run, driven by lifecycle events. It provides:
//!
//! - **Scheme registry**: named config groups mapping module-target patterns
//!   to quantization schemes (bit depth, symmetric/asymmetric,
//!   per-channel/per-tensor)
//! - **Config applier**: idempotent scheme application over a submodule tree,
//!   honoring an ignore list
//! - **Calibration runner**: bounded or unbounded forward passes that populate
//!   observer statistics without touching parameters
//! - **Lifecycle modifier**: the event-driven state machine that applies
//!   config, toggles calibration mode, and freezes observers
//!
//! The host training loop is an external collaborator: it owns the event
//! stream and the data pipeline, and hands the engine a model handle plus an
//! iterator of calibration batches.
//!
//! # Example
//!
//! ```
//! use comprimir::model::{Model, ModuleNode};
//! use comprimir::modifier::{Modifier, ModifierState, QuantizationModifier};
//! use comprimir::quant::QuantizationScheme;
//!
//! let root = ModuleNode::new("model", "Sequential")
//!     .with_child(ModuleNode::new("fc1", "Linear"))
//!     .with_child(ModuleNode::new("fc2", "Linear"));
//! let mut model = Model::new(root);
//!
//! let mut modifier = QuantizationModifier::new()
//!     .with_group("group_0", QuantizationScheme::symmetric(8, vec!["Linear".into()]));
//! let mut state = ModifierState::new();
//!
//! assert!(modifier.on_initialize(&mut state, &mut model).unwrap());
//! ```

pub mod calibrate;
pub mod error;
pub mod model;
pub mod modifier;
pub mod quant;

pub use calibrate::{run_calibration_forward, Batch, BatchSource};
pub use error::{CompressionError, Result};
pub use model::{Model, ModuleNode};
pub use modifier::{
    EventType, LifecycleEvent, Modifier, ModifierKind, ModifierManager, ModifierState,
    QuantizationModifier,
};
pub use quant::{
    apply_quantization_config, infer_quantization_format, CompressionFormat, ConfigGroup,
    QuantizationConfig, QuantizationScheme, QuantizationStatus,
};
