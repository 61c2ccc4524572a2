//! Lifecycle modifiers
//!
//! A modifier attaches compression behavior to a live model across a
//! training or calibration run. The external harness owns the event stream;
//! it drives each modifier through `on_initialize` → (`on_start` /
//! `on_update` / `on_end`) → `on_finalize`, either directly or through a
//! [`ModifierManager`].
//!
//! All cross-call state a modifier needs beyond its own configuration lives
//! in an explicit [`ModifierState`] passed by reference through every
//! lifecycle call; there are no hidden instance fields smuggling data
//! between events.

mod event;
mod manager;
mod quantization;
mod state;


use std::fmt;

pub use event::{EventType, LifecycleEvent};
pub use manager::ModifierManager;
pub use quantization::QuantizationModifier;
pub use state::ModifierState;

use crate::error::Result;
use crate::model::Model;

/// Kind tag for a modifier, fixed at construction.
///
/// Used for log prefixes and error messages instead of deriving a label from
/// type names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModifierKind {
    /// Quantization scheme application + calibration lifecycle
    Quantization,
}

impl fmt::Display for ModifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModifierKind::Quantization => write!(f, "QuantizationModifier"),
        }
    }
}

/// Trait for lifecycle modifiers.
///
/// All methods except `kind` have default no-op implementations, so a
/// modifier only implements the events it cares about.
pub trait Modifier {
    /// The modifier's kind tag.
    fn kind(&self) -> ModifierKind;

    /// Apply structure (schemes, wrappers) without starting any data
    /// collection; used when a separate initialize step follows.
    fn on_initialize_structure(
        &mut self,
        _state: &mut ModifierState,
        _model: &mut Model,
    ) -> Result<()> {
        Ok(())
    }

    /// Full initialization at the start of a run. Returns a success flag.
    fn on_initialize(&mut self, _state: &mut ModifierState, _model: &mut Model) -> Result<bool> {
        Ok(true)
    }

    /// Fired when the run's current index reaches the modifier's start.
    fn on_start(
        &mut self,
        _state: &mut ModifierState,
        _model: &mut Model,
        _event: &LifecycleEvent,
    ) {
    }

    /// Fired on batch boundaries while the modifier is active.
    fn on_update(
        &mut self,
        _state: &mut ModifierState,
        _model: &mut Model,
        _event: &LifecycleEvent,
    ) {
    }

    /// Fired when the run ends.
    fn on_end(&mut self, _state: &mut ModifierState, _model: &mut Model, _event: &LifecycleEvent) {
    }

    /// Terminal cleanup; must not mutate the model. Returns a success flag.
    fn on_finalize(&mut self, _state: &mut ModifierState, _model: &mut Model) -> Result<bool> {
        Ok(true)
    }

    /// Catch-all fired after the typed callback for every event.
    fn on_event(
        &mut self,
        _state: &mut ModifierState,
        _model: &mut Model,
        _event: &LifecycleEvent,
    ) {
    }
}
