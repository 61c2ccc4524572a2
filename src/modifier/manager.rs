//! Manager dispatching one event stream to multiple modifiers.

use crate::error::Result;
use crate::model::Model;

use super::event::{EventType, LifecycleEvent};
use super::state::ModifierState;
use super::Modifier;

/// Holds modifiers and dispatches lifecycle events to each in registration
/// order.
pub struct ModifierManager {
    modifiers: Vec<Box<dyn Modifier>>,
}

impl ModifierManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self { modifiers: Vec::new() }
    }

    /// Register a modifier.
    pub fn add<M: Modifier + 'static>(&mut self, modifier: M) {
        self.modifiers.push(Box::new(modifier));
    }

    /// Check if no modifiers are registered.
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    /// Number of registered modifiers.
    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    /// Apply structure for every modifier.
    pub fn initialize_structure(
        &mut self,
        state: &mut ModifierState,
        model: &mut Model,
    ) -> Result<()> {
        for modifier in &mut self.modifiers {
            modifier.on_initialize_structure(state, model)?;
        }
        Ok(())
    }

    /// Initialize every modifier. Returns true iff all succeed.
    pub fn initialize(&mut self, state: &mut ModifierState, model: &mut Model) -> Result<bool> {
        let mut ok = true;
        for modifier in &mut self.modifiers {
            ok &= modifier.on_initialize(state, model)?;
        }
        Ok(ok)
    }

    /// Finalize every modifier. Returns true iff all succeed.
    pub fn finalize(&mut self, state: &mut ModifierState, model: &mut Model) -> Result<bool> {
        let mut ok = true;
        for modifier in &mut self.modifiers {
            ok &= modifier.on_finalize(state, model)?;
        }
        Ok(ok)
    }

    /// Route one event to the matching callback of every modifier.
    ///
    /// Batch boundaries go to `on_update`; the `on_event` catch-all fires
    /// after the typed callback for every event.
    pub fn dispatch(
        &mut self,
        state: &mut ModifierState,
        model: &mut Model,
        event: &LifecycleEvent,
    ) -> Result<()> {
        for modifier in &mut self.modifiers {
            match event.event_type {
                EventType::Initialize => {
                    modifier.on_initialize(state, model)?;
                }
                EventType::Start => modifier.on_start(state, model, event),
                EventType::BatchStart | EventType::BatchEnd => {
                    modifier.on_update(state, model, event);
                }
                EventType::End => modifier.on_end(state, model, event),
                EventType::Finalize => {
                    modifier.on_finalize(state, model)?;
                }
            }
            modifier.on_event(state, model, event);
        }
        Ok(())
    }
}

impl Default for ModifierManager {
    fn default() -> Self {
        Self::new()
    }
}
