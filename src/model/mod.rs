//! Model handle: a named submodule tree with a mutable train/eval flag.
//!
//! This is the engine's only view of a model. The host framework's module
//! tree is mirrored as `ModuleNode`s carrying a local name, a class tag, and
//! ordered children; quantization state attaches directly to nodes. Traversal
//! is depth-first with dotted qualified names (`encoder.layers.0.fc`),
//! independent of any particular framework.

use crate::calibrate::Batch;
use crate::quant::ModuleQuantizationState;


/// One module in the submodule tree.
#[derive(Clone, Debug, Default)]
pub struct ModuleNode {
    name: String,
    kind: String,
    children: Vec<ModuleNode>,
    weights: Vec<f32>,
    quant: Option<ModuleQuantizationState>,
}

impl ModuleNode {
    /// Create a module with a local name and a class tag (e.g., "Linear").
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            children: Vec::new(),
            weights: Vec::new(),
            quant: None,
        }
    }

    /// Append a child module.
    pub fn with_child(mut self, child: ModuleNode) -> Self {
        self.children.push(child);
        self
    }

    /// Attach weight values to the module.
    pub fn with_weights(mut self, weights: Vec<f32>) -> Self {
        self.weights = weights;
        self
    }

    /// Local (unqualified) module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class tag of the module.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Ordered child modules.
    pub fn children(&self) -> &[ModuleNode] {
        &self.children
    }

    /// Ordered child modules, mutable.
    pub fn children_mut(&mut self) -> &mut [ModuleNode] {
        &mut self.children
    }

    /// Weight values carried by the module.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Check whether the module has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// A module is quantized iff it holds attached quantization state.
    pub fn is_quantized(&self) -> bool {
        self.quant.is_some()
    }

    /// Attached quantization state, if any.
    pub fn quantization(&self) -> Option<&ModuleQuantizationState> {
        self.quant.as_ref()
    }

    /// Attached quantization state, mutable.
    pub fn quantization_mut(&mut self) -> Option<&mut ModuleQuantizationState> {
        self.quant.as_mut()
    }

    /// Attach (or replace) quantization state.
    pub fn set_quantization(&mut self, state: ModuleQuantizationState) {
        self.quant = Some(state);
    }

    /// Detach quantization state, returning it.
    pub fn clear_quantization(&mut self) -> Option<ModuleQuantizationState> {
        self.quant.take()
    }

    fn visit<'a>(&'a self, prefix: &str, f: &mut dyn FnMut(&str, &'a ModuleNode)) {
        let qualified = if prefix.is_empty() {
            self.name.clone()
        } else {
            format!("{prefix}.{}", self.name)
        };
        f(&qualified, self);
        for child in &self.children {
            child.visit(&qualified, f);
        }
    }

    fn visit_mut(&mut self, prefix: &str, f: &mut dyn FnMut(&str, &mut ModuleNode)) {
        let qualified = if prefix.is_empty() {
            self.name.clone()
        } else {
            format!("{prefix}.{}", self.name)
        };
        f(&qualified, self);
        for child in &mut self.children {
            child.visit_mut(&qualified, f);
        }
    }

    // Forward emulation for one node: observe while calibrating, then apply
    // the quantize-dequantize round trip once parameters exist. Weight values
    // are never touched here.
    fn forward_values(&mut self, values: &mut Vec<f32>) {
        if let Some(state) = &mut self.quant {
            if state.calibrating && !state.frozen {
                state.observer.observe(values);
            }
            if let Some(params) = state.quantization_params() {
                state.scheme.fake_quantize_in_place(values, &params);
            }
        }
        for child in &mut self.children {
            child.forward_values(values);
        }
    }
}

/// A model: one module tree plus a train/eval mode flag.
#[derive(Clone, Debug)]
pub struct Model {
    root: ModuleNode,
    training: bool,
}

impl Model {
    /// Wrap a module tree. Models start in training mode.
    pub fn new(root: ModuleNode) -> Self {
        Self { root, training: true }
    }

    /// Root of the module tree.
    pub fn root(&self) -> &ModuleNode {
        &self.root
    }

    /// Root of the module tree, mutable.
    pub fn root_mut(&mut self) -> &mut ModuleNode {
        &mut self.root
    }

    /// Check whether the model is in training mode.
    pub fn is_training(&self) -> bool {
        self.training
    }

    /// Set the train/eval mode flag.
    pub fn set_training(&mut self, training: bool) {
        self.training = training;
    }

    /// Switch to training mode.
    pub fn train(&mut self) {
        self.training = true;
    }

    /// Switch to evaluation mode (disables training-only behavior).
    pub fn eval(&mut self) {
        self.training = false;
    }

    /// Visit every module depth-first with its dotted qualified name.
    pub fn for_each_module<'a>(&'a self, mut f: impl FnMut(&str, &'a ModuleNode)) {
        self.root.visit("", &mut f);
    }

    /// Visit every module depth-first, mutable.
    pub fn for_each_module_mut(&mut self, mut f: impl FnMut(&str, &mut ModuleNode)) {
        self.root.visit_mut("", &mut f);
    }

    /// Check whether any module in the tree is quantized.
    pub fn is_quantized(&self) -> bool {
        self.quantized_module_count() > 0
    }

    /// Number of quantized modules in the tree.
    pub fn quantized_module_count(&self) -> usize {
        let mut count = 0;
        self.for_each_module(|_, module| {
            if module.is_quantized() {
                count += 1;
            }
        });
        count
    }

    /// Plain forward evaluation over one batch.
    ///
    /// Activations pass through every module in tree order; quantized modules
    /// observe them while calibrating and emulate quantized execution once
    /// parameters exist. Parameters are never mutated.
    pub fn forward(&mut self, batch: &Batch) -> Vec<f32> {
        let mut values = batch.inputs.clone();
        self.root.forward_values(&mut values);
        values
    }
}
