//! One-Shot Post-Training Quantization Example
//!
//! Builds a small transformer-like module tree, applies a 4-bit scheme to its
//! projection layers from a YAML recipe, calibrates over synthetic batches at
//! initialization, and prints the resulting observer ranges plus the inferred
//! compression format.
//!
//! Run with: cargo run --example ptq_oneshot

use comprimir::calibrate::SyntheticBatches;
use comprimir::model::{Model, ModuleNode};
use comprimir::modifier::{Modifier, ModifierState, QuantizationModifier};
use comprimir::quant::{infer_quantization_format, QuantizationConfig};

const RECIPE: &str = r"
config_groups:
  - name: group_0
    scheme:
      num_bits: 4
      mode: symmetric
      targets: ['re:.*_proj$']
ignore: ['re:.*norm$']
";

fn main() {
    println!("=== One-Shot PTQ ===\n");

    let mut model = demo_model();
    let config = QuantizationConfig::from_yaml(RECIPE).expect("parse recipe");
    let mut modifier = QuantizationModifier::from_config(config);

    // One-shot: no start epoch, so initialization applies schemes, calibrates
    // over the supplied batches, and freezes observers in a single step.
    let mut state = ModifierState::new()
        .with_end(-1.0)
        .with_calibration_data(SyntheticBatches::new(8, 32).generate());

    modifier.on_initialize(&mut state, &mut model).expect("initialize");

    println!("status: {}", modifier.status());
    if let Some(batches) = modifier.calibration_batches() {
        println!("calibrated over {batches} batches\n");
    }

    println!("--- Quantized modules ---");
    model.for_each_module(|name, module| {
        if let Some(quant) = module.quantization() {
            let (min, max) = quant.observer.range().expect("calibrated");
            println!(
                "{name}: {} bits, observed range [{min:.3}, {max:.3}]",
                quant.scheme.num_bits
            );
        }
    });

    let format = infer_quantization_format(&model, None, true);
    println!("\ninferred compression format: {format:?}");
}

/// Two-block transformer-ish tree with projection and norm layers.
fn demo_model() -> Model {
    let block = |idx: &str| {
        ModuleNode::new(idx, "Block")
            .with_child(ModuleNode::new("q_proj", "Linear"))
            .with_child(ModuleNode::new("v_proj", "Linear"))
            .with_child(ModuleNode::new("norm", "LayerNorm"))
    };
    let root = ModuleNode::new("model", "Transformer")
        .with_child(
            ModuleNode::new("layers", "ModuleList")
                .with_child(block("0"))
                .with_child(block("1")),
        )
        .with_child(ModuleNode::new("lm_head", "Linear"));
    Model::new(root)
}
