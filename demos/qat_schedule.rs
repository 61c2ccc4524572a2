//! Scheduled Quantization-Aware Training Example
//!
//! Drives a quantization modifier through a `ModifierManager` with a start
//! epoch and an observer-disable epoch, feeding batches between events to show
//! when observers collect statistics and when they freeze.
//!
//! Run with: cargo run --example qat_schedule

use comprimir::calibrate::Batch;
use comprimir::model::{Model, ModuleNode};
use comprimir::modifier::{
    EventType, LifecycleEvent, ModifierManager, ModifierState, QuantizationModifier,
};
use comprimir::quant::QuantizationScheme;

fn main() {
    println!("=== Scheduled QAT ===\n");
    println!("start epoch 1, observers disabled at epoch 3\n");

    let mut model = demo_model();
    let mut manager = ModifierManager::new();
    manager.add(
        QuantizationModifier::new()
            .with_group("group_0", QuantizationScheme::symmetric(8, vec!["Linear".into()])),
    );

    let mut state = ModifierState::new().with_start(1.0).with_disable_observer_epoch(3.0);

    manager
        .dispatch(&mut state, &mut model, &LifecycleEvent::new(EventType::Initialize, 0.0))
        .expect("initialize");

    for epoch in 0..5 {
        let index = f64::from(epoch);
        if index == 1.0 {
            manager
                .dispatch(&mut state, &mut model, &LifecycleEvent::new(EventType::Start, index))
                .expect("start");
        }
        manager
            .dispatch(&mut state, &mut model, &LifecycleEvent::batch_start(index))
            .expect("batch start");
        model.forward(&Batch::new(vec![index as f32, -(index as f32)]));
        manager
            .dispatch(&mut state, &mut model, &LifecycleEvent::batch_end(index))
            .expect("batch end");

        let (calibrating, frozen) = observer_state(&model);
        println!("epoch {epoch}: {calibrating} calibrating, {frozen} frozen");
    }

    manager
        .dispatch(&mut state, &mut model, &LifecycleEvent::new(EventType::End, 5.0))
        .expect("end");
    manager
        .dispatch(&mut state, &mut model, &LifecycleEvent::new(EventType::Finalize, 5.0))
        .expect("finalize");

    println!("\n--- Final observer ranges ---");
    model.for_each_module(|name, module| {
        if let Some(quant) = module.quantization() {
            if let Some((min, max)) = quant.observer.range() {
                println!("{name}: [{min:.2}, {max:.2}]");
            }
        }
    });
}

/// Count modules with live observers and modules frozen.
fn observer_state(model: &Model) -> (usize, usize) {
    let mut calibrating = 0;
    let mut frozen = 0;
    model.for_each_module(|_, module| {
        if let Some(quant) = module.quantization() {
            if quant.calibrating && !quant.frozen {
                calibrating += 1;
            }
            if quant.frozen {
                frozen += 1;
            }
        }
    });
    (calibrating, frozen)
}

fn demo_model() -> Model {
    let root = ModuleNode::new("net", "Sequential")
        .with_child(ModuleNode::new("fc1", "Linear"))
        .with_child(ModuleNode::new("fc2", "Linear"))
        .with_child(ModuleNode::new("norm", "LayerNorm"));
    Model::new(root)
}
