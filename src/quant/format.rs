//! Compression-format inference.

use serde::{Deserialize, Serialize};

use crate::model::Model;

/// On-disk representation for a compressed model artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompressionFormat {
    /// Uncompressed floating-point weights
    Dense,
    /// General integer-quantized representation
    IntQuantized,
    /// Packed dense 4-bit representation
    PackQuantized,
}

/// Infer a compression format from model state and compression args.
///
/// An unquantized model has nothing to compress and yields `None`. An
/// explicit format supersedes any inference. Otherwise, when compressed
/// saving is requested, the choice follows the set of distinct weight
/// bit-depths across quantized leaf modules: everything 4-bit packs densely,
/// anything else falls back to the general integer representation. Without
/// compressed saving the format is left to be derived later from persisted
/// configuration.
pub fn infer_quantization_format(
    model: &Model,
    explicit: Option<CompressionFormat>,
    save_compressed: bool,
) -> Option<CompressionFormat> {
    if !model.is_quantized() {
        return None;
    }
    if explicit.is_some() {
        return explicit;
    }
    if save_compressed {
        if quantized_weight_depths(model) == [4] {
            Some(CompressionFormat::PackQuantized)
        } else {
            Some(CompressionFormat::IntQuantized)
        }
    } else {
        None
    }
}

// Distinct weight bit-depths across quantized leaf modules, in first-seen
// order.
fn quantized_weight_depths(model: &Model) -> Vec<u32> {
    let mut depths = Vec::new();
    model.for_each_module(|_, module| {
        if !module.is_leaf() {
            return;
        }
        if let Some(state) = module.quantization() {
            if !depths.contains(&state.scheme.num_bits) {
                depths.push(state.scheme.num_bits);
            }
        }
    });
    depths
}
