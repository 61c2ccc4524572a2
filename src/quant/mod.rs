//! Quantization schemes, config application, and format inference
//!
//! Provides the pieces the lifecycle modifier coordinates:
//! - Named config groups mapping target patterns to quantization schemes
//! - Tree-wide scheme application with ignore-list support
//! - Per-module observers (min-max, moving average, histogram)
//! - Compression-format inference from quantized weight bit-depths

mod apply;
mod config;
mod format;
mod observer;
mod scheme;


pub use apply::{
    apply_quantization_config, freeze_module_quantization, set_module_for_calibration,
};
pub use config::{QuantizationConfig, QuantizationStatus};
pub use format::{infer_quantization_format, CompressionFormat};
pub use observer::{ModuleQuantizationState, Observer, ObserverMethod};
pub use scheme::{
    ConfigGroup, QuantizationGranularity, QuantizationMode, QuantizationParams,
    QuantizationScheme,
};
