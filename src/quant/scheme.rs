//! Quantization scheme definitions.

use serde::{Deserialize, Serialize};

/// Quantization mode: symmetric or asymmetric
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuantizationMode {
    /// Symmetric: zero-point = 0, range = [-max_abs, max_abs]
    #[default]
    Symmetric,
    /// Asymmetric: zero-point != 0, range = [min, max]
    Asymmetric,
}

/// Granularity at which scale/zero-point are computed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuantizationGranularity {
    /// Single scale/zero-point for the entire tensor
    #[default]
    PerTensor,
    /// Separate scale/zero-point per output channel
    PerChannel,
}

/// Computed quantization parameters for one module.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuantizationParams {
    /// Scale factor for quantization
    pub scale: f32,
    /// Zero point for asymmetric quantization
    pub zero_point: i32,
}

/// A quantization parameter scheme shared by all modules matching one of its
/// target patterns.
///
/// Immutable once constructed. Target patterns are matched against a module's
/// qualified name and class tag; an `re:` prefix switches a pattern to
/// regular-expression matching.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuantizationScheme {
    /// Bit depth for quantized weights (e.g., 4, 8)
    pub num_bits: u32,
    /// Symmetric or asymmetric quantization
    #[serde(default)]
    pub mode: QuantizationMode,
    /// Per-tensor or per-channel scale computation
    #[serde(default)]
    pub granularity: QuantizationGranularity,
    /// Module name/class patterns this scheme applies to
    pub targets: Vec<String>,
}

impl QuantizationScheme {
    /// Create a symmetric per-tensor scheme.
    pub fn symmetric(num_bits: u32, targets: Vec<String>) -> Self {
        Self {
            num_bits,
            mode: QuantizationMode::Symmetric,
            granularity: QuantizationGranularity::PerTensor,
            targets,
        }
    }

    /// Create an asymmetric per-tensor scheme.
    pub fn asymmetric(num_bits: u32, targets: Vec<String>) -> Self {
        Self { mode: QuantizationMode::Asymmetric, ..Self::symmetric(num_bits, targets) }
    }

    /// Switch the scheme to per-channel granularity.
    pub fn per_channel(mut self) -> Self {
        self.granularity = QuantizationGranularity::PerChannel;
        self
    }

    /// Lower bound of the integer quantization range.
    ///
    /// Symmetric 4-bit: -7, 8-bit: -127. Asymmetric ranges start at 0.
    pub fn qmin(&self) -> i32 {
        match self.mode {
            QuantizationMode::Symmetric => -self.qmax(),
            QuantizationMode::Asymmetric => 0,
        }
    }

    /// Upper bound of the integer quantization range.
    ///
    /// Symmetric 4-bit: 7, 8-bit: 127. Asymmetric 4-bit: 15, 8-bit: 255.
    pub fn qmax(&self) -> i32 {
        match self.mode {
            QuantizationMode::Symmetric => (1 << (self.num_bits - 1)) - 1,
            QuantizationMode::Asymmetric => (1 << self.num_bits) - 1,
        }
    }

    /// Compute scale and zero-point from an observed value range.
    ///
    /// Symmetric: scale from the max absolute value, zero-point pinned to 0.
    /// Asymmetric: scale from the range, zero-point shifted and clamped into
    /// the integer range.
    pub fn params_from_range(&self, min_val: f32, max_val: f32) -> QuantizationParams {
        match self.mode {
            QuantizationMode::Symmetric => {
                let max_abs = min_val.abs().max(max_val.abs());
                let scale = if max_abs < 1e-10 { 1e-10 } else { max_abs / self.qmax() as f32 };
                QuantizationParams { scale, zero_point: 0 }
            }
            QuantizationMode::Asymmetric => {
                let range = max_val - min_val;
                let scale =
                    if range < 1e-10 { 1e-10 } else { range / (self.qmax() - self.qmin()) as f32 };
                let zero_point = (self.qmin() as f32 - min_val / scale).round() as i32;
                QuantizationParams { scale, zero_point: zero_point.clamp(self.qmin(), self.qmax()) }
            }
        }
    }

    /// Fake quantization: quantize then dequantize in place.
    ///
    /// Simulates quantized execution while keeping values in floating point,
    /// so a calibrated or frozen module keeps emulating its integer forward.
    pub fn fake_quantize_in_place(&self, values: &mut [f32], params: &QuantizationParams) {
        let qmin = self.qmin() as f32;
        let qmax = self.qmax() as f32;
        for v in values.iter_mut() {
            let q = (*v / params.scale + params.zero_point as f32).round().clamp(qmin, qmax);
            *v = (q - params.zero_point as f32) * params.scale;
        }
    }
}

/// A named config group: one scheme plus the name it is registered under.
///
/// Declaration order matters; the config applier matches first-group-wins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfigGroup {
    /// Group name (e.g., "group_0")
    pub name: String,
    /// Scheme applied to modules matching this group's targets
    pub scheme: QuantizationScheme,
}

impl ConfigGroup {
    /// Create a named config group.
    pub fn new(name: impl Into<String>, scheme: QuantizationScheme) -> Self {
        Self { name: name.into(), scheme }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_ranges() {
        let scheme = QuantizationScheme::symmetric(4, vec![]);
        assert_eq!(scheme.qmin(), -7);
        assert_eq!(scheme.qmax(), 7);

        let scheme = QuantizationScheme::symmetric(8, vec![]);
        assert_eq!(scheme.qmin(), -127);
        assert_eq!(scheme.qmax(), 127);
    }

    #[test]
    fn test_asymmetric_ranges() {
        let scheme = QuantizationScheme::asymmetric(4, vec![]);
        assert_eq!(scheme.qmin(), 0);
        assert_eq!(scheme.qmax(), 15);

        let scheme = QuantizationScheme::asymmetric(8, vec![]);
        assert_eq!(scheme.qmin(), 0);
        assert_eq!(scheme.qmax(), 255);
    }

    #[test]
    fn test_symmetric_params_pin_zero_point() {
        let scheme = QuantizationScheme::symmetric(8, vec![]);
        let params = scheme.params_from_range(-2.0, 1.0);
        assert_eq!(params.zero_point, 0);
        assert!((params.scale - 2.0 / 127.0).abs() < 1e-6);
    }

    #[test]
    fn test_asymmetric_params_clamp_zero_point() {
        let scheme = QuantizationScheme::asymmetric(8, vec![]);
        let params = scheme.params_from_range(0.0, 1.0);
        assert!(params.zero_point >= scheme.qmin());
        assert!(params.zero_point <= scheme.qmax());
    }

    #[test]
    fn test_degenerate_range_has_nonzero_scale() {
        let scheme = QuantizationScheme::symmetric(8, vec![]);
        let params = scheme.params_from_range(0.0, 0.0);
        assert!(params.scale > 0.0);
    }

    #[test]
    fn test_fake_quantize_is_idempotent() {
        let scheme = QuantizationScheme::symmetric(8, vec![]);
        let params = scheme.params_from_range(-1.0, 1.0);

        let mut once = vec![-1.0, -0.33, 0.0, 0.5, 1.0];
        scheme.fake_quantize_in_place(&mut once, &params);
        let mut twice = once.clone();
        scheme.fake_quantize_in_place(&mut twice, &params);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_scheme_serde_round_trip_yaml() {
        let scheme = QuantizationScheme::asymmetric(4, vec!["Linear".into()]).per_channel();
        let yaml = serde_yaml::to_string(&scheme).expect("serialize");
        let back: QuantizationScheme = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(scheme, back);
    }

    #[test]
    fn test_scheme_deserialize_defaults() {
        let yaml = "num_bits: 8\ntargets: [Linear]\n";
        let scheme: QuantizationScheme = serde_yaml::from_str(yaml).expect("deserialize");
        assert_eq!(scheme.mode, QuantizationMode::Symmetric);
        assert_eq!(scheme.granularity, QuantizationGranularity::PerTensor);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Fake-quantized values always land inside the dequantized range.
        #[test]
        fn fake_quantize_stays_in_range(
            bits in 2u32..9,
            values in proptest::collection::vec(-100.0f32..100.0, 1..64),
        ) {
            let scheme = QuantizationScheme::symmetric(bits, vec![]);
            let min = values.iter().copied().fold(f32::INFINITY, f32::min);
            let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let params = scheme.params_from_range(min, max);

            let mut quantized = values;
            scheme.fake_quantize_in_place(&mut quantized, &params);

            let bound = scheme.qmax() as f32 * params.scale + 1e-4;
            for v in quantized {
                prop_assert!(v.abs() <= bound);
            }
        }

        /// Asymmetric zero-point always lands inside [qmin, qmax].
        #[test]
        fn asymmetric_zero_point_in_range(
            bits in 2u32..9,
            min in -50.0f32..0.0,
            span in 0.001f32..100.0,
        ) {
            let scheme = QuantizationScheme::asymmetric(bits, vec![]);
            let params = scheme.params_from_range(min, min + span);
            prop_assert!(params.zero_point >= scheme.qmin());
            prop_assert!(params.zero_point <= scheme.qmax());
        }
    }
}
