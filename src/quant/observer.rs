//! Per-module observers and attached quantization state.
//!
//! An observer is a running statistic over activation values used to derive
//! quantization scale and zero-point. Three methods are supported:
//! - Min-max: full range of observed values
//! - Moving average: min/max smoothed over batches (robust to spikes)
//! - Histogram: binned distribution plus min/max, for offline analysis

use super::scheme::{QuantizationParams, QuantizationScheme};

/// Statistic collected by an observer.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum ObserverMethod {
    /// Running min/max over all observed values
    #[default]
    MinMax,
    /// Min/max smoothed with the given momentum (0 = frozen, 1 = last batch)
    MovingAverage {
        /// Smoothing factor applied to each new batch extreme
        momentum: f32,
    },
    /// Binned value distribution alongside running min/max
    Histogram {
        /// Number of histogram bins
        bins: usize,
    },
}

/// Running activation statistic for one quantized module.
#[derive(Clone, Debug)]
pub struct Observer {
    method: ObserverMethod,
    running_min: Option<f32>,
    running_max: Option<f32>,
    histogram: Vec<u64>,
    batches_seen: usize,
}

impl Observer {
    /// Create an observer for the given method.
    pub fn new(method: ObserverMethod) -> Self {
        let bins = match method {
            ObserverMethod::Histogram { bins } => bins,
            _ => 0,
        };
        Self {
            method,
            running_min: None,
            running_max: None,
            histogram: vec![0; bins],
            batches_seen: 0,
        }
    }

    /// Fold one batch of values into the statistic.
    ///
    /// Empty batches are ignored.
    pub fn observe(&mut self, values: &[f32]) {
        if values.is_empty() {
            return;
        }

        let batch_min = values.iter().copied().fold(f32::INFINITY, f32::min);
        let batch_max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        match self.method {
            ObserverMethod::MinMax | ObserverMethod::Histogram { .. } => {
                self.running_min = Some(self.running_min.map_or(batch_min, |m| m.min(batch_min)));
                self.running_max = Some(self.running_max.map_or(batch_max, |m| m.max(batch_max)));
            }
            ObserverMethod::MovingAverage { momentum } => {
                self.running_min = Some(
                    self.running_min
                        .map_or(batch_min, |m| m * (1.0 - momentum) + batch_min * momentum),
                );
                self.running_max = Some(
                    self.running_max
                        .map_or(batch_max, |m| m * (1.0 - momentum) + batch_max * momentum),
                );
            }
        }

        if let ObserverMethod::Histogram { bins } = self.method {
            self.bin_values(values, bins);
        }

        self.batches_seen += 1;
    }

    // Bins only the incoming values against the current range; earlier counts
    // keep their original bin when the range widens.
    fn bin_values(&mut self, values: &[f32], bins: usize) {
        let (Some(min), Some(max)) = (self.running_min, self.running_max) else {
            return;
        };
        if bins == 0 || max <= min {
            return;
        }
        let range = max - min;
        for &v in values {
            let bin = (((v - min) / range) * bins as f32) as usize;
            self.histogram[bin.min(bins - 1)] += 1;
        }
    }

    /// Observed minimum, if any batch has been seen.
    pub fn min(&self) -> Option<f32> {
        self.running_min
    }

    /// Observed maximum, if any batch has been seen.
    pub fn max(&self) -> Option<f32> {
        self.running_max
    }

    /// Observed (min, max) range, if any batch has been seen.
    pub fn range(&self) -> Option<(f32, f32)> {
        match (self.running_min, self.running_max) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }

    /// Histogram bin counts (empty unless the histogram method is active).
    pub fn histogram(&self) -> &[u64] {
        &self.histogram
    }

    /// Number of batches folded in so far.
    pub fn batches_seen(&self) -> usize {
        self.batches_seen
    }

    /// Check if any data has been observed.
    pub fn has_data(&self) -> bool {
        self.batches_seen > 0
    }

    /// Reset the statistic to its initialization defaults.
    pub fn reset(&mut self) {
        self.running_min = None;
        self.running_max = None;
        self.histogram.fill(0);
        self.batches_seen = 0;
    }
}

impl Default for Observer {
    fn default() -> Self {
        Self::new(ObserverMethod::default())
    }
}

/// Quantization state attached to one module node.
///
/// Lifetime is bound to the host module; the config applier attaches it and
/// the calibration runner mutates it in place. A module counts as quantized
/// iff it holds this state.
#[derive(Clone, Debug)]
pub struct ModuleQuantizationState {
    /// Scheme assigned by the matching config group
    pub scheme: QuantizationScheme,
    /// Whether the observer folds in new forward activations
    pub calibrating: bool,
    /// Whether observer updates are frozen
    pub frozen: bool,
    /// Running activation statistic
    pub observer: Observer,
}

impl ModuleQuantizationState {
    /// Attach fresh state for a scheme; observers start at defaults,
    /// calibration off.
    pub fn new(scheme: QuantizationScheme) -> Self {
        Self { scheme, calibrating: false, frozen: false, observer: Observer::default() }
    }

    /// Current scale/zero-point, once the observer has seen data.
    pub fn quantization_params(&self) -> Option<QuantizationParams> {
        self.observer.range().map(|(min, max)| self.scheme.params_from_range(min, max))
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Min-max observation only ever widens the range.
        #[test]
        fn min_max_is_monotone(
            batches in proptest::collection::vec(
                proptest::collection::vec(-100.0f32..100.0, 1..16),
                1..8,
            ),
        ) {
            let mut observer = Observer::default();
            let mut prev: Option<(f32, f32)> = None;
            for batch in &batches {
                observer.observe(batch);
                let (min, max) = observer.range().unwrap();
                if let Some((pmin, pmax)) = prev {
                    prop_assert!(min <= pmin);
                    prop_assert!(max >= pmax);
                }
                prev = Some((min, max));
            }
        }
    }
}
