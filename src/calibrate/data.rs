//! Calibration batch types and synthetic data generation.

use rand::prelude::*;
use rand::rngs::StdRng;

/// One calibration batch of activation inputs.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    /// Input values fed through the model
    pub inputs: Vec<f32>,
}

impl Batch {
    /// Create a batch from input values.
    pub fn new(inputs: Vec<f32>) -> Self {
        Self { inputs }
    }

    /// Number of values in the batch.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Check whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// A source of calibration batches with possibly unknown length.
pub type BatchSource = Box<dyn Iterator<Item = Batch>>;

/// Seeded synthetic calibration batches for tests and examples.
#[derive(Clone, Copy, Debug)]
pub struct SyntheticBatches {
    num_batches: usize,
    batch_size: usize,
    seed: u64,
}

impl SyntheticBatches {
    /// Configure a synthetic source of `num_batches` batches of
    /// `batch_size` values each.
    pub fn new(num_batches: usize, batch_size: usize) -> Self {
        Self { num_batches, batch_size, seed: 42 }
    }

    /// Override the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Generate the batches, values uniform in [-1, 1).
    pub fn generate(&self) -> Vec<Batch> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        (0..self.num_batches)
            .map(|_| {
                let inputs =
                    (0..self.batch_size).map(|_| rng.random::<f32>() * 2.0 - 1.0).collect();
                Batch::new(inputs)
            })
            .collect()
    }

    /// Generate the batches as a boxed source.
    pub fn into_source(self) -> BatchSource {
        Box::new(self.generate().into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_len() {
        let batch = Batch::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(batch.len(), 3);
        assert!(!batch.is_empty());
    }

    #[test]
    fn test_synthetic_batches_are_deterministic() {
        let a = SyntheticBatches::new(4, 8).with_seed(7).generate();
        let b = SyntheticBatches::new(4, 8).with_seed(7).generate();
        assert_eq!(a, b);
        assert_eq!(a.len(), 4);
        assert!(a.iter().all(|batch| batch.len() == 8));
    }

    #[test]
    fn test_synthetic_values_in_range() {
        let batches = SyntheticBatches::new(2, 32).generate();
        for batch in &batches {
            assert!(batch.inputs.iter().all(|v| (-1.0..1.0).contains(v)));
        }
    }
}
