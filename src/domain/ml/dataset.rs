use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Dense supervised dataset: one feature row per target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub rows: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

impl Dataset {
    pub fn new(rows: Vec<Vec<f64>>, targets: Vec<f64>) -> Self {
        debug_assert_eq!(rows.len(), targets.len());
        Self { rows, targets }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Shuffled train/validation split, reproducible for a given seed.
    /// The validation side gets `ceil(len * validation_fraction)` rows.
    pub fn split(&self, validation_fraction: f64, seed: u64) -> (Dataset, Dataset) {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let fraction = validation_fraction.clamp(0.0, 1.0);
        let validation_len = ((self.len() as f64) * fraction).ceil() as usize;
        let (validation_idx, train_idx) = indices.split_at(validation_len.min(self.len()));

        (self.select(train_idx), self.select(validation_idx))
    }

    fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
        }
    }
}
