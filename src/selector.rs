use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};

/// Turns a list of nonnegative weights into a probability distribution
///
/// A selector whose weights sum to zero is treated as uniform.
#[derive(Clone, Debug, Default)]
pub struct RandomSelector {
    weights: Vec<f64>,
    total: f64,
}

impl RandomSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, weight: f64) {
        debug_assert!(weight >= 0.0);
        self.weights.push(weight);
        self.total += weight;
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Normalized probability of the `index`-th added weight
    pub fn probability(&self, index: usize) -> f64 {
        if self.total > 0.0 {
            self.weights[index] / self.total
        } else {
            1.0 / self.weights.len() as f64
        }
    }

    /// Samples an index in proportion to its weight
    pub fn select<R: Rng>(&self, rng: &mut R) -> Option<usize> {
        if self.weights.is_empty() {
            return None;
        }
        if self.total > 0.0 {
            let dist = WeightedIndex::new(&self.weights).ok()?;
            Some(dist.sample(rng))
        } else {
            Some(rng.gen_range(0..self.weights.len()))
        }
    }
}
