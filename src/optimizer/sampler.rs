use crate::error::DomainError;
use crate::optimizer::bounds::Bounds;

/// The run's single random stream. Lives on the control thread; workers
/// never see it.
#[derive(Debug, Clone)]
pub struct RandomSampler {
    rng: fastrand::Rng,
}

impl RandomSampler {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = if let Some(s) = seed {
            fastrand::Rng::with_seed(s)
        } else {
            fastrand::Rng::new()
        };
        Self { rng }
    }

    /// Rebuilds a sampler from a state previously returned by [`state`].
    ///
    /// [`state`]: RandomSampler::state
    pub fn from_state(state: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(state),
        }
    }

    /// Current generator state. Restoring it continues the exact same stream.
    pub fn state(&self) -> u64 {
        self.rng.get_seed()
    }

    /// Uniform draw in `[lo, hi)`.
    #[inline(always)]
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.rng.f64() * (hi - lo)
    }

    pub fn uniform_in_box(&mut self, bounds: &Bounds) -> Vec<f64> {
        bounds
            .min()
            .iter()
            .zip(bounds.max())
            .map(|(&lo, &hi)| self.uniform(lo, hi))
            .collect()
    }

    /// Uniform over `{0..n-1} \ {exclude}`.
    pub fn uniform_excluding(&mut self, n: usize, exclude: usize) -> Result<usize, DomainError> {
        if n < 2 {
            return Err(DomainError::PopulationTooSmall(n));
        }
        if exclude >= n {
            return Err(DomainError::IndexOutOfRange {
                index: exclude,
                len: n,
            });
        }
        let k = self.rng.usize(0..n - 1);
        Ok(if k >= exclude { k + 1 } else { k })
    }

    /// Draws `i` with probability `weights[i] / sum(weights)`.
    pub fn roulette_draw(&mut self, weights: &[f64]) -> Result<usize, DomainError> {
        if weights.is_empty() {
            return Err(DomainError::EmptyWeights);
        }
        let mut total = 0.0;
        for (index, &value) in weights.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(DomainError::InvalidWeight { index, value });
            }
            total += value;
            // Finite weights can still overflow the running sum.
            if !total.is_finite() {
                return Err(DomainError::InvalidWeight { index, value });
            }
        }
        if total <= 0.0 {
            return Err(DomainError::ZeroWeights);
        }

        let target = self.rng.f64() * total;
        let mut current = 0.0;
        for (i, &w) in weights.iter().enumerate() {
            current += w;
            if current > target {
                return Ok(i);
            }
        }

        // Float rounding can leave `target` a hair above the final sum.
        Ok(weights.iter().rposition(|&w| w > 0.0).unwrap_or(0))
    }
}
