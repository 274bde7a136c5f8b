use crate::error::DomainError;
use crate::optimizer::sampler::RandomSampler;
use tracing::debug;

/// Onlooker source selection. Probabilities are fixed for the whole onlooker
/// phase so every draw in one iteration is made against the same wheel.
#[derive(Debug, Clone)]
pub struct SelectionSampler {
    probabilities: Vec<f64>,
}

impl SelectionSampler {
    pub fn new(costs: &[f64], mean_cost: f64) -> Result<Self, DomainError> {
        Ok(Self {
            probabilities: selection_probabilities(costs, mean_cost)?,
        })
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn draw(&self, sampler: &mut RandomSampler) -> Result<usize, DomainError> {
        sampler.roulette_draw(&self.probabilities)
    }
}

/// `P[i] = exp(-C[i]/mean) / sum_j exp(-C[j]/mean)`.
///
/// Exponents are shifted by their maximum before `exp`, which leaves the
/// ratios unchanged and keeps the weights finite. A zero or non-finite mean
/// gives uniform probabilities.
pub fn selection_probabilities(costs: &[f64], mean_cost: f64) -> Result<Vec<f64>, DomainError> {
    if costs.is_empty() {
        return Err(DomainError::EmptyWeights);
    }
    let n = costs.len();
    let uniform = || vec![1.0 / n as f64; n];

    if mean_cost == 0.0 || !mean_cost.is_finite() {
        debug!("Selection mean cost is {}; using uniform wheel", mean_cost);
        return Ok(uniform());
    }

    let exponents: Vec<f64> = costs.iter().map(|&c| -c / mean_cost).collect();
    let peak = exponents.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !peak.is_finite() {
        return Ok(uniform());
    }

    let weights: Vec<f64> = exponents.iter().map(|&e| (e - peak).exp()).collect();
    let total: f64 = weights.iter().sum();

    Ok(weights.into_iter().map(|w| w / total).collect())
}
