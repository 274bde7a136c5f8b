use crate::error::DomainError;
use crate::optimizer::evaluation::AuxMetrics;
use crate::optimizer::population::{Bee, Population};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeeSnapshot {
    pub cost: f64,
    pub trials: usize,
    #[serde(default)]
    pub aux: AuxMetrics,
}

/// Summary of one completed iteration. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: usize,
    pub best_cost: f64,
    pub mean_cost: f64,
    pub std_cost: f64,
    pub diversity: f64,
    pub best_parameters: Vec<f64>,
    #[serde(default)]
    pub best_aux: AuxMetrics,
    pub bees: Vec<BeeSnapshot>,
    pub employed_accepted: usize,
    pub onlooker_accepted: usize,
    pub scout_count: usize,
}

/// Per-phase counters gathered while an iteration runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseTally {
    pub employed_accepted: usize,
    pub onlooker_accepted: usize,
    pub scout_count: usize,
}

impl IterationRecord {
    pub fn capture(iteration: usize, population: &Population, best: &Bee, tally: PhaseTally) -> Self {
        Self {
            iteration,
            best_cost: best.cost,
            mean_cost: population.mean_cost(),
            std_cost: population.std_cost(),
            diversity: population.diversity(),
            best_parameters: best.position.clone(),
            best_aux: best.aux.clone(),
            bees: population
                .bees()
                .iter()
                .zip(population.trials())
                .map(|(b, &trials)| BeeSnapshot {
                    cost: b.cost,
                    trials,
                    aux: b.aux.clone(),
                })
                .collect(),
            employed_accepted: tally.employed_accepted,
            onlooker_accepted: tally.onlooker_accepted,
            scout_count: tally.scout_count,
        }
    }
}

/// One record per completed iteration; `records()[t - 1]` is iteration `t`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunHistory {
    records: Vec<IterationRecord>,
}

impl RunHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the record for the next iteration. Anything other than
    /// iteration `len() + 1` is rejected.
    pub fn push(&mut self, record: IterationRecord) -> Result<(), DomainError> {
        let expected = self.records.len() + 1;
        if record.iteration != expected {
            return Err(DomainError::IndexOutOfRange {
                index: record.iteration,
                len: expected,
            });
        }
        self.records.push(record);
        Ok(())
    }

    pub fn records(&self) -> &[IterationRecord] {
        &self.records
    }

    pub fn get(&self, iteration: usize) -> Option<&IterationRecord> {
        iteration.checked_sub(1).and_then(|i| self.records.get(i))
    }

    pub fn last(&self) -> Option<&IterationRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn best_cost_trace(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.best_cost).collect()
    }

    /// True when every record is numbered consecutively from 1 and the best
    /// cost never increases.
    pub fn is_consistent(&self) -> bool {
        self.records
            .iter()
            .enumerate()
            .all(|(i, r)| r.iteration == i + 1)
            && self
                .records
                .windows(2)
                .all(|w| w[1].best_cost <= w[0].best_cost)
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population (divide by `n`) standard deviation.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}
