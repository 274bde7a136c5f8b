use crate::error::{DomainError, EvaluationError};
use crate::optimizer::bounds::Bounds;
use crate::optimizer::evaluation::{AuxMetrics, Evaluation, EvaluationPool, ObjectiveEvaluator};
use crate::optimizer::history::{mean, population_std};
use crate::optimizer::sampler::RandomSampler;
use serde::{Deserialize, Serialize};

/// One candidate solution. Position, cost and metrics always change together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bee {
    pub position: Vec<f64>,
    pub cost: f64,
    #[serde(default)]
    pub aux: AuxMetrics,
}

impl Bee {
    pub fn new(position: Vec<f64>, evaluation: Evaluation) -> Self {
        Self {
            position,
            cost: evaluation.cost,
            aux: evaluation.aux,
        }
    }
}

/// Fixed-size colony plus the per-slot trial counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    bees: Vec<Bee>,
    trials: Vec<usize>,
}

impl Population {
    pub fn from_parts(bees: Vec<Bee>, trials: Vec<usize>) -> Result<Self, DomainError> {
        if bees.is_empty() {
            return Err(DomainError::PopulationTooSmall(0));
        }
        if bees.len() != trials.len() {
            return Err(DomainError::DimensionMismatch {
                expected: bees.len(),
                actual: trials.len(),
            });
        }
        Ok(Self { bees, trials })
    }

    /// Draws `n_pop` positions uniformly in `bounds` on the control thread and
    /// evaluates them as one batch. All trial counters start at zero.
    pub fn initialize_random<E>(
        n_pop: usize,
        bounds: &Bounds,
        sampler: &mut RandomSampler,
        pool: &EvaluationPool,
        evaluator: &E,
    ) -> Result<Self, EvaluationError>
    where
        E: ObjectiveEvaluator + ?Sized,
    {
        let positions: Vec<Vec<f64>> = (0..n_pop).map(|_| sampler.uniform_in_box(bounds)).collect();
        let evaluations = pool.evaluate_batch(evaluator, &positions)?;

        let bees = positions
            .into_iter()
            .zip(evaluations)
            .map(|(p, e)| Bee::new(p, e))
            .collect();

        Ok(Self {
            bees,
            trials: vec![0; n_pop],
        })
    }

    pub fn len(&self) -> usize {
        self.bees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bees.is_empty()
    }

    pub fn bees(&self) -> &[Bee] {
        &self.bees
    }

    pub fn bee(&self, slot: usize) -> &Bee {
        &self.bees[slot]
    }

    pub fn trials(&self) -> &[usize] {
        &self.trials
    }

    /// Argmin over cost, ties broken by the lowest slot.
    pub fn best_index(&self) -> usize {
        let mut best = 0;
        for (i, bee) in self.bees.iter().enumerate().skip(1) {
            if bee.cost < self.bees[best].cost {
                best = i;
            }
        }
        best
    }

    pub fn snapshot_costs(&self) -> Vec<f64> {
        self.bees.iter().map(|b| b.cost).collect()
    }

    /// Greedy acceptance: the candidate replaces slot `slot` when its cost is
    /// lower than or equal to the incumbent's. Returns whether it was accepted.
    pub fn commit_greedy(&mut self, slot: usize, candidate: Bee) -> bool {
        if candidate.cost <= self.bees[slot].cost {
            self.bees[slot] = candidate;
            self.trials[slot] = 0;
            true
        } else {
            self.trials[slot] += 1;
            false
        }
    }

    /// Unconditional replacement used by scouts.
    pub fn replace(&mut self, slot: usize, bee: Bee) {
        self.bees[slot] = bee;
        self.trials[slot] = 0;
    }

    /// Slots whose trial counter reached `limit`, in ascending order.
    pub fn stagnant_slots(&self, limit: usize) -> Vec<usize> {
        self.trials
            .iter()
            .enumerate()
            .filter(|(_, t)| **t >= limit)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn mean_cost(&self) -> f64 {
        mean(&self.snapshot_costs())
    }

    pub fn std_cost(&self) -> f64 {
        population_std(&self.snapshot_costs())
    }

    /// Mean over dimensions of the per-dimension standard deviation of
    /// positions.
    pub fn diversity(&self) -> f64 {
        let dims = self.bees[0].position.len();
        if dims == 0 {
            return 0.0;
        }
        let mut column = Vec::with_capacity(self.bees.len());
        let mut total = 0.0;
        for j in 0..dims {
            column.clear();
            column.extend(self.bees.iter().map(|b| b.position[j]));
            total += population_std(&column);
        }
        total / dims as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bee(x: f64, cost: f64) -> Bee {
        Bee::new(vec![x], Evaluation::new(cost))
    }

    fn colony(costs: &[f64]) -> Population {
        let bees = costs.iter().map(|&c| bee(c, c)).collect();
        Population::from_parts(bees, vec![0; costs.len()]).unwrap()
    }

    #[test]
    fn test_best_index_prefers_lowest_slot_on_ties() {
        let pop = colony(&[3.0, 1.0, 2.0, 1.0]);
        assert_eq!(pop.best_index(), 1);
    }

    #[test]
    fn test_equal_cost_is_accepted() {
        let mut pop = colony(&[2.0, 5.0]);
        pop.trials[0] = 4;
        assert!(pop.commit_greedy(0, bee(9.0, 2.0)));
        assert_eq!(pop.bee(0).position, vec![9.0]);
        assert_eq!(pop.trials()[0], 0);
    }

    #[test]
    fn test_worse_candidate_bumps_trial() {
        let mut pop = colony(&[2.0, 5.0]);
        assert!(!pop.commit_greedy(1, bee(9.0, 5.5)));
        assert_eq!(pop.bee(1).cost, 5.0);
        assert_eq!(pop.trials(), &[0, 1]);
    }

    #[test]
    fn test_diversity_of_identical_positions_is_zero() {
        let pop = colony(&[1.0, 1.0, 1.0]);
        assert_eq!(pop.diversity(), 0.0);
    }

    #[test]
    fn test_from_parts_rejects_misaligned_counters() {
        assert!(Population::from_parts(vec![bee(0.0, 0.0)], vec![0, 0]).is_err());
        assert!(Population::from_parts(vec![], vec![]).is_err());
    }
}
