use crate::error::{HiveError, HiveResult};
use crate::optimizer::evaluation::{Evaluation, EvaluationPool, ObjectiveEvaluator};
use crate::optimizer::history::{mean, IterationRecord, PhaseTally, RunHistory};
use crate::optimizer::population::{Bee, Population};
use crate::optimizer::sampler::RandomSampler;
use crate::optimizer::selection::SelectionSampler;
use crate::optimizer::Hyperparameters;
use std::sync::Arc;
use tracing::debug;

/// Everything that changes from one iteration to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct ColonyState {
    /// Number of completed iterations.
    pub iteration: usize,
    pub population: Population,
    /// Lowest-cost bee ever observed (a copy, never a slot reference).
    pub best: Bee,
    pub history: RunHistory,
}

/// Runs the employed, onlooker, scout and statistics phases. Random draws
/// are all made here on the calling thread; only objective calls fan out to
/// the pool.
pub struct PhaseEngine {
    params: Hyperparameters,
    pool: EvaluationPool,
    evaluator: Arc<dyn ObjectiveEvaluator>,
}

impl PhaseEngine {
    pub fn new(
        params: Hyperparameters,
        pool: EvaluationPool,
        evaluator: Arc<dyn ObjectiveEvaluator>,
    ) -> HiveResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            pool,
            evaluator,
        })
    }

    pub fn params(&self) -> &Hyperparameters {
        &self.params
    }

    pub fn pool(&self) -> &EvaluationPool {
        &self.pool
    }

    /// Evaluates a fresh random population. Iteration count starts at 0.
    pub fn initialize(&self, sampler: &mut RandomSampler) -> HiveResult<ColonyState> {
        let population = Population::initialize_random(
            self.params.n_pop,
            &self.params.bounds,
            sampler,
            &self.pool,
            self.evaluator.as_ref(),
        )?;
        let best = population.bee(population.best_index()).clone();

        Ok(ColonyState {
            iteration: 0,
            population,
            best,
            history: RunHistory::new(),
        })
    }

    /// Runs one full iteration against a working copy of the population and
    /// commits it only if every phase succeeds.
    pub fn iterate(
        &self,
        state: &mut ColonyState,
        sampler: &mut RandomSampler,
    ) -> HiveResult<IterationRecord> {
        let iteration = state.iteration + 1;
        let mut working = state.population.clone();

        let employed_accepted = self.employed_phase(&mut working, sampler)?;
        let onlooker_accepted = self.onlooker_phase(&mut working, sampler)?;
        let scout_count = self.scout_phase(&mut working, sampler)?;
        let tally = PhaseTally {
            employed_accepted,
            onlooker_accepted,
            scout_count,
        };

        let leader = working.bee(working.best_index());
        let best = if leader.cost < state.best.cost {
            leader.clone()
        } else {
            state.best.clone()
        };

        let record = IterationRecord::capture(iteration, &working, &best, tally);
        state.history.push(record.clone())?;
        state.population = working;
        state.best = best;
        state.iteration = iteration;

        debug!(
            "Iter {} | employed +{} | onlooker +{} | scouts {}",
            iteration, tally.employed_accepted, tally.onlooker_accepted, tally.scout_count
        );
        Ok(record)
    }

    /// Perturbs every slot against a random partner and greedily commits.
    /// Returns the number of accepted candidates.
    pub fn employed_phase(
        &self,
        population: &mut Population,
        sampler: &mut RandomSampler,
    ) -> HiveResult<usize> {
        let n = population.len();
        let mut candidates = Vec::with_capacity(n);
        for slot in 0..n {
            let partner = sampler.uniform_excluding(n, slot)?;
            candidates.push(self.perturb(population, slot, partner, sampler));
        }

        let evaluations = self.evaluate(&candidates)?;

        let mut accepted = 0;
        for (slot, (position, evaluation)) in candidates.into_iter().zip(evaluations).enumerate() {
            if population.commit_greedy(slot, Bee::new(position, evaluation)) {
                accepted += 1;
            }
        }
        Ok(accepted)
    }

    /// Roulette-selects `n_onlooker` source slots from the current costs,
    /// perturbs each, and commits in draw order. Several draws may hit the
    /// same slot; each later commit compares against the slot as left by the
    /// earlier ones.
    pub fn onlooker_phase(
        &self,
        population: &mut Population,
        sampler: &mut RandomSampler,
    ) -> HiveResult<usize> {
        let n = population.len();
        let costs = population.snapshot_costs();
        let selector = SelectionSampler::new(&costs, mean(&costs))?;

        let draws = self.params.n_onlooker;
        let mut sources = Vec::with_capacity(draws);
        let mut candidates = Vec::with_capacity(draws);
        for _ in 0..draws {
            let slot = selector.draw(sampler)?;
            let partner = sampler.uniform_excluding(n, slot)?;
            candidates.push(self.perturb(population, slot, partner, sampler));
            sources.push(slot);
        }

        let evaluations = self.evaluate(&candidates)?;

        let mut accepted = 0;
        for ((slot, position), evaluation) in sources.into_iter().zip(candidates).zip(evaluations) {
            if population.commit_greedy(slot, Bee::new(position, evaluation)) {
                accepted += 1;
            }
        }
        Ok(accepted)
    }

    /// Replaces every slot whose trial counter reached `L` with a fresh
    /// random bee, regardless of cost. Returns the number of scouts sent.
    pub fn scout_phase(
        &self,
        population: &mut Population,
        sampler: &mut RandomSampler,
    ) -> HiveResult<usize> {
        let stagnant = population.stagnant_slots(self.params.trial_limit);
        if stagnant.is_empty() {
            return Ok(0);
        }

        let positions: Vec<Vec<f64>> = stagnant
            .iter()
            .map(|_| sampler.uniform_in_box(&self.params.bounds))
            .collect();
        let evaluations = self.evaluate(&positions)?;

        for ((&slot, position), evaluation) in stagnant.iter().zip(positions).zip(evaluations) {
            population.replace(slot, Bee::new(position, evaluation));
        }
        Ok(stagnant.len())
    }

    /// `x + phi * (x - x_partner)` with `phi_j = a * U(-1, 1)` per coordinate,
    /// clamped to bounds.
    fn perturb(
        &self,
        population: &Population,
        slot: usize,
        partner: usize,
        sampler: &mut RandomSampler,
    ) -> Vec<f64> {
        let accel = self.params.accel;
        let current = &population.bee(slot).position;
        let other = &population.bee(partner).position;

        let mut candidate: Vec<f64> = current
            .iter()
            .zip(other)
            .map(|(&x, &y)| {
                let phi = accel * sampler.uniform(-1.0, 1.0);
                x + phi * (x - y)
            })
            .collect();
        self.params.bounds.clamp(&mut candidate);
        candidate
    }

    fn evaluate(&self, batch: &[Vec<f64>]) -> Result<Vec<Evaluation>, HiveError> {
        Ok(self.pool.evaluate_batch(self.evaluator.as_ref(), batch)?)
    }
}
