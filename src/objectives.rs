use crate::error::ObjectiveFailure;
use crate::optimizer::evaluation::{Evaluation, ObjectiveEvaluator};
use std::f64::consts::{E, PI};
use strum_macros::{Display, EnumIter, EnumString};

/// Standard continuous benchmark landscapes, all minimized.
#[derive(Debug, Clone, Copy, EnumIter, EnumString, Display, PartialEq, Eq, Hash)]
#[strum(serialize_all = "snake_case")]
pub enum BenchmarkFunction {
    Sphere,
    Rastrigin,
    Rosenbrock,
    Ackley,
    Griewank,
}

impl BenchmarkFunction {
    pub fn value(&self, x: &[f64]) -> f64 {
        match self {
            Self::Sphere => x.iter().map(|v| v * v).sum(),
            Self::Rastrigin => {
                10.0 * x.len() as f64
                    + x.iter()
                        .map(|v| v * v - 10.0 * (2.0 * PI * v).cos())
                        .sum::<f64>()
            }
            Self::Rosenbrock => x
                .windows(2)
                .map(|w| 100.0 * (w[1] - w[0] * w[0]).powi(2) + (1.0 - w[0]).powi(2))
                .sum(),
            Self::Ackley => {
                let n = x.len() as f64;
                let sq = x.iter().map(|v| v * v).sum::<f64>() / n;
                let cos = x.iter().map(|v| (2.0 * PI * v).cos()).sum::<f64>() / n;
                -20.0 * (-0.2 * sq.sqrt()).exp() - cos.exp() + 20.0 + E
            }
            Self::Griewank => {
                let sum = x.iter().map(|v| v * v).sum::<f64>() / 4000.0;
                let prod = x
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (v / ((i + 1) as f64).sqrt()).cos())
                    .product::<f64>();
                sum - prod + 1.0
            }
        }
    }

    /// Coordinate value of the global minimizer (the same in every dimension).
    pub fn optimum_coordinate(&self) -> f64 {
        match self {
            Self::Rosenbrock => 1.0,
            _ => 0.0,
        }
    }
}

/// Evaluator over a [`BenchmarkFunction`]. Reports `rms_error` and
/// `max_error`, the distance of the position from the known minimizer.
#[derive(Debug, Clone, Copy)]
pub struct BenchmarkObjective {
    function: BenchmarkFunction,
}

impl BenchmarkObjective {
    pub fn new(function: BenchmarkFunction) -> Self {
        Self { function }
    }

    pub fn function(&self) -> BenchmarkFunction {
        self.function
    }
}

impl ObjectiveEvaluator for BenchmarkObjective {
    fn evaluate(&self, position: &[f64]) -> Result<Evaluation, ObjectiveFailure> {
        if position.is_empty() {
            return Err(ObjectiveFailure::new("empty position"));
        }
        let target = self.function.optimum_coordinate();
        let errors: Vec<f64> = position.iter().map(|v| (v - target).abs()).collect();
        let rms = (errors.iter().map(|e| e * e).sum::<f64>() / errors.len() as f64).sqrt();
        let max = errors.iter().copied().fold(0.0, f64::max);

        Ok(Evaluation::new(self.function.value(position))
            .with_metric("rms_error", rms)
            .with_metric("max_error", max))
    }
}
