use crate::error::DomainError;
use serde::{Deserialize, Serialize};

/// Per-dimension search box `[min[j], max[j]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl Bounds {
    pub fn new(min: Vec<f64>, max: Vec<f64>) -> Result<Self, DomainError> {
        if min.is_empty() {
            return Err(DomainError::InvalidBounds(
                "at least one dimension is required".into(),
            ));
        }
        if min.len() != max.len() {
            return Err(DomainError::DimensionMismatch {
                expected: min.len(),
                actual: max.len(),
            });
        }
        for (j, (lo, hi)) in min.iter().zip(&max).enumerate() {
            if !lo.is_finite() || !hi.is_finite() || lo >= hi {
                return Err(DomainError::InvalidBounds(format!(
                    "dimension {} has [{}, {}]",
                    j, lo, hi
                )));
            }
        }
        Ok(Self { min, max })
    }

    /// The same interval for every one of `n_var` dimensions.
    pub fn uniform(n_var: usize, min: f64, max: f64) -> Result<Self, DomainError> {
        Self::new(vec![min; n_var], vec![max; n_var])
    }

    pub fn dims(&self) -> usize {
        self.min.len()
    }

    pub fn min(&self) -> &[f64] {
        &self.min
    }

    pub fn max(&self) -> &[f64] {
        &self.max
    }

    pub fn clamp(&self, position: &mut [f64]) {
        for (x, (lo, hi)) in position.iter_mut().zip(self.min.iter().zip(&self.max)) {
            *x = x.clamp(*lo, *hi);
        }
    }

    pub fn contains(&self, position: &[f64]) -> bool {
        position.len() == self.dims()
            && position
                .iter()
                .zip(self.min.iter().zip(&self.max))
                .all(|(x, (lo, hi))| x >= lo && x <= hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_pins_to_edges() {
        let bounds = Bounds::new(vec![-1.0, 0.0], vec![1.0, 10.0]).unwrap();
        let mut pos = vec![-3.0, 12.5];
        bounds.clamp(&mut pos);
        assert_eq!(pos, vec![-1.0, 10.0]);
        assert!(bounds.contains(&pos));
    }

    #[test]
    fn test_rejects_inverted_interval() {
        assert!(matches!(
            Bounds::new(vec![1.0], vec![1.0]),
            Err(DomainError::InvalidBounds(_))
        ));
        assert!(matches!(
            Bounds::new(vec![0.0, 0.0], vec![1.0]),
            Err(DomainError::DimensionMismatch { .. })
        ));
    }
}
