// degree.rs - Truncated Poisson distribution over the number of neighbours

use crate::error::{IsingError, Result};
use rand::Rng;

/// P(degree = k) for k = 0 ..= k_max.
#[derive(Debug, Clone, PartialEq)]
pub struct DegreeDistribution {
    probs: Vec<f64>,
}

impl DegreeDistribution {
    /// Build a Poisson(λ) mass function truncated to `0..=max_degree` and
    /// renormalised. With `force_nonzero` the k = 0 mass is dropped before
    /// renormalising, so every site gets at least one neighbour.
    pub fn build(mean_degree: f64, max_degree: usize, force_nonzero: bool) -> Result<Self> {
        if !mean_degree.is_finite() || mean_degree < 0.0 {
            return Err(IsingError::invalid(
                "mean_degree",
                format!("must be a finite value >= 0, got {mean_degree}"),
            ));
        }

        // p[k] = p[k-1] * λ / k keeps clear of k! overflow
        let mut probs = Vec::with_capacity(max_degree + 1);
        probs.push((-mean_degree).exp());
        for k in 1..=max_degree {
            let prev = probs[k - 1];
            probs.push(prev * mean_degree / k as f64);
        }

        if force_nonzero {
            probs[0] = 0.0;
        }

        let total: f64 = probs.iter().sum();
        if !(total.is_finite() && total > 0.0) {
            return Err(IsingError::invalid(
                "mean_degree",
                format!(
                    "distribution over 0..={max_degree} (force_nonzero = {force_nonzero}) \
                     has no mass to normalise"
                ),
            ));
        }
        for p in &mut probs {
            *p /= total;
        }

        Ok(Self { probs })
    }

    /// Wrap explicit probabilities. They must be non-negative and sum to 1.
    pub fn from_probabilities(probs: Vec<f64>) -> Result<Self> {
        if probs.is_empty() {
            return Err(IsingError::invalid("probabilities", "empty distribution"));
        }
        if probs.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(IsingError::invalid("probabilities", "entries must be finite and >= 0"));
        }
        let total: f64 = probs.iter().sum();
        if (total - 1.0).abs() > 1e-9 {
            return Err(IsingError::invalid(
                "probabilities",
                format!("must sum to 1, got {total}"),
            ));
        }
        Ok(Self { probs })
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probs
    }

    pub fn max_degree(&self) -> usize {
        self.probs.len() - 1
    }

    /// Inverse-CDF lookup for a single uniform draw in [0, 1].
    pub fn sample_with(&self, uniform01: f64) -> Result<usize> {
        sample(&self.probs, uniform01)
    }

    pub fn sample(&self, rng: &mut impl Rng) -> Result<usize> {
        self.sample_with(rng.gen::<f64>())
    }
}

/// Largest gap between the cumulative mass and 1.0 attributed to rounding.
pub const ROUNDING_SLACK: f64 = 1e-12;

/// Return the first index whose cumulative mass exceeds `uniform01`.
///
/// A draw of 1.0, or one that falls in a rounding shortfall of at most
/// [`ROUNDING_SLACK`] below 1.0, lands in the last bin with nonzero mass.
pub fn sample(probs: &[f64], uniform01: f64) -> Result<usize> {
    let mut cumulative = 0.0;
    for (k, p) in probs.iter().enumerate() {
        cumulative += p;
        if cumulative > uniform01 {
            return Ok(k);
        }
    }
    if uniform01 >= 1.0 || cumulative >= 1.0 - ROUNDING_SLACK {
        if let Some(k) = probs.iter().rposition(|&p| p > 0.0) {
            return Ok(k);
        }
    }
    Err(IsingError::SamplingExhausted { draw: uniform01, total: cumulative })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_mean_puts_all_mass_on_zero() {
        let dist = DegreeDistribution::build(0.0, 4, false).unwrap();
        assert_eq!(dist.probabilities(), &[1.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn forced_nonzero_without_mass_is_rejected() {
        assert!(matches!(
            DegreeDistribution::build(0.0, 4, true),
            Err(IsingError::InvalidParameter { .. })
        ));
        assert!(DegreeDistribution::build(2.0, 0, true).is_err());
    }

    #[test]
    fn top_draw_skips_empty_tail() {
        let dist = DegreeDistribution::build(0.0, 4, false).unwrap();
        assert_eq!(dist.sample_with(1.0).unwrap(), 0);
        assert_eq!(sample(&[0.25, 0.75, 0.0, 0.0], 1.0).unwrap(), 1);
        assert!(sample(&[0.0, 0.0], 1.0).is_err());
    }
}
