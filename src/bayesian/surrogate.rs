use super::search_space::Observation;

/// A kernel-weighted surrogate over observed scores — a Nadaraya-Watson
/// estimator rather than a full Gaussian process posterior (no Cholesky
/// solve, no hyperparameter fitting). Simple enough to stay numerically
/// well-behaved over the handful of observations a teleprompter run
/// actually collects, while still producing the `(mean, variance)` pair the
/// acquisition functions need (spec §4.5).
pub struct Surrogate {
    length_scale: f64,
    kernel_variance: f64,
    observations: Vec<Observation>,
}

impl Surrogate {
    pub fn new(length_scale: f64, kernel_variance: f64) -> Self {
        assert!(length_scale > 0.0, "surrogate length scale must be positive");
        assert!(kernel_variance > 0.0, "surrogate kernel variance must be positive");
        Self {
            length_scale,
            kernel_variance,
            observations: Vec::new(),
        }
    }

    pub fn update(&mut self, observations: Vec<Observation>) {
        self.observations = observations;
    }

    pub fn num_observations(&self) -> usize {
        self.observations.len()
    }

    fn kernel(&self, a: &[f64], b: &[f64]) -> f64 {
        let squared_distance: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
        (-squared_distance / (2.0 * self.length_scale.powi(2))).exp()
    }

    /// With no observations yet, returns a flat prior: mean 0, variance 1 —
    /// maximal uncertainty, so the acquisition function falls back to pure
    /// exploration (spec §4.5).
    ///
    /// Otherwise: `mean = Σ w_i·y_i` over kernel-normalized weights (falling
    /// back to uniform weights when every kernel value is ~0), and
    /// `variance = kernel_variance · (1 − max_i k_i)` — a proxy for distance
    /// from the nearest training point rather than a variance over the
    /// observed scores themselves, so it grows with distance from every
    /// observation regardless of how much those observations agree.
    pub fn predict(&self, features: &[f64]) -> (f64, f64) {
        if self.observations.is_empty() {
            return (0.0, 1.0);
        }

        let weights: Vec<f64> = self
            .observations
            .iter()
            .map(|obs| self.kernel(features, &obs.configuration.features))
            .collect();
        let total_weight: f64 = weights.iter().sum();
        let max_k = weights.iter().cloned().fold(0.0_f64, f64::max);

        let mean = if total_weight <= f64::EPSILON {
            self.observations.iter().map(|obs| obs.score as f64).sum::<f64>() / self.observations.len() as f64
        } else {
            weights
                .iter()
                .zip(&self.observations)
                .map(|(w, obs)| w * obs.score as f64)
                .sum::<f64>()
                / total_weight
        };

        let variance = (self.kernel_variance * (1.0 - max_k)).max(0.0);

        (mean, variance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bayesian::search_space::Configuration;

    fn config(features: Vec<f64>) -> Configuration {
        Configuration {
            instruction_id: 0,
            demo_ids: vec![],
            features,
        }
    }

    #[test]
    fn empty_surrogate_returns_flat_prior() {
        let surrogate = Surrogate::new(0.5, 1.0);
        let (mean, variance) = surrogate.predict(&[0.5, 0.5, 0.5]);
        assert_eq!(mean, 0.0);
        assert_eq!(variance, 1.0);
    }

    #[test]
    fn predicting_at_an_observed_point_is_close_to_its_score() {
        let mut surrogate = Surrogate::new(0.1, 1.0);
        surrogate.update(vec![Observation::new(config(vec![0.2, 0.2, 0.2]), 0.8)]);
        let (mean, _) = surrogate.predict(&[0.2, 0.2, 0.2]);
        assert!((mean - 0.8).abs() < 1e-6);
    }

    #[test]
    fn predicting_at_an_observed_point_has_near_zero_variance() {
        let mut surrogate = Surrogate::new(0.1, 1.0);
        surrogate.update(vec![Observation::new(config(vec![0.2, 0.2, 0.2]), 0.8)]);
        let (_, variance) = surrogate.predict(&[0.2, 0.2, 0.2]);
        assert!(variance.abs() < 1e-9);
    }

    #[test]
    fn variance_grows_with_distance_from_observations() {
        let mut surrogate = Surrogate::new(0.2, 1.0);
        surrogate.update(vec![Observation::new(config(vec![0.1, 0.1, 0.1]), 0.6)]);

        let (_, near_variance) = surrogate.predict(&[0.1, 0.1, 0.1]);
        let (_, far_variance) = surrogate.predict(&[0.9, 0.9, 0.9]);
        assert!(far_variance > near_variance);
    }

    #[test]
    fn zero_total_kernel_weight_falls_back_to_uniform_mean() {
        let mut surrogate = Surrogate::new(0.01, 1.0);
        surrogate.update(vec![
            Observation::new(config(vec![0.0, 0.0, 0.0]), 0.2),
            Observation::new(config(vec![1.0, 1.0, 1.0]), 0.8),
        ]);
        let (mean, _) = surrogate.predict(&[10.0, 10.0, 10.0]);
        assert!((mean - 0.5).abs() < 1e-6);
    }
}
