/// Which acquisition function drives candidate selection (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    ExpectedImprovement,
    UpperConfidenceBound,
    ProbabilityOfImprovement,
}

/// Abramowitz & Stegun formula 7.1.26, accurate to ~1.5e-7 — good enough for
/// an acquisition function that's only ever used to rank candidates, not to
/// certify a probability.
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();

    sign * y
}

fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

fn normal_pdf(z: f64) -> f64 {
    (-0.5 * z * z).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

/// `xi` is the minimum improvement margin worth exploring for — a small
/// positive value biases against negligible gains.
pub fn expected_improvement(mean: f64, std_dev: f64, best_observed: f64, xi: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    let z = (mean - best_observed - xi) / std_dev;
    let improvement = (mean - best_observed - xi) * normal_cdf(z) + std_dev * normal_pdf(z);
    improvement.max(0.0)
}

/// `kappa` (the spec's `exploration_weight`, default `2.0`) trades mean
/// against uncertainty linearly, unlike EI/PI's probabilistic weighting.
pub fn upper_confidence_bound(mean: f64, std_dev: f64, kappa: f64) -> f64 {
    mean + kappa * std_dev
}

pub fn probability_of_improvement(mean: f64, std_dev: f64, best_observed: f64, xi: f64) -> f64 {
    if std_dev <= 0.0 {
        return if mean > best_observed + xi { 1.0 } else { 0.0 };
    }
    let z = (mean - best_observed - xi) / std_dev;
    normal_cdf(z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_improvement_is_zero_with_zero_variance() {
        assert_eq!(expected_improvement(0.9, 0.0, 0.5, 0.01), 0.0);
    }

    #[test]
    fn expected_improvement_grows_with_mean_above_best() {
        let low = expected_improvement(0.5, 0.2, 0.5, 0.01);
        let high = expected_improvement(0.9, 0.2, 0.5, 0.01);
        assert!(high > low);
    }

    #[test]
    fn ucb_reduces_to_mean_with_zero_kappa() {
        assert_eq!(upper_confidence_bound(0.7, 0.3, 0.0), 0.7);
    }

    #[test]
    fn probability_of_improvement_is_bounded() {
        let p = probability_of_improvement(0.6, 0.1, 0.5, 0.0);
        assert!((0.0..=1.0).contains(&p));
    }
}
