use rand::Rng;

/// Picks one of `indices` by softmax over `score_fn`, grounded on the
/// teacher's `ParetoFrontier::sample_proportional_to_coverage` weighted-draw
/// pattern (`rand::thread_rng().gen_range` over a running total), generalized
/// from coverage counts to softmax weights over arbitrary scores.
///
/// `temperature == 0.0` is deterministic argmax, ties broken by the lowest
/// index — not a degenerate softmax limit computed numerically, since that
/// would be sensitive to floating-point error right where determinism
/// matters most (spec §4.3).
///
/// Panics if `indices` is empty; callers are expected to have already
/// established a non-empty candidate set.
pub fn softmax_select<R: Rng + ?Sized>(
    indices: &[usize],
    score_fn: impl Fn(usize) -> f32,
    temperature: f32,
    rng: &mut R,
) -> usize {
    assert!(!indices.is_empty(), "softmax_select requires a non-empty candidate set");

    if temperature <= 0.0 {
        let mut best = indices[0];
        let mut best_score = score_fn(best);
        for &idx in &indices[1..] {
            let score = score_fn(idx);
            if score > best_score {
                best = idx;
                best_score = score;
            }
        }
        return best;
    }

    let scores: Vec<f32> = indices.iter().map(|&i| score_fn(i)).collect();
    let max_score = scores.iter().cloned().fold(f32::MIN, f32::max);

    let weights: Vec<f32> = scores
        .iter()
        .map(|&s| ((s - max_score) / temperature).exp())
        .collect();
    let total: f32 = weights.iter().sum();

    if total <= 0.0 || !total.is_finite() {
        return indices[0];
    }

    let mut target = rng.gen_range(0.0..total);
    for (&idx, &weight) in indices.iter().zip(weights.iter()) {
        if target < weight {
            return idx;
        }
        target -= weight;
    }

    *indices.last().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn zero_temperature_is_deterministic_argmax() {
        let indices = vec![0, 1, 2];
        let scores = [0.1, 0.9, 0.9];
        let mut rng = StepRng::new(0, 1);
        let selected = softmax_select(&indices, |i| scores[i], 0.0, &mut rng);
        assert_eq!(selected, 1, "ties broken by lowest index among the max scorers");
    }

    #[test]
    fn higher_score_is_selected_more_often_at_low_temperature() {
        let indices = vec![0, 1];
        let scores = [0.0, 10.0];
        let mut rng = rand::thread_rng();
        let mut high_count = 0;
        for _ in 0..200 {
            if softmax_select(&indices, |i| scores[i], 0.5, &mut rng) == 1 {
                high_count += 1;
            }
        }
        assert!(high_count > 180);
    }
}
