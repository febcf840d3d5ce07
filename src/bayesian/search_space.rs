/// A point in the discrete configuration space: which instruction candidate
/// and which set of demo candidates a program variant uses (spec §4.5).
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub instruction_id: usize,
    pub demo_ids: Vec<usize>,
    /// Real-valued encoding of `(instruction_id, demo_ids)` the surrogate's
    /// RBF kernel operates on.
    pub features: Vec<f64>,
}

/// A scored configuration, recorded once its trajectory has been sampled
/// and scored.
#[derive(Debug, Clone)]
pub struct Observation {
    pub configuration: Configuration,
    pub score: f32,
}

impl Observation {
    pub fn new(configuration: Configuration, score: f32) -> Self {
        Self { configuration, score }
    }
}

/// Encodes `(instruction_id, demo_ids)` pairs into feature vectors.
///
/// Both axes are normalized into `[0, 1]` so the RBF kernel's single length
/// scale applies evenly across them: one coordinate for the instruction
/// identity, one for how many demos are attached, one for which demos
/// (mean normalized demo id) — enough to let nearby configurations (same
/// instruction, similar demo sets) read as nearby points.
pub struct SearchSpace {
    num_instructions: usize,
    max_demos: usize,
    num_demo_candidates: usize,
}

impl SearchSpace {
    pub fn new(num_instructions: usize, max_demos: usize, num_demo_candidates: usize) -> Self {
        Self {
            num_instructions: num_instructions.max(1),
            max_demos: max_demos.max(1),
            num_demo_candidates: num_demo_candidates.max(1),
        }
    }

    pub fn encode(&self, instruction_id: usize, demo_ids: Vec<usize>) -> Configuration {
        let instruction_feature = if self.num_instructions > 1 {
            instruction_id as f64 / (self.num_instructions - 1) as f64
        } else {
            0.0
        };
        let count_feature = demo_ids.len() as f64 / self.max_demos as f64;
        let identity_feature = if demo_ids.is_empty() {
            0.0
        } else {
            let sum: usize = demo_ids.iter().sum();
            (sum as f64 / demo_ids.len() as f64) / (self.num_demo_candidates.max(1) as f64 - 1.0).max(1.0)
        };

        Configuration {
            instruction_id,
            demo_ids,
            features: vec![instruction_feature, count_feature, identity_feature],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_is_stable_for_identical_inputs() {
        let space = SearchSpace::new(4, 4, 10);
        let a = space.encode(1, vec![2, 3]);
        let b = space.encode(1, vec![2, 3]);
        assert_eq!(a.features, b.features);
    }

    #[test]
    fn features_stay_within_unit_range() {
        let space = SearchSpace::new(4, 4, 10);
        let config = space.encode(3, vec![9, 9]);
        assert!(config.features.iter().all(|f| (0.0..=1.0).contains(f)));
    }
}
