use super::{Example, Trajectory};

/// An ordered, non-empty group of [`Trajectory`] values sharing an example
/// key, with aggregate score statistics cached at construction (spec §3).
///
/// `min_score <= avg_score <= max_score` and `max_to_min_gap == max_score -
/// min_score >= 0` hold for every `Bucket` by construction — there is no way
/// to build one that violates the invariant, since the stats are derived
/// once from the trajectories and never touched again.
#[derive(Debug, Clone)]
pub struct Bucket {
    trajectories: Vec<Trajectory>,
    pub max_score: f32,
    pub min_score: f32,
    pub avg_score: f32,
    pub max_to_min_gap: f32,
    pub max_to_avg_gap: f32,
    pub successful_count: usize,
    pub failed_count: usize,
}

impl Bucket {
    /// Returns `None` for an empty slice — a `Bucket` is non-empty by
    /// construction (spec §3).
    pub fn new(trajectories: Vec<Trajectory>) -> Option<Self> {
        if trajectories.is_empty() {
            return None;
        }

        let scores: Vec<f32> = trajectories.iter().map(|t| t.score).collect();
        let max_score = scores.iter().cloned().fold(f32::MIN, f32::max);
        let min_score = scores.iter().cloned().fold(f32::MAX, f32::min);
        let avg_score = scores.iter().sum::<f32>() / scores.len() as f32;
        let successful_count = trajectories.iter().filter(|t| t.success).count();
        let failed_count = trajectories.len() - successful_count;

        Some(Self {
            trajectories,
            max_score,
            min_score,
            avg_score,
            max_to_min_gap: max_score - min_score,
            max_to_avg_gap: max_score - avg_score,
            successful_count,
            failed_count,
        })
    }

    pub fn trajectories(&self) -> &[Trajectory] {
        &self.trajectories
    }

    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    pub fn is_empty(&self) -> bool {
        false // a Bucket is never empty by construction
    }

    pub fn example(&self) -> &Example {
        &self.trajectories[0].example
    }

    pub fn successful(&self) -> impl Iterator<Item = &Trajectory> {
        self.trajectories.iter().filter(|t| t.success)
    }

    pub fn failed(&self) -> impl Iterator<Item = &Trajectory> {
        self.trajectories.iter().filter(|t| !t.success)
    }

    /// The highest-scoring trajectory, ties broken by lowest duration
    /// (spec §4.4.1, `AppendDemo`).
    pub fn best(&self) -> Option<&Trajectory> {
        self.trajectories.iter().min_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.duration_ms.cmp(&b.duration_ms))
        })
    }
}

/// Groups trajectories by their example, dropping empty groups (spec §4.2).
/// Grouping uses structural equality on [`Example`], not pointer identity.
pub fn group_into_buckets(trajectories: Vec<Trajectory>) -> Vec<Bucket> {
    let mut groups: Vec<(Example, Vec<Trajectory>)> = Vec::new();

    for trajectory in trajectories {
        if let Some((_, group)) = groups
            .iter_mut()
            .find(|(example, _)| *example == trajectory.example)
        {
            group.push(trajectory);
        } else {
            let example = trajectory.example.clone();
            groups.push((example, vec![trajectory]));
        }
    }

    groups
        .into_iter()
        .filter_map(|(_, trajectories)| Bucket::new(trajectories))
        .collect()
}
