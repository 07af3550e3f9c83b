use serde::Deserialize;

use crate::{
    solver::{allocation::AllocationStrategy, objectives::ObjectiveKey},
    voting::VotingRule,
};

/// Knobs for one optimiser run. The same parameters and seed always
/// reproduce the same tour.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OptimiserParams {
    /// Scalar used to pick among completed restart attempts when no final
    /// voting rule is configured.
    pub objective: ObjectiveKey,

    /// Run one construction attempt per rider (each seeded with a different
    /// rider) instead of a single attempt.
    pub multiple_restarts: bool,

    /// When set, riders vote over the completed tours instead of the
    /// objective deciding.
    pub final_voting_rule: Option<VotingRule>,

    /// How each rider's insertion candidates are decided during
    /// construction.
    pub allocation_strategy: AllocationStrategy,

    /// Base seed; attempt `i` re-seeds its own generator with `seed + i`.
    pub seed: u64,
}

impl Default for OptimiserParams {
    fn default() -> Self {
        OptimiserParams {
            objective: ObjectiveKey::Utilitarian,
            multiple_restarts: true,
            final_voting_rule: None,
            allocation_strategy: AllocationStrategy::Greedy,
            seed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_defaults() {
        let params: OptimiserParams = serde_json::from_str("{}").unwrap();

        assert_eq!(params.objective, ObjectiveKey::Utilitarian);
        assert!(params.multiple_restarts);
        assert_eq!(params.final_voting_rule, None);
        assert_eq!(params.allocation_strategy, AllocationStrategy::Greedy);
    }

    #[test]
    fn test_deserialize_full_configuration() {
        let params: OptimiserParams = serde_json::from_str(
            r#"{
                "objective": "gini_index",
                "multiple_restarts": false,
                "final_voting_rule": "instant_runoff",
                "allocation_strategy": { "voted": "borda_count" },
                "seed": 7
            }"#,
        )
        .unwrap();

        assert_eq!(params.objective, ObjectiveKey::GiniIndex);
        assert!(!params.multiple_restarts);
        assert_eq!(params.final_voting_rule, Some(VotingRule::InstantRunoff));
        assert_eq!(
            params.allocation_strategy,
            AllocationStrategy::Voted(VotingRule::BordaCount)
        );
        assert_eq!(params.seed, 7);
    }
}
