use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    problem::{ride_pooling_problem::RidePoolingProblem, rider::RiderIdx, travel_time_matrix::Time},
    solver::{
        errors::SolverError,
        insertion::{Candidate, InsertPosition, insertion_feasible, valid_candidates},
        stop::StopIdx,
        tour::Tour,
    },
    voting::{Ballot, VotingRule, ranked_by_score},
};

/// How a rider's winning candidate is chosen: by the rider's own utility, or
/// by a vote of the whole rider set over the candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStrategy {
    Greedy,
    Voted(VotingRule),
}

/// Commits one rider at a time into the tour: first the pick-up (searched
/// over the whole tour), then the drop-off (searched only from the committed
/// pick-up onward).
pub struct AllocationEngine<'a> {
    problem: &'a RidePoolingProblem,
    strategy: AllocationStrategy,
}

impl<'a> AllocationEngine<'a> {
    pub fn new(problem: &'a RidePoolingProblem, strategy: AllocationStrategy) -> Self {
        AllocationEngine { problem, strategy }
    }

    /// With no `departure_ref`, targets the rider's start location and
    /// preferred departure; otherwise targets the destination, scanning only
    /// from the committed pick-up stop onward. Returns the committed stop so
    /// the caller can chain the arrival search.
    pub fn allocate<R: Rng>(
        &self,
        tour: &mut Tour,
        rider_id: RiderIdx,
        departure_ref: Option<StopIdx>,
        rng: &mut R,
    ) -> Result<StopIdx, SolverError> {
        let rider = self.problem.rider(rider_id);

        let (target, preferred, orientation) = match departure_ref {
            None => (
                rider.start(),
                rider.optimal_departure(),
                InsertPosition::Before,
            ),
            Some(_) => (
                rider.destination(),
                rider.optimal_arrival(),
                InsertPosition::After,
            ),
        };

        let mut candidates = valid_candidates(
            self.problem,
            tour,
            target,
            preferred,
            departure_ref,
            orientation,
        )?;
        if candidates.is_empty() {
            return Err(SolverError::UnallocatableRider { rider: rider_id });
        }

        let fixed_departure =
            departure_ref.map(|departure| tour.stop(departure).departure_time());
        let winner = match self.strategy {
            AllocationStrategy::Greedy => {
                self.pick_greedy(tour, rider_id, &candidates, fixed_departure)
            }
            AllocationStrategy::Voted(rule) => self
                .pick_voted(tour, rule, &candidates, fixed_departure, rng)
                .unwrap_or(0),
        };

        let candidate = candidates.swap_remove(winner);
        self.commit(tour, rider_id, candidate, departure_ref.is_none())
    }

    /// First maximum wins: a deliberate, order-stable tie-break, unlike the
    /// randomized ties inside the voting rules.
    fn pick_greedy(
        &self,
        tour: &Tour,
        rider_id: RiderIdx,
        candidates: &[Candidate],
        fixed_departure: Option<Time>,
    ) -> usize {
        let rider = self.problem.rider(rider_id);

        let mut best = 0;
        let mut best_utility = f64::NEG_INFINITY;
        for (index, candidate) in candidates.iter().enumerate() {
            let utility = match fixed_departure {
                None => rider.utility(candidate.departure_time(tour), None),
                Some(departure) => rider.utility(departure, Some(candidate.arrival_time(tour))),
            };
            if utility > best_utility {
                best_utility = utility;
                best = index;
            }
        }

        best
    }

    /// Every rider ranks the candidate list from their own perspective and a
    /// voting rule elects the winner.
    fn pick_voted<R: Rng>(
        &self,
        tour: &Tour,
        rule: VotingRule,
        candidates: &[Candidate],
        fixed_departure: Option<Time>,
        rng: &mut R,
    ) -> Option<usize> {
        let ballots: Vec<Ballot> = self
            .problem
            .riders()
            .iter()
            .map(|voter| {
                let scores: Vec<f64> = candidates
                    .iter()
                    .map(|candidate| match fixed_departure {
                        None => voter.departure_utility(candidate.departure_time(tour)),
                        Some(_) => voter.arrival_utility(candidate.arrival_time(tour)),
                    })
                    .collect();
                Ballot::weighted(ranked_by_score(&scores, rng), voter.voting_weight())
            })
            .collect();

        rule.elect(candidates.len(), &ballots, rng)
    }

    fn commit(
        &self,
        tour: &mut Tour,
        rider_id: RiderIdx,
        candidate: Candidate,
        is_departure: bool,
    ) -> Result<StopIdx, SolverError> {
        match candidate {
            Candidate::Existing(index) => {
                if is_departure {
                    tour.add_pick_up(index, rider_id);
                } else {
                    tour.add_drop_off(index, rider_id);
                }
                Ok(index)
            }
            Candidate::NewStop {
                mut stop,
                anchor,
                position,
            } => {
                if !insertion_feasible(self.problem, tour, stop.location(), anchor, position) {
                    return Err(SolverError::CreateStop { rider: rider_id });
                }

                if is_departure {
                    stop.add_pick_up(rider_id);
                } else {
                    stop.add_drop_off(rider_id);
                }

                let index = match position {
                    InsertPosition::Before => tour.insert_before(self.problem, anchor, stop)?,
                    InsertPosition::After => tour.insert_after(self.problem, anchor, stop)?,
                };
                Ok(index)
            }
        }
    }
}
