use fxhash::FxHashMap;
use rand::{SeedableRng, rngs::SmallRng, seq::SliceRandom};
use rayon::prelude::*;
use tracing::{Level, debug, instrument, warn};

use crate::{
    problem::{ride_pooling_problem::RidePoolingProblem, rider::RiderIdx},
    solver::{
        allocation::AllocationEngine,
        completed_tour::CompletedTour,
        errors::SolverError,
        optimiser_params::OptimiserParams,
        stop::{Stop, StopIdx},
        tour::Tour,
    },
    voting::{Ballot, VotingRule, ranked_by_score},
};

/// Initialises a tour for a construction attempt: the seed rider's pick-up
/// waits at its start location until the preferred departure, and the
/// drop-off follows directly. A rider whose preferences are not physically
/// consistent (or whose trip starts where it ends) fails here and fails the
/// attempt.
pub(crate) fn seed_tour(
    problem: &RidePoolingProblem,
    rider_id: RiderIdx,
) -> Result<Tour, SolverError> {
    let rider = problem.rider(rider_id);
    let mut tour = Tour::new();

    let mut pick_up = Stop::new(rider.start(), 0, rider.optimal_departure())?;
    pick_up.add_pick_up(rider_id);
    tour.append(problem, pick_up)?;

    let arrival =
        rider.optimal_departure() + problem.travel_time(rider.start(), rider.destination());
    let mut drop_off = Stop::new(
        rider.destination(),
        arrival,
        rider.optimal_arrival() - arrival,
    )?;
    drop_off.add_drop_off(rider_id);
    tour.append(problem, drop_off)?;

    Ok(tour)
}

/// Drives independent construction attempts and picks one winner, either by
/// a configured objective or by letting the riders vote over the completed
/// tours. Each attempt owns a generator seeded with `base seed + attempt`,
/// so a fixed seed always reproduces the same tour regardless of how the
/// attempts are scheduled.
pub struct RestartOptimiser<'a> {
    problem: &'a RidePoolingProblem,
    params: OptimiserParams,
}

impl<'a> RestartOptimiser<'a> {
    pub fn new(problem: &'a RidePoolingProblem, params: OptimiserParams) -> Self {
        RestartOptimiser { problem, params }
    }

    #[instrument(skip_all, level = Level::DEBUG)]
    pub fn optimise(&self) -> Result<CompletedTour, SolverError> {
        let num_riders = self.problem.num_riders();
        if num_riders == 0 {
            return Err(SolverError::AllAttemptsFailed { attempts: 0 });
        }

        let attempts = if self.params.multiple_restarts {
            num_riders
        } else {
            1
        };

        let results: Vec<Result<CompletedTour, SolverError>> = (0..attempts)
            .into_par_iter()
            .map(|attempt| self.run_attempt(attempt))
            .collect();

        let mut completed = Vec::new();
        for (attempt, result) in results.into_iter().enumerate() {
            match result {
                Ok(tour) => completed.push(tour),
                Err(error) => warn!(attempt, %error, "construction attempt discarded"),
            }
        }

        if completed.is_empty() {
            return Err(SolverError::AllAttemptsFailed { attempts });
        }
        debug!(
            completed = completed.len(),
            attempts, "selecting the final tour"
        );

        match self.params.final_voting_rule {
            Some(rule) => Ok(self.select_by_vote(completed, rule, attempts)),
            None => Ok(self.select_by_objective(completed)),
        }
    }

    /// One independent construction run: seed one rider, commit every other
    /// rider's pick-up in shuffled order, then their drop-offs in reverse.
    fn run_attempt(&self, attempt: usize) -> Result<CompletedTour, SolverError> {
        let seed = self.params.seed.wrapping_add(attempt as u64);
        let mut rng = SmallRng::seed_from_u64(seed);

        let seed_rider = RiderIdx::new(attempt % self.problem.num_riders());
        let mut others: Vec<RiderIdx> = self
            .problem
            .rider_indices()
            .filter(|&rider| rider != seed_rider)
            .collect();
        others.shuffle(&mut rng);

        let mut tour = seed_tour(self.problem, seed_rider)?;
        let engine = AllocationEngine::new(self.problem, self.params.allocation_strategy);

        let mut departure_stops: FxHashMap<RiderIdx, StopIdx> = FxHashMap::default();
        for &rider in &others {
            let stop = engine.allocate(&mut tour, rider, None, &mut rng)?;
            departure_stops.insert(rider, stop);
        }
        for &rider in others.iter().rev() {
            engine.allocate(&mut tour, rider, Some(departure_stops[&rider]), &mut rng)?;
        }

        CompletedTour::new(self.problem, tour, seed).map_err(SolverError::from)
    }

    /// Ties keep the earliest attempt, which keeps selection deterministic.
    fn select_by_objective(&self, mut completed: Vec<CompletedTour>) -> CompletedTour {
        let key = self.params.objective;

        let mut best = 0;
        for index in 1..completed.len() {
            if key.better(
                completed[index].objectives().get(key),
                completed[best].objectives().get(key),
            ) {
                best = index;
            }
        }

        completed.swap_remove(best)
    }

    /// Every rider ranks the completed tours by their own realized utility;
    /// the configured rule elects the winner.
    fn select_by_vote(
        &self,
        mut completed: Vec<CompletedTour>,
        rule: VotingRule,
        attempts: usize,
    ) -> CompletedTour {
        // Seeded past the attempt seeds so the election has its own stream.
        let mut rng = SmallRng::seed_from_u64(self.params.seed.wrapping_add(attempts as u64));

        let ballots: Vec<Ballot> = self
            .problem
            .riders()
            .iter()
            .enumerate()
            .map(|(index, rider)| {
                let rider_id = RiderIdx::new(index);
                let scores: Vec<f64> = completed
                    .iter()
                    .map(|tour| tour.utility_of(rider_id))
                    .collect();
                Ballot::weighted(ranked_by_score(&scores, &mut rng), rider.voting_weight())
            })
            .collect();

        let winner = rule.elect(completed.len(), &ballots, &mut rng).unwrap_or(0);
        completed.swap_remove(winner)
    }
}
