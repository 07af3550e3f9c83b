use std::fmt::Display;

use fxhash::FxHashMap;
use serde::Serialize;

use crate::{
    problem::{
        ride_pooling_problem::RidePoolingProblem, rider::RiderIdx, travel_time_matrix::Time,
    },
    solver::{errors::TourError, objectives::Objectives, tour::Tour},
};

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RiderSchedule {
    pub departure: Time,
    pub arrival: Time,
}

/// A construction attempt that reached the complete state: every rider
/// boards exactly once and alights exactly once. Carries the realized
/// per-rider schedule and the welfare summary derived from it.
#[derive(Debug)]
pub struct CompletedTour {
    tour: Tour,
    schedule: FxHashMap<RiderIdx, RiderSchedule>,
    utilities: Vec<f64>,
    objectives: Objectives,
    seed: u64,
}

impl CompletedTour {
    pub fn new(
        problem: &RidePoolingProblem,
        tour: Tour,
        seed: u64,
    ) -> Result<Self, TourError> {
        tour.check_constraint(problem, true)?;

        let mut departures: FxHashMap<RiderIdx, Time> = FxHashMap::default();
        let mut arrivals: FxHashMap<RiderIdx, Time> = FxHashMap::default();
        for (_, stop) in tour.iter() {
            for &rider in stop.pick_ups() {
                departures.insert(rider, stop.departure_time());
            }
            for &rider in stop.drop_offs() {
                arrivals.insert(rider, stop.arrival_time());
            }
        }

        // The complete constraint check above guarantees both entries exist.
        let schedule: FxHashMap<RiderIdx, RiderSchedule> = problem
            .rider_indices()
            .map(|rider| {
                (
                    rider,
                    RiderSchedule {
                        departure: departures[&rider],
                        arrival: arrivals[&rider],
                    },
                )
            })
            .collect();

        let utilities: Vec<f64> = problem
            .rider_indices()
            .map(|rider| {
                let times = schedule[&rider];
                problem
                    .rider(rider)
                    .utility(times.departure, Some(times.arrival))
            })
            .collect();
        let objectives = Objectives::from_utilities(&utilities);

        Ok(CompletedTour {
            tour,
            schedule,
            utilities,
            objectives,
            seed,
        })
    }

    pub fn tour(&self) -> &Tour {
        &self.tour
    }

    pub fn schedule(&self, rider: RiderIdx) -> RiderSchedule {
        self.schedule[&rider]
    }

    pub fn utility_of(&self, rider: RiderIdx) -> f64 {
        self.utilities[rider.get()]
    }

    pub fn utilities(&self) -> &[f64] {
        &self.utilities
    }

    pub fn objectives(&self) -> &Objectives {
        &self.objectives
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn summary(&self, problem: &RidePoolingProblem) -> TourSummary {
        let external_ids = |riders: &[RiderIdx]| -> Vec<String> {
            riders
                .iter()
                .map(|&rider| problem.rider(rider).external_id().to_owned())
                .collect()
        };

        let stops = self
            .tour
            .iter()
            .enumerate()
            .map(|(visit_order, (_, stop))| StopSummary {
                visit_order,
                location: stop.location().get(),
                arrival_time: stop.arrival_time(),
                wait_time: stop.wait_time(),
                departure_time: stop.departure_time(),
                pick_ups: external_ids(stop.pick_ups()),
                drop_offs: external_ids(stop.drop_offs()),
            })
            .collect();

        TourSummary {
            stops,
            objectives: self.objectives.clone(),
            seed: self.seed,
        }
    }
}

/// The outward-facing snapshot of a finished tour: the annotated visit list
/// plus the objective set. Serialization past this point (CSV, plots) is the
/// surrounding tooling's concern.
#[derive(Debug, Clone, Serialize)]
pub struct TourSummary {
    pub stops: Vec<StopSummary>,
    pub objectives: Objectives,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StopSummary {
    pub visit_order: usize,
    pub location: usize,
    pub arrival_time: Time,
    pub wait_time: Time,
    pub departure_time: Time,
    pub pick_ups: Vec<String>,
    pub drop_offs: Vec<String>,
}

impl Display for TourSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "visit | location | arrival | wait | departure | pick ups | drop offs")?;
        for stop in &self.stops {
            writeln!(
                f,
                "{:5} | {:8} | {:7} | {:4} | {:9} | {:?} | {:?}",
                stop.visit_order,
                stop.location,
                stop.arrival_time,
                stop.wait_time,
                stop.departure_time,
                stop.pick_ups,
                stop.drop_offs,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{problem::ride_pooling_problem::RidePoolingProblem, test_utils};

    use super::*;

    fn completed() -> (RidePoolingProblem, CompletedTour) {
        let problem = test_utils::constant_problem(
            3,
            10,
            vec![test_utils::rider("a", 1, 2, 0, 10)],
        );
        let tour = test_utils::seed_tour(&problem, RiderIdx::new(0));
        let completed = CompletedTour::new(&problem, tour, 42).unwrap();
        (problem, completed)
    }

    #[test]
    fn test_schedule_and_objectives() {
        let (_, completed) = completed();
        let times = completed.schedule(RiderIdx::new(0));

        assert_eq!(times.departure, 0);
        assert_eq!(times.arrival, 10);
        assert_eq!(completed.utility_of(RiderIdx::new(0)), 1.0);
        assert_eq!(completed.objectives().utilitarian, 1.0);
        assert_eq!(completed.seed(), 42);
    }

    #[test]
    fn test_incomplete_tour_rejected() {
        let problem = test_utils::constant_problem(
            3,
            10,
            vec![
                test_utils::rider("a", 1, 2, 0, 10),
                test_utils::rider("b", 2, 1, 10, 20),
            ],
        );
        let tour = test_utils::seed_tour(&problem, RiderIdx::new(0));

        // Rider "b" was never allocated.
        assert!(CompletedTour::new(&problem, tour, 0).is_err());
    }

    #[test]
    fn test_summary_serializes() {
        let (problem, completed) = completed();
        let summary = completed.summary(&problem);

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&summary).unwrap()).unwrap();
        assert_eq!(json["seed"], 42);
        assert_eq!(json["stops"][0]["pick_ups"][0], "a");
        assert_eq!(json["stops"][1]["arrival_time"], 10);
        assert_eq!(json["objectives"]["utilitarian"], 1.0);
    }

    #[test]
    fn test_summary_renders_visit_table() {
        let (problem, completed) = completed();
        let rendered = completed.summary(&problem).to_string();

        assert!(rendered.contains("visit | location"));
        assert!(rendered.lines().count() >= 3);
    }
}
