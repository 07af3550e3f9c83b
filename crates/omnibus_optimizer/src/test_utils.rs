use crate::{
    problem::{
        ride_pooling_problem::{RidePoolingProblem, RidePoolingProblemBuilder},
        rider::{Rider, RiderBuilder, RiderIdx},
        travel_time_matrix::{Time, TravelTimes},
    },
    solver::{optimiser, tour::Tour},
};

pub fn rider(
    external_id: &str,
    start: usize,
    destination: usize,
    optimal_departure: Time,
    optimal_arrival: Time,
) -> Rider {
    let mut builder = RiderBuilder::default();
    builder.set_external_id(external_id.to_owned());
    builder.set_start(start);
    builder.set_destination(destination);
    builder.set_optimal_departure(optimal_departure);
    builder.set_optimal_arrival(optimal_arrival);
    builder.set_beta(0.5);
    builder.build()
}

pub fn constant_problem(
    num_locations: usize,
    travel_time: Time,
    riders: Vec<Rider>,
) -> RidePoolingProblem {
    let mut builder = RidePoolingProblemBuilder::default();
    builder.set_travel_times(TravelTimes::from_constant(num_locations, travel_time));
    builder.set_riders(riders);
    builder.build()
}

pub fn seed_tour(problem: &RidePoolingProblem, rider_id: RiderIdx) -> Tour {
    optimiser::seed_tour(problem, rider_id).unwrap()
}
