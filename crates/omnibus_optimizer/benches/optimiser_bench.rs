use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use omnibus_optimizer::{
    problem::{
        location::Location,
        ride_pooling_problem::{RidePoolingProblem, RidePoolingProblemBuilder},
        rider::{Rider, RiderBuilder},
        travel_time_matrix::TravelTimes,
    },
    solver::{optimiser::RestartOptimiser, optimiser_params::OptimiserParams},
};

/// Deterministic synthetic instance: locations on a 3x4-spaced grid, riders
/// with consistent preferences spread over a half-day horizon.
fn build_problem(num_locations: usize, num_riders: usize) -> RidePoolingProblem {
    let locations: Vec<Location> = (0..num_locations)
        .map(|i| Location::from_cartesian((i % 8) as f64 * 3.0, (i / 8) as f64 * 4.0))
        .collect();
    let travel_times = TravelTimes::from_euclidean(&locations, 1.0);

    let riders: Vec<Rider> = (0..num_riders)
        .map(|i| {
            let start = i % num_locations;
            let destination = (i * 7 + 3) % num_locations;
            let departure = (i as i64 * 37) % 720;
            let direct = travel_times.travel_time(start.into(), destination.into());

            let mut builder = RiderBuilder::default();
            builder.set_external_id(format!("rider_{i}"));
            builder.set_start(start);
            builder.set_destination(destination);
            builder.set_optimal_departure(departure);
            builder.set_optimal_arrival(departure + direct);
            builder.set_beta(0.6);
            builder.build()
        })
        .collect();

    let mut builder = RidePoolingProblemBuilder::default();
    builder.set_travel_times(travel_times);
    builder.set_riders(riders);
    builder.build()
}

fn optimiser_benchmark(c: &mut Criterion) {
    let problem = build_problem(16, 12);

    c.bench_function("restart optimise, 12 riders x 12 attempts", |b| {
        b.iter(|| {
            let optimiser =
                RestartOptimiser::new(black_box(&problem), OptimiserParams::default());
            optimiser.optimise().unwrap()
        })
    });

    let large = build_problem(16, 40);
    c.bench_function("single attempt, 40 riders", |b| {
        b.iter(|| {
            let optimiser = RestartOptimiser::new(
                black_box(&large),
                OptimiserParams {
                    multiple_restarts: false,
                    ..OptimiserParams::default()
                },
            );
            optimiser.optimise().unwrap()
        })
    });
}

criterion_group!(benches, optimiser_benchmark);
criterion_main!(benches);
