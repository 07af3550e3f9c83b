use fxhash::FxHashSet;

use super::{
    location::LocationIdx,
    rider::{Rider, RiderIdx},
    travel_time_matrix::{Time, TravelTimes},
};

/// The immutable problem description: the rider set and the travel times
/// between every location a rider can reference. Travel time generation and
/// rider preference generation live upstream; the solver only reads this.
pub struct RidePoolingProblem {
    riders: Vec<Rider>,
    travel_times: TravelTimes,
}

impl RidePoolingProblem {
    pub fn riders(&self) -> &[Rider] {
        &self.riders
    }

    pub fn rider(&self, rider_id: RiderIdx) -> &Rider {
        &self.riders[rider_id]
    }

    pub fn num_riders(&self) -> usize {
        self.riders.len()
    }

    pub fn rider_indices(&self) -> impl Iterator<Item = RiderIdx> + '_ {
        (0..self.riders.len()).map(RiderIdx::new)
    }

    pub fn travel_time(&self, from: LocationIdx, to: LocationIdx) -> Time {
        self.travel_times.travel_time(from, to)
    }
}

#[derive(Default)]
pub struct RidePoolingProblemBuilder {
    riders: Vec<Rider>,
    travel_times: Option<TravelTimes>,
}

impl RidePoolingProblemBuilder {
    pub fn set_travel_times(&mut self, travel_times: TravelTimes) -> &mut RidePoolingProblemBuilder {
        self.travel_times = Some(travel_times);
        self
    }

    pub fn set_riders(&mut self, riders: Vec<Rider>) -> &mut RidePoolingProblemBuilder {
        self.riders = riders;
        self
    }

    pub fn add_rider(&mut self, rider: Rider) -> &mut RidePoolingProblemBuilder {
        self.riders.push(rider);
        self
    }

    pub fn build(self) -> RidePoolingProblem {
        let travel_times = self.travel_times.expect("Travel times are required");

        let mut external_ids = FxHashSet::default();
        for rider in &self.riders {
            if rider.start().get() >= travel_times.num_locations()
                || rider.destination().get() >= travel_times.num_locations()
            {
                panic!("Rider location out of bounds");
            }
            if !external_ids.insert(rider.external_id().to_owned()) {
                panic!("Duplicate rider external ID {}", rider.external_id());
            }
        }

        RidePoolingProblem {
            riders: self.riders,
            travel_times,
        }
    }
}
