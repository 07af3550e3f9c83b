use smallvec::SmallVec;

use crate::{
    define_index_newtype,
    problem::{location::LocationIdx, rider::RiderIdx, travel_time_matrix::Time},
    solver::errors::TourError,
};

define_index_newtype!(StopIdx, Stop);

/// One scheduled visit within a tour. A stop is created once; afterwards it
/// only grows rider memberships, and the owning tour may re-derive its
/// arrival/wait pair during repropagation. `departure = arrival + wait`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stop {
    location: LocationIdx,
    arrival_time: Time,
    wait_time: Time,
    pick_ups: SmallVec<[RiderIdx; 4]>,
    drop_offs: SmallVec<[RiderIdx; 4]>,
}

impl Stop {
    pub fn new(location: LocationIdx, arrival_time: Time, wait_time: Time) -> Result<Self, TourError> {
        if arrival_time < 0 || wait_time < 0 {
            return Err(TourError::WaitTime {
                arrival: arrival_time,
                wait: wait_time,
            });
        }

        Ok(Stop {
            location,
            arrival_time,
            wait_time,
            pick_ups: SmallVec::new(),
            drop_offs: SmallVec::new(),
        })
    }

    pub fn location(&self) -> LocationIdx {
        self.location
    }

    pub fn arrival_time(&self) -> Time {
        self.arrival_time
    }

    pub fn wait_time(&self) -> Time {
        self.wait_time
    }

    pub fn departure_time(&self) -> Time {
        self.arrival_time + self.wait_time
    }

    pub fn pick_ups(&self) -> &[RiderIdx] {
        &self.pick_ups
    }

    pub fn drop_offs(&self) -> &[RiderIdx] {
        &self.drop_offs
    }

    pub fn add_pick_up(&mut self, rider: RiderIdx) {
        self.pick_ups.push(rider);
    }

    pub fn add_drop_off(&mut self, rider: RiderIdx) {
        self.drop_offs.push(rider);
    }

    pub(super) fn set_times(&mut self, arrival_time: Time, wait_time: Time) {
        self.arrival_time = arrival_time;
        self.wait_time = wait_time;
    }
}
