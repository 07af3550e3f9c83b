use super::location::{Location, LocationIdx};

/// Model time in minutes. Times are relative (minute-of-day in the upstream
/// generators), so exact integer arithmetic keeps the tour invariants checkable
/// with plain equality.
pub type Time = i64;

/// Travel times between every pair of locations, stored as a flat
/// `num_locations x num_locations` matrix. Lookups are directed; a symmetric
/// input simply stores both directions.
pub struct TravelTimes {
    times: Vec<Time>,
    num_locations: usize,
}

impl TravelTimes {
    pub fn from_matrix(rows: Vec<Vec<Time>>) -> Self {
        let num_locations = rows.len();

        for row in &rows {
            if row.len() != num_locations {
                panic!("Travel time matrix must be square");
            }
            for &time in row {
                if time < 0 {
                    panic!("Travel times cannot be negative");
                }
            }
        }

        TravelTimes {
            times: rows.into_iter().flatten().collect(),
            num_locations,
        }
    }

    /// Derives travel times from straight-line distance at `avg_speed`
    /// (distance units per minute), rounded to whole minutes.
    pub fn from_euclidean(locations: &[Location], avg_speed: f64) -> Self {
        let num_locations = locations.len();
        let mut times = vec![0; num_locations * num_locations];

        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                times[i * num_locations + j] =
                    (from.euclidean_distance(to) / avg_speed).round() as Time;
            }
        }

        TravelTimes {
            times,
            num_locations,
        }
    }

    #[cfg(test)]
    pub fn from_constant(num_locations: usize, time: Time) -> Self {
        let mut times = vec![time; num_locations * num_locations];
        for i in 0..num_locations {
            times[i * num_locations + i] = 0;
        }

        TravelTimes {
            times,
            num_locations,
        }
    }

    #[inline(always)]
    fn index(&self, from: LocationIdx, to: LocationIdx) -> usize {
        from.get() * self.num_locations + to.get()
    }

    pub fn travel_time(&self, from: LocationIdx, to: LocationIdx) -> Time {
        self.times[self.index(from, to)]
    }

    pub fn num_locations(&self) -> usize {
        self.num_locations
    }
}
