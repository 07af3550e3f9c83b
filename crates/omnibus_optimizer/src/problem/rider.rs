use serde::Serialize;

use crate::define_index_newtype;

use super::{location::LocationIdx, travel_time_matrix::Time};

define_index_newtype!(RiderIdx, Rider);

/// A rider with a fixed trip and temporal preferences. Riders are immutable
/// once built; allocation state lives with the solver, not here.
#[derive(Serialize, Debug, Clone)]
pub struct Rider {
    external_id: String,
    start: LocationIdx,
    destination: LocationIdx,
    optimal_departure: Time,
    optimal_arrival: Time,
    /// Sensitivity to schedule deviation, in (0, 1). Higher values tolerate
    /// larger deviations from the preferred times.
    beta: f64,
    voting_weight: f64,
}

impl Rider {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn start(&self) -> LocationIdx {
        self.start
    }

    pub fn destination(&self) -> LocationIdx {
        self.destination
    }

    pub fn optimal_departure(&self) -> Time {
        self.optimal_departure
    }

    pub fn optimal_arrival(&self) -> Time {
        self.optimal_arrival
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn voting_weight(&self) -> f64 {
        self.voting_weight
    }

    /// `(beta^|opt_dep - dep| + beta^|opt_arr - arr|) / 2`. An unknown arrival
    /// contributes nothing, so a departure-only utility never exceeds 0.5.
    pub fn utility(&self, departure_time: Time, arrival_time: Option<Time>) -> f64 {
        let depart = self.decay(self.optimal_departure, departure_time);
        let arrive = arrival_time.map_or(0.0, |arrival| self.decay(self.optimal_arrival, arrival));

        (depart + arrive) / 2.0
    }

    pub fn departure_utility(&self, departure_time: Time) -> f64 {
        self.utility(departure_time, None)
    }

    /// The arrival-side counterpart of [`Rider::departure_utility`], used when
    /// ranking arrival candidates whose departure is someone else's concern.
    pub fn arrival_utility(&self, arrival_time: Time) -> f64 {
        self.decay(self.optimal_arrival, arrival_time) / 2.0
    }

    fn decay(&self, preferred: Time, actual: Time) -> f64 {
        self.beta.powi((preferred - actual).abs() as i32)
    }
}

#[derive(Default)]
pub struct RiderBuilder {
    external_id: Option<String>,
    start: Option<usize>,
    destination: Option<usize>,
    optimal_departure: Option<Time>,
    optimal_arrival: Option<Time>,
    beta: Option<f64>,
    voting_weight: Option<f64>,
}

impl RiderBuilder {
    pub fn set_external_id(&mut self, external_id: String) -> &mut RiderBuilder {
        self.external_id = Some(external_id);
        self
    }

    pub fn set_start(&mut self, start: usize) -> &mut RiderBuilder {
        self.start = Some(start);
        self
    }

    pub fn set_destination(&mut self, destination: usize) -> &mut RiderBuilder {
        self.destination = Some(destination);
        self
    }

    pub fn set_optimal_departure(&mut self, optimal_departure: Time) -> &mut RiderBuilder {
        self.optimal_departure = Some(optimal_departure);
        self
    }

    pub fn set_optimal_arrival(&mut self, optimal_arrival: Time) -> &mut RiderBuilder {
        self.optimal_arrival = Some(optimal_arrival);
        self
    }

    pub fn set_beta(&mut self, beta: f64) -> &mut RiderBuilder {
        self.beta = Some(beta);
        self
    }

    pub fn set_voting_weight(&mut self, voting_weight: f64) -> &mut RiderBuilder {
        self.voting_weight = Some(voting_weight);
        self
    }

    pub fn build(self) -> Rider {
        let beta = self.beta.expect("Rider beta is required");
        if !(0.0 < beta && beta < 1.0) {
            panic!("Rider beta must be in (0, 1)");
        }

        let voting_weight = self.voting_weight.unwrap_or(1.0);
        if voting_weight < 0.0 {
            panic!("Rider voting weight cannot be negative");
        }

        Rider {
            external_id: self.external_id.expect("Rider external ID is required"),
            start: self.start.expect("Rider start location is required").into(),
            destination: self
                .destination
                .expect("Rider destination location is required")
                .into(),
            optimal_departure: self
                .optimal_departure
                .expect("Rider optimal departure is required"),
            optimal_arrival: self
                .optimal_arrival
                .expect("Rider optimal arrival is required"),
            beta,
            voting_weight,
        }
    }
}
