pub mod location;
pub mod ride_pooling_problem;
pub mod rider;
pub mod travel_time_matrix;
