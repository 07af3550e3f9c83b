use geo::{Distance, Euclidean};

use crate::define_index_newtype;

define_index_newtype!(LocationIdx, Location);

/// A point in the plane, used when travel times are derived from geometry.
/// The solver itself only ever works with `LocationIdx`.
pub struct Location {
    point: geo::Point,
}

impl Location {
    pub fn from_cartesian(x: f64, y: f64) -> Self {
        Self {
            point: geo::Point::new(x, y),
        }
    }

    pub fn x(&self) -> f64 {
        self.point.x()
    }

    pub fn y(&self) -> f64 {
        self.point.y()
    }

    pub fn euclidean_distance(&self, to: &Location) -> f64 {
        Euclidean.distance(self.point, to.point)
    }
}
