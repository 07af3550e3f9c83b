use thiserror::Error;

use crate::problem::{rider::RiderIdx, travel_time_matrix::Time};

/// Violations of the tour's structural and temporal invariants. All of these
/// are fatal for the construction attempt that triggered them; the attempt is
/// discarded rather than patched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TourError {
    #[error("invalid insert: {0}")]
    InvalidInsert(String),

    #[error("negative time while placing a stop: arrival {arrival}, wait {wait}")]
    WaitTime { arrival: Time, wait: Time },

    #[error("tour constraint violated: {0}")]
    ConstraintViolation(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    /// The allocation engine was asked to create a stop at a position the
    /// feasibility checker rejects. Unreachable when candidates come from
    /// `valid_candidates`.
    #[error("requested stop creation at an infeasible position for rider {rider}")]
    CreateStop { rider: RiderIdx },

    #[error("no feasible insertion for rider {rider}")]
    UnallocatableRider { rider: RiderIdx },

    #[error("all {attempts} construction attempts failed")]
    AllAttemptsFailed { attempts: usize },

    #[error(transparent)]
    Tour(#[from] TourError),
}
