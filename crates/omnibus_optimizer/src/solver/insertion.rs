use crate::{
    problem::{
        location::LocationIdx, ride_pooling_problem::RidePoolingProblem,
        travel_time_matrix::Time,
    },
    solver::{
        errors::TourError,
        stop::{Stop, StopIdx},
        tour::Tour,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Before,
    After,
}

/// One way to serve a rider's pick-up or drop-off: join a stop that is
/// already on the route, or splice a new stop next to an anchor. Candidates
/// are plain plan values; nothing is mutated until one of them is committed.
#[derive(Debug, Clone)]
pub enum Candidate {
    Existing(StopIdx),
    NewStop {
        stop: Stop,
        anchor: StopIdx,
        position: InsertPosition,
    },
}

impl Candidate {
    pub fn arrival_time(&self, tour: &Tour) -> Time {
        match self {
            Candidate::Existing(index) => tour.stop(*index).arrival_time(),
            Candidate::NewStop { stop, .. } => stop.arrival_time(),
        }
    }

    pub fn departure_time(&self, tour: &Tour) -> Time {
        match self {
            Candidate::Existing(index) => tour.stop(*index).departure_time(),
            Candidate::NewStop { stop, .. } => stop.departure_time(),
        }
    }
}

/// The stops that would flank a new stop spliced at `anchor`/`position`.
fn neighbours(
    tour: &Tour,
    anchor: StopIdx,
    position: InsertPosition,
) -> (Option<StopIdx>, Option<StopIdx>) {
    match position {
        InsertPosition::Before => (tour.prev(anchor), Some(anchor)),
        InsertPosition::After => (Some(anchor), tour.next(anchor)),
    }
}

/// The complete feasibility contract for splicing `location` at the given
/// insertion point: neither neighbour may share the location, and the
/// downstream neighbour must still be reachable by its committed departure
/// time. With no downstream neighbour the tour can always be extended.
pub fn insertion_feasible(
    problem: &RidePoolingProblem,
    tour: &Tour,
    location: LocationIdx,
    anchor: StopIdx,
    position: InsertPosition,
) -> bool {
    let (left, right) = neighbours(tour, anchor, position);

    for neighbour in [left, right].into_iter().flatten() {
        if tour.stop(neighbour).location() == location {
            return false;
        }
    }

    match (left, right) {
        (_, None) => true,
        (None, Some(right)) => {
            let right_stop = tour.stop(right);
            // New head arrives at the epoch; the old head must still make its
            // committed departure.
            problem.travel_time(location, right_stop.location()) <= right_stop.departure_time()
        }
        (Some(left), Some(right)) => {
            let left_stop = tour.stop(left);
            let right_stop = tour.stop(right);

            let arrival =
                left_stop.departure_time() + problem.travel_time(left_stop.location(), location);
            let right_arrival = arrival + problem.travel_time(location, right_stop.location());
            right_arrival <= right_stop.departure_time()
        }
    }
}

/// Builds the stop value for a feasible insertion point. The stop waits
/// toward the rider's preferred time as far as the downstream neighbour's
/// committed departure allows, and never less than zero.
pub fn new_stop_value(
    problem: &RidePoolingProblem,
    tour: &Tour,
    location: LocationIdx,
    preferred_time: Time,
    anchor: StopIdx,
    position: InsertPosition,
) -> Result<Stop, TourError> {
    let (left, right) = neighbours(tour, anchor, position);

    let (arrival, wait) = match (left, right) {
        (None, Some(right)) => {
            let right_stop = tour.stop(right);
            let right_arrival = problem.travel_time(location, right_stop.location());
            let allowable_wait = right_stop.departure_time() - right_arrival;
            (0, allowable_wait.min(preferred_time))
        }
        (Some(left), None) => {
            let left_stop = tour.stop(left);
            let arrival =
                left_stop.departure_time() + problem.travel_time(left_stop.location(), location);
            (arrival, (preferred_time - arrival).max(0))
        }
        (Some(left), Some(right)) => {
            let left_stop = tour.stop(left);
            let right_stop = tour.stop(right);

            let arrival =
                left_stop.departure_time() + problem.travel_time(left_stop.location(), location);
            let right_arrival = arrival + problem.travel_time(location, right_stop.location());
            let allowable_delay = right_stop.departure_time() - right_arrival;
            (arrival, allowable_delay.min((preferred_time - arrival).max(0)))
        }
        (None, None) => (0, preferred_time.max(0)),
    };

    Stop::new(location, arrival, wait)
}

/// Scans forward from `start` (inclusive, head when `None`) and collects
/// every way to serve `target_location`: stops already visiting it, plus
/// every feasible new-stop insertion along the way. A `Before` scan also
/// probes after the tail, since the tour can always be extended.
pub fn valid_candidates(
    problem: &RidePoolingProblem,
    tour: &Tour,
    target_location: LocationIdx,
    preferred_time: Time,
    start: Option<StopIdx>,
    orientation: InsertPosition,
) -> Result<Vec<Candidate>, TourError> {
    let mut candidates = Vec::new();

    for (index, stop) in tour.iter_from(start) {
        if insertion_feasible(problem, tour, target_location, index, orientation) {
            candidates.push(Candidate::NewStop {
                stop: new_stop_value(
                    problem,
                    tour,
                    target_location,
                    preferred_time,
                    index,
                    orientation,
                )?,
                anchor: index,
                position: orientation,
            });
        } else if stop.location() == target_location {
            candidates.push(Candidate::Existing(index));
        }

        if orientation == InsertPosition::Before
            && tour.next(index).is_none()
            && insertion_feasible(problem, tour, target_location, index, InsertPosition::After)
        {
            candidates.push(Candidate::NewStop {
                stop: new_stop_value(
                    problem,
                    tour,
                    target_location,
                    preferred_time,
                    index,
                    InsertPosition::After,
                )?,
                anchor: index,
                position: InsertPosition::After,
            });
        }
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use crate::{problem::ride_pooling_problem::RidePoolingProblem, test_utils};

    use super::*;

    fn problem() -> RidePoolingProblem {
        test_utils::constant_problem(4, 10, vec![])
    }

    /// 0@0+10 -> 1@20+10 -> 2@40
    fn tour(problem: &RidePoolingProblem) -> Tour {
        let mut tour = Tour::new();
        tour.append(problem, Stop::new(LocationIdx::new(0), 0, 10).unwrap())
            .unwrap();
        tour.append(problem, Stop::new(LocationIdx::new(1), 20, 10).unwrap())
            .unwrap();
        tour.append(problem, Stop::new(LocationIdx::new(2), 40, 0).unwrap())
            .unwrap();
        tour
    }

    #[test]
    fn test_head_insert_feasibility_window() {
        let problem = problem();
        let tour = tour(&problem);
        let head = tour.head().unwrap();

        // Head departs at 10 and travel time is 10, so a new first stop just
        // makes it.
        assert!(insertion_feasible(
            &problem,
            &tour,
            LocationIdx::new(3),
            head,
            InsertPosition::Before
        ));

        let mut tight = Tour::new();
        tight
            .append(&problem, Stop::new(LocationIdx::new(0), 0, 5).unwrap())
            .unwrap();
        assert!(!insertion_feasible(
            &problem,
            &tight,
            LocationIdx::new(3),
            tight.head().unwrap(),
            InsertPosition::Before
        ));
    }

    #[test]
    fn test_tail_insert_always_time_feasible() {
        let problem = problem();
        let tour = tour(&problem);
        let tail = tour.tail().unwrap();

        assert!(insertion_feasible(
            &problem,
            &tour,
            LocationIdx::new(3),
            tail,
            InsertPosition::After
        ));
    }

    #[test]
    fn test_adjacency_rejected() {
        let problem = problem();
        let tour = tour(&problem);
        let second = tour.next(tour.head().unwrap()).unwrap();

        // Before the location-1 stop, a new location-1 stop would sit next to
        // itself; before it, location 0 collides with the head.
        assert!(!insertion_feasible(
            &problem,
            &tour,
            LocationIdx::new(1),
            second,
            InsertPosition::Before
        ));
        assert!(!insertion_feasible(
            &problem,
            &tour,
            LocationIdx::new(0),
            second,
            InsertPosition::Before
        ));
    }

    #[test]
    fn test_between_insert_departure_window() {
        let problem = problem();
        let tour = tour(&problem);
        let second = tour.next(tour.head().unwrap()).unwrap();

        // Between 0 (departs 10) and 1 (departs 30): arrive 20, next stop
        // re-arrives 30, exactly its committed departure.
        assert!(insertion_feasible(
            &problem,
            &tour,
            LocationIdx::new(3),
            second,
            InsertPosition::Before
        ));

        // Between 1 (departs 30) and 2 (departs 40): next stop would
        // re-arrive at 50, past its departure.
        assert!(!insertion_feasible(
            &problem,
            &tour,
            LocationIdx::new(3),
            second,
            InsertPosition::After
        ));
    }

    #[test]
    fn test_new_stop_waits_toward_preference_at_tail() {
        let problem = problem();
        let tour = tour(&problem);
        let tail = tour.tail().unwrap();

        let stop = new_stop_value(
            &problem,
            &tour,
            LocationIdx::new(3),
            65,
            tail,
            InsertPosition::After,
        )
        .unwrap();
        assert_eq!(stop.arrival_time(), 50);
        assert_eq!(stop.wait_time(), 15);

        // A preference in the past waits zero, never negative.
        let stop = new_stop_value(
            &problem,
            &tour,
            LocationIdx::new(3),
            5,
            tail,
            InsertPosition::After,
        )
        .unwrap();
        assert_eq!(stop.wait_time(), 0);
    }

    #[test]
    fn test_new_stop_between_respects_downstream_departure() {
        let problem = problem();
        let tour = tour(&problem);
        let second = tour.next(tour.head().unwrap()).unwrap();

        // Arrive 20; the next stop departs at 30 and re-arrives at 30 after
        // the insert, so no wait is allowed even though the rider wants 45.
        let stop = new_stop_value(
            &problem,
            &tour,
            LocationIdx::new(3),
            45,
            second,
            InsertPosition::Before,
        )
        .unwrap();
        assert_eq!(stop.arrival_time(), 20);
        assert_eq!(stop.wait_time(), 0);
    }

    #[test]
    fn test_new_stop_before_head_waits_within_slack() {
        let problem = problem();
        let mut tour = Tour::new();
        tour.append(&problem, Stop::new(LocationIdx::new(0), 0, 25).unwrap())
            .unwrap();

        // Old head departs at 25 and re-arrives at 10 after the insert,
        // leaving 15 minutes of slack; the rider would wait 20.
        let stop = new_stop_value(
            &problem,
            &tour,
            LocationIdx::new(3),
            20,
            tour.head().unwrap(),
            InsertPosition::Before,
        )
        .unwrap();
        assert_eq!(stop.arrival_time(), 0);
        assert_eq!(stop.wait_time(), 15);
    }

    #[test]
    fn test_valid_candidates_departure_scan() {
        let problem = problem();
        let tour = tour(&problem);

        // Target location 1 already sits on the tour at the second stop.
        // Before-head fits exactly into the head's departure window, the
        // second stop is joined rather than duplicated, before-tail collides
        // with the second stop, and the tail probe can always extend.
        let candidates = valid_candidates(
            &problem,
            &tour,
            LocationIdx::new(1),
            15,
            None,
            InsertPosition::Before,
        )
        .unwrap();

        assert_eq!(candidates.len(), 3);
        assert!(matches!(
            &candidates[0],
            Candidate::NewStop {
                stop,
                position: InsertPosition::Before,
                ..
            } if stop.arrival_time() == 0 && stop.wait_time() == 0
        ));
        assert!(matches!(
            candidates[1],
            Candidate::Existing(index) if tour.stop(index).location() == LocationIdx::new(1)
        ));
        assert!(matches!(
            candidates[2],
            Candidate::NewStop {
                position: InsertPosition::After,
                ..
            }
        ));
    }

    #[test]
    fn test_valid_candidates_scan_starts_at_given_stop() {
        let problem = problem();
        let tour = tour(&problem);
        let second = tour.next(tour.head().unwrap()).unwrap();

        let candidates = valid_candidates(
            &problem,
            &tour,
            LocationIdx::new(0),
            50,
            Some(second),
            InsertPosition::After,
        )
        .unwrap();

        // Only the after-tail position works: after the second stop, the tail
        // would re-arrive past its committed departure.
        assert_eq!(candidates.len(), 1);
        assert!(matches!(
            &candidates[0],
            Candidate::NewStop {
                stop,
                position: InsertPosition::After,
                ..
            } if stop.arrival_time() == 50 && stop.wait_time() == 0
        ));
    }
}
