use fxhash::FxHashMap;

use crate::{
    problem::{
        location::LocationIdx, ride_pooling_problem::RidePoolingProblem, rider::RiderIdx,
        travel_time_matrix::Time,
    },
    solver::errors::TourError,
};

use super::stop::{Stop, StopIdx};

#[derive(Debug)]
struct StopNode {
    stop: Stop,
    prev: Option<StopIdx>,
    next: Option<StopIdx>,
}

/// The ordered visit sequence of the vehicle. Stops live in an arena indexed
/// by `StopIdx`; order is carried by `prev`/`next` links, so splicing never
/// moves a stop and indices stay stable for the lifetime of the tour.
///
/// Invariant: for consecutive stops `a -> b`,
/// `b.arrival == a.departure + travel_time(a.location, b.location)` and
/// `a.location != b.location`.
#[derive(Debug, Default)]
pub struct Tour {
    nodes: Vec<StopNode>,
    head: Option<StopIdx>,
    tail: Option<StopIdx>,
}

impl Tour {
    pub fn new() -> Self {
        Tour::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn head(&self) -> Option<StopIdx> {
        self.head
    }

    pub fn tail(&self) -> Option<StopIdx> {
        self.tail
    }

    pub fn stop(&self, index: StopIdx) -> &Stop {
        &self.nodes[index.get()].stop
    }

    pub fn next(&self, index: StopIdx) -> Option<StopIdx> {
        self.nodes[index.get()].next
    }

    pub fn prev(&self, index: StopIdx) -> Option<StopIdx> {
        self.nodes[index.get()].prev
    }

    pub fn add_pick_up(&mut self, index: StopIdx, rider: RiderIdx) {
        self.nodes[index.get()].stop.add_pick_up(rider);
    }

    pub fn add_drop_off(&mut self, index: StopIdx, rider: RiderIdx) {
        self.nodes[index.get()].stop.add_drop_off(rider);
    }

    /// Adds a stop at the tail. The stop's arrival must already be consistent
    /// with the tail's departure plus travel time (trivially true for the
    /// first stop).
    pub fn append(&mut self, problem: &RidePoolingProblem, stop: Stop) -> Result<StopIdx, TourError> {
        let Some(tail) = self.tail else {
            let index = self.push_node(stop, None, None);
            self.head = Some(index);
            self.tail = Some(index);
            return Ok(index);
        };

        let tail_stop = self.stop(tail);
        if tail_stop.location() == stop.location() {
            return Err(TourError::InvalidInsert(format!(
                "appended stop repeats tail location {}",
                stop.location()
            )));
        }

        let expected =
            tail_stop.departure_time() + problem.travel_time(tail_stop.location(), stop.location());
        if stop.arrival_time() != expected {
            return Err(TourError::InvalidInsert(format!(
                "appended arrival {} does not match derived arrival {}",
                stop.arrival_time(),
                expected
            )));
        }

        let index = self.push_node(stop, Some(tail), None);
        self.nodes[tail.get()].next = Some(index);
        self.tail = Some(index);
        Ok(index)
    }

    pub fn insert_before(
        &mut self,
        problem: &RidePoolingProblem,
        anchor: StopIdx,
        stop: Stop,
    ) -> Result<StopIdx, TourError> {
        let left = self.nodes[anchor.get()].prev;
        self.splice(problem, left, Some(anchor), stop)
    }

    pub fn insert_after(
        &mut self,
        problem: &RidePoolingProblem,
        anchor: StopIdx,
        stop: Stop,
    ) -> Result<StopIdx, TourError> {
        let right = self.nodes[anchor.get()].next;
        self.splice(problem, Some(anchor), right, stop)
    }

    fn splice(
        &mut self,
        problem: &RidePoolingProblem,
        left: Option<StopIdx>,
        right: Option<StopIdx>,
        stop: Stop,
    ) -> Result<StopIdx, TourError> {
        for neighbour in [left, right].into_iter().flatten() {
            if self.stop(neighbour).location() == stop.location() {
                return Err(TourError::InvalidInsert(format!(
                    "stop would be adjacent to identical location {}",
                    stop.location()
                )));
            }
        }

        let expected = match left {
            Some(left) => {
                let left_stop = self.stop(left);
                left_stop.departure_time()
                    + problem.travel_time(left_stop.location(), stop.location())
            }
            // A new head departs from rest; its arrival is the epoch.
            None => 0,
        };
        if stop.arrival_time() != expected {
            return Err(TourError::InvalidInsert(format!(
                "spliced arrival {} does not match derived arrival {}",
                stop.arrival_time(),
                expected
            )));
        }

        let index = self.push_node(stop, left, right);
        match left {
            Some(left) => self.nodes[left.get()].next = Some(index),
            None => self.head = Some(index),
        }
        match right {
            Some(right) => self.nodes[right.get()].prev = Some(index),
            None => self.tail = Some(index),
        }

        if right.is_some() {
            self.update_after_insert(problem, index);
        }

        Ok(index)
    }

    /// Re-derives arrival times downstream of a splice. A stop with enough
    /// waiting slack absorbs the shift without moving its committed departure,
    /// and propagation ends there; otherwise its departure is pushed forward
    /// and the walk continues.
    fn update_after_insert(&mut self, problem: &RidePoolingProblem, from: StopIdx) {
        let mut prev = from;

        while let Some(current) = self.nodes[prev.get()].next {
            let (prev_location, prev_departure) = {
                let stop = self.stop(prev);
                (stop.location(), stop.departure_time())
            };
            let (arrival, departure, location) = {
                let stop = self.stop(current);
                (stop.arrival_time(), stop.departure_time(), stop.location())
            };

            let new_arrival = prev_departure + problem.travel_time(prev_location, location);
            if new_arrival == arrival {
                break;
            }

            if new_arrival <= departure {
                self.nodes[current.get()]
                    .stop
                    .set_times(new_arrival, departure - new_arrival);
                break;
            }

            self.nodes[current.get()].stop.set_times(new_arrival, 0);
            prev = current;
        }
    }

    pub fn iter(&self) -> TourIter<'_> {
        self.iter_from(None)
    }

    /// Forward iteration from the given stop (inclusive), or from the head.
    pub fn iter_from(&self, from: Option<StopIdx>) -> TourIter<'_> {
        TourIter {
            tour: self,
            cursor: from.or(self.head),
        }
    }

    /// Correctness oracle: re-derives every arrival from the travel times and
    /// checks the adjacency rule and rider membership counts. In `complete`
    /// mode every rider of the problem must board exactly once and alight
    /// exactly once, strictly later.
    pub fn check_constraint(
        &self,
        problem: &RidePoolingProblem,
        complete: bool,
    ) -> Result<(), TourError> {
        let mut pick_positions: FxHashMap<RiderIdx, usize> = FxHashMap::default();
        let mut drop_positions: FxHashMap<RiderIdx, usize> = FxHashMap::default();
        let mut previous: Option<(LocationIdx, Time)> = None;

        for (position, (_, stop)) in self.iter().enumerate() {
            if stop.arrival_time() < 0 || stop.wait_time() < 0 {
                return Err(TourError::ConstraintViolation(format!(
                    "negative time at visit {position}"
                )));
            }

            if let Some((prev_location, prev_departure)) = previous {
                if prev_location == stop.location() {
                    return Err(TourError::ConstraintViolation(format!(
                        "adjacent stops share location {prev_location}"
                    )));
                }

                let derived =
                    prev_departure + problem.travel_time(prev_location, stop.location());
                if derived != stop.arrival_time() {
                    return Err(TourError::ConstraintViolation(format!(
                        "arrival {} at visit {position} differs from derived arrival {derived}",
                        stop.arrival_time()
                    )));
                }
            }

            for &rider in stop.pick_ups() {
                if pick_positions.insert(rider, position).is_some() {
                    return Err(TourError::ConstraintViolation(format!(
                        "rider {rider} is picked up twice"
                    )));
                }
            }
            for &rider in stop.drop_offs() {
                if drop_positions.insert(rider, position).is_some() {
                    return Err(TourError::ConstraintViolation(format!(
                        "rider {rider} is dropped off twice"
                    )));
                }
            }

            previous = Some((stop.location(), stop.departure_time()));
        }

        if complete {
            for rider in problem.rider_indices() {
                let pick = pick_positions.get(&rider).ok_or_else(|| {
                    TourError::ConstraintViolation(format!("rider {rider} is never picked up"))
                })?;
                let drop = drop_positions.get(&rider).ok_or_else(|| {
                    TourError::ConstraintViolation(format!("rider {rider} is never dropped off"))
                })?;
                if drop <= pick {
                    return Err(TourError::ConstraintViolation(format!(
                        "rider {rider} is dropped off at visit {drop}, before pick-up at visit {pick}"
                    )));
                }
            }
        }

        Ok(())
    }

    fn push_node(&mut self, stop: Stop, prev: Option<StopIdx>, next: Option<StopIdx>) -> StopIdx {
        let index = StopIdx::new(self.nodes.len());
        self.nodes.push(StopNode { stop, prev, next });
        index
    }
}

pub struct TourIter<'a> {
    tour: &'a Tour,
    cursor: Option<StopIdx>,
}

impl<'a> Iterator for TourIter<'a> {
    type Item = (StopIdx, &'a Stop);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        self.cursor = self.tour.next(index);
        Some((index, self.tour.stop(index)))
    }
}
