//! Connection rules shared by the template build and the query overlay.
//!
//! Both sides answer the same question: having arrived on one train, which
//! departures at the same station can the passenger make?

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{
    DomainError, Leg, MAX_ARRIVAL_DAY, MINUTES_PER_DAY, MinuteOfDay, TrainRunId, transfer_wait,
};

use super::{Edge, GraphNode, WaitEdge};

/// Keep one leg per train run: the one with the shortest running time.
///
/// A run that calls at several hubs appears once per hub; linking only the
/// nearest one keeps the graph small, and later hubs are reached by staying
/// on the train. Ties go to the lower leg id.
pub(crate) fn nearest_per_run(legs: impl IntoIterator<Item = Arc<Leg>>) -> Vec<Arc<Leg>> {
    let mut nearest: HashMap<TrainRunId, Arc<Leg>> = HashMap::new();
    for leg in legs {
        match nearest.get(&leg.run_id) {
            Some(kept) if (kept.running_minutes, kept.id) <= (leg.running_minutes, leg.id) => {}
            _ => {
                nearest.insert(leg.run_id.clone(), leg);
            }
        }
    }
    nearest.into_values().collect()
}

/// Index of the first departure leaving no earlier than `arrival + floor`
/// on the same day. `departures` must be sorted by departure time.
pub(crate) fn first_admissible(departures: &[Arc<Leg>], arrival: MinuteOfDay, floor: u32) -> usize {
    let earliest = arrival.minutes() + floor;
    departures.partition_point(|d| d.departure.minutes() < earliest)
}

/// Earliest departure of a different train that `arrival` can connect to.
///
/// Scans from `start` (see [`first_admissible`]) for a same-day departure,
/// then wraps round to the next day's departures.
pub(crate) fn earliest_change<'a>(
    departures: &'a [Arc<Leg>],
    start: usize,
    arrival: &Leg,
    floor: u32,
) -> Option<&'a Arc<Leg>> {
    let earliest = arrival.arrival.minutes() + floor;
    departures[start.min(departures.len())..]
        .iter()
        .find(|d| d.run_id != arrival.run_id)
        .or_else(|| {
            departures.iter().find(|d| {
                d.run_id != arrival.run_id && d.departure.minutes() + MINUTES_PER_DAY >= earliest
            })
        })
}

/// The same train leaving again, if it does.
pub(crate) fn through_departure<'a>(departures: &'a [Arc<Leg>], arrival: &Leg) -> Option<&'a Arc<Leg>> {
    departures.iter().find(|d| d.run_id == arrival.run_id)
}

/// Wait edges from each arrival node of `arrival` to `departure`.
///
/// One edge per relative arrival day. The target day moves on by however
/// many midnights the wait crosses.
pub(crate) fn wait_links(
    arrival: &Leg,
    departure: &Leg,
    floor: u32,
) -> Result<Vec<(GraphNode, Edge)>, DomainError> {
    let wait = transfer_wait(arrival.arrival, departure.departure, floor);
    let carry = ((arrival.arrival.minutes() + wait) / MINUTES_PER_DAY) as u8;

    (0..=MAX_ARRIVAL_DAY)
        .map(|day| {
            let edge = WaitEdge::between(&arrival.to, departure, wait, day + carry)?;
            Ok((
                GraphNode::arrive(&arrival.to, &arrival.run_id, day),
                Edge::Wait(edge),
            ))
        })
        .collect()
}

/// Floor for a connection: none when staying on the same train.
pub(crate) fn floor_between(arrival: &Leg, departure: &Leg, floor: u32) -> u32 {
    if arrival.run_id == departure.run_id {
        0
    } else {
        floor
    }
}
