//! One-change itineraries from two leg lists.
//!
//! Given the legs leaving the origin and the legs reaching the destination,
//! pair those that meet at a common station on different trains.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{DomainError, Itinerary, Leg, SpeedFilter, StationName, transfer_wait};

/// A candidate pairing and the numbers it is judged by.
struct Pairing<'a> {
    first: &'a Arc<Leg>,
    second: &'a Arc<Leg>,
    /// Minutes from the first departure until the second train leaves.
    connect_offset: u32,
    total: u32,
}

/// Pair `firsts` with `seconds` at every shared station.
///
/// Legs must be on different trains and both pass `speed`. When `junction`
/// is given only that station is used. For each pair of train labels only
/// the pairing whose second train leaves latest after the start is kept;
/// ties go to the shorter total.
pub fn pair_connections(
    firsts: &[Arc<Leg>],
    seconds: &[Arc<Leg>],
    speed: SpeedFilter,
    min_stop_minutes: u32,
    junction: Option<&StationName>,
) -> Result<Vec<Itinerary>, DomainError> {
    let mut by_junction: HashMap<&StationName, Vec<&Arc<Leg>>> = HashMap::new();
    for second in seconds.iter().filter(|l| speed.admits(l)) {
        by_junction.entry(&second.from).or_default().push(second);
    }

    let mut best: HashMap<(&str, &str), Pairing<'_>> = HashMap::new();
    for first in firsts.iter().filter(|l| speed.admits(l)) {
        if junction.is_some_and(|j| j != &first.to) {
            continue;
        }
        let Some(candidates) = by_junction.get(&first.to) else {
            continue;
        };

        for &second in candidates {
            if second.run_id == first.run_id {
                continue;
            }
            let wait = transfer_wait(first.arrival, second.departure, min_stop_minutes);
            let connect_offset = first.running_minutes + wait;
            let pairing = Pairing {
                first,
                second,
                connect_offset,
                total: connect_offset + second.running_minutes,
            };

            let key = (first.train_label.as_str(), second.train_label.as_str());
            let replace = best.get(&key).is_none_or(|kept| {
                (pairing.connect_offset, std::cmp::Reverse(pairing.total))
                    > (kept.connect_offset, std::cmp::Reverse(kept.total))
            });
            if replace {
                best.insert(key, pairing);
            }
        }
    }

    let mut pairings: Vec<Pairing<'_>> = best.into_values().collect();
    // HashMap order is arbitrary; fix it before ranking's stable sort
    pairings.sort_by_key(|p| (p.first.id, p.second.id));

    pairings
        .into_iter()
        .map(|p| {
            Itinerary::new(
                vec![Arc::clone(p.first), Arc::clone(p.second)],
                min_stop_minutes,
            )
        })
        .collect()
}
