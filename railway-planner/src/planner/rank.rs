//! Itinerary ranking for search results.
//!
//! Orders itineraries by one of six sort modes, removes repeats, and caps
//! how many of each train-class mix are returned.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::{Itinerary, SpeedMix};

/// How results are ordered.
///
/// The numeric codes are the ones request layers pass around.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Shortest total time first (1)
    #[default]
    DurationAsc,
    /// Longest total time first (2)
    DurationDesc,
    /// Earliest departure first (3)
    DepartureAsc,
    /// Latest departure first (4)
    DepartureDesc,
    /// Cheapest first (5)
    PriceAsc,
    /// Dearest first (6)
    PriceDesc,
}

impl SortMode {
    /// Look up a mode by its numeric code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(SortMode::DurationAsc),
            2 => Some(SortMode::DurationDesc),
            3 => Some(SortMode::DepartureAsc),
            4 => Some(SortMode::DepartureDesc),
            5 => Some(SortMode::PriceAsc),
            6 => Some(SortMode::PriceDesc),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            SortMode::DurationAsc => 1,
            SortMode::DurationDesc => 2,
            SortMode::DepartureAsc => 3,
            SortMode::DepartureDesc => 4,
            SortMode::PriceAsc => 5,
            SortMode::PriceDesc => 6,
        }
    }

    /// Whether the mode orders by fare.
    pub fn is_price(self) -> bool {
        matches!(self, SortMode::PriceAsc | SortMode::PriceDesc)
    }

    fn compare(self, a: &Itinerary, b: &Itinerary) -> Ordering {
        let by_total = a.total_minutes().cmp(&b.total_minutes());
        let by_departure = a.departure().cmp(&b.departure());
        let by_price = a.total_price().total_cmp(&b.total_price());

        match self {
            SortMode::DurationAsc => by_total.then(by_departure),
            SortMode::DurationDesc => by_total.reverse().then(by_departure),
            SortMode::DepartureAsc => by_departure.then(by_total),
            SortMode::DepartureDesc => by_departure.reverse().then(by_total),
            SortMode::PriceAsc => by_price.then(by_departure.reverse()).then(by_total),
            SortMode::PriceDesc => by_price
                .reverse()
                .then(by_departure.reverse())
                .then(by_total),
        }
    }
}

/// Sort itineraries best-first under `mode`.
///
/// The sort is stable, so itineraries that tie on every key keep their
/// input order.
pub fn rank_itineraries(mut itineraries: Vec<Itinerary>, mode: SortMode) -> Vec<Itinerary> {
    itineraries.sort_by(|a, b| mode.compare(a, b));
    itineraries
}

/// Remove itineraries whose key was already seen. The first one wins.
pub fn deduplicate(itineraries: Vec<Itinerary>) -> Vec<Itinerary> {
    let mut seen = HashSet::new();
    itineraries
        .into_iter()
        .filter(|it| seen.insert(it.key().to_string()))
        .collect()
}

/// Keep at most `cap` itineraries of each speed mix, preserving order.
pub fn cap_per_speed_mix(itineraries: Vec<Itinerary>, cap: usize) -> Vec<Itinerary> {
    let mut counts: HashMap<SpeedMix, usize> = HashMap::new();
    itineraries
        .into_iter()
        .filter(|it| {
            let count = counts.entry(it.speed_mix()).or_default();
            *count += 1;
            *count <= cap
        })
        .collect()
}
