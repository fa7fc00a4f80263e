//! Itinerary types.
//!
//! An `Itinerary` is a complete trip from origin to destination: one or more
//! legs, with in-station waits between them.

use std::sync::Arc;

use serde::Serialize;

use super::{DomainError, Leg, MinuteOfDay, transfer_wait};

/// Train classes used by an itinerary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedMix {
    AllHighSpeed,
    AllConventional,
    Mixed,
}

/// A complete journey from origin to destination.
///
/// # Invariants
///
/// - At least one leg
/// - Consecutive legs connect (arrival station of one = departure of next)
#[derive(Debug, Clone, Serialize)]
pub struct Itinerary {
    key: String,
    legs: Vec<Arc<Leg>>,
    total_minutes: u32,
    total_price: f64,
    speed_mix: SpeedMix,
}

impl Itinerary {
    /// Build an itinerary, computing its total time with the given
    /// minimum-stop floor.
    ///
    /// The total is the sum of running times plus each inter-leg wait. A wait
    /// between two different trains that is shorter than `min_stop_minutes`
    /// rolls over to the next day's departure. Staying on the same train run
    /// has no floor.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `legs` is empty or consecutive legs don't connect.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use railway_planner::domain::{Itinerary, Leg, MinuteOfDay};
    ///
    /// let t = |s: &str| MinuteOfDay::parse(s).unwrap();
    /// let first = Leg::scheduled(1, "G1", "G1-a", "A", "B", t("08:00"), 120).unwrap();
    /// let second = Leg::scheduled(2, "G2", "G2-a", "B", "C", t("10:20"), 100).unwrap();
    ///
    /// let itinerary = Itinerary::new(vec![Arc::new(first), Arc::new(second)], 15).unwrap();
    /// assert_eq!(itinerary.total_minutes(), 240);
    /// assert_eq!(itinerary.key(), "G1/G2/240");
    /// ```
    pub fn new(legs: Vec<Arc<Leg>>, min_stop_minutes: u32) -> Result<Self, DomainError> {
        if legs.is_empty() {
            return Err(DomainError::EmptyItinerary);
        }

        let mut total_minutes = legs[0].running_minutes;
        for window in legs.windows(2) {
            let (prev, next) = (&window[0], &window[1]);
            if prev.to != next.from {
                return Err(DomainError::LegsNotConnected(
                    prev.to.clone(),
                    next.from.clone(),
                ));
            }
            let floor = if prev.run_id == next.run_id {
                0
            } else {
                min_stop_minutes
            };
            total_minutes += transfer_wait(prev.arrival, next.departure, floor);
            total_minutes += next.running_minutes;
        }

        let total_price = legs.iter().map(|leg| leg.price).sum();

        let high_speed = legs.iter().filter(|leg| leg.high_speed).count();
        let speed_mix = if high_speed == legs.len() {
            SpeedMix::AllHighSpeed
        } else if high_speed == 0 {
            SpeedMix::AllConventional
        } else {
            SpeedMix::Mixed
        };

        let mut key = String::new();
        for leg in &legs {
            key.push_str(&leg.train_label);
            key.push('/');
        }
        key.push_str(&total_minutes.to_string());

        Ok(Self {
            key,
            legs,
            total_minutes,
            total_price,
            speed_mix,
        })
    }

    /// Client-facing id: the train labels and total minutes joined by "/".
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn legs(&self) -> &[Arc<Leg>] {
        &self.legs
    }

    pub fn total_minutes(&self) -> u32 {
        self.total_minutes
    }

    pub fn total_price(&self) -> f64 {
        self.total_price
    }

    pub fn speed_mix(&self) -> SpeedMix {
        self.speed_mix
    }

    /// Departure time of the first leg.
    pub fn departure(&self) -> MinuteOfDay {
        // Safe: validated non-empty at construction
        self.legs[0].departure
    }

    /// Returns the number of changes (legs - 1, or 0 for direct).
    pub fn change_count(&self) -> usize {
        self.legs.len().saturating_sub(1)
    }

    /// Train labels of the legs in order.
    pub fn train_labels(&self) -> Vec<&str> {
        self.legs.iter().map(|leg| leg.train_label.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::leg::test_support::leg;

    fn arc(l: Leg) -> Arc<Leg> {
        Arc::new(l)
    }

    #[test]
    fn empty_is_rejected() {
        assert!(matches!(
            Itinerary::new(vec![], 15),
            Err(DomainError::EmptyItinerary)
        ));
    }

    #[test]
    fn disconnected_is_rejected() {
        let legs = vec![
            arc(leg(1, "G1", "G1-a", "A", "B", "08:00", 60)),
            arc(leg(2, "G2", "G2-a", "C", "D", "10:00", 60)),
        ];
        assert!(matches!(
            Itinerary::new(legs, 15),
            Err(DomainError::LegsNotConnected(_, _))
        ));
    }

    #[test]
    fn direct_itinerary() {
        let it = Itinerary::new(
            vec![arc(leg(1, "K7", "K7-a", "A", "B", "08:00", 95).with_price(30.0))],
            15,
        )
        .unwrap();
        assert_eq!(it.key(), "K7/95");
        assert_eq!(it.total_minutes(), 95);
        assert_eq!(it.total_price(), 30.0);
        assert_eq!(it.change_count(), 0);
        assert_eq!(it.speed_mix(), SpeedMix::AllConventional);
        assert_eq!(it.departure().to_string(), "08:00");
    }

    #[test]
    fn one_transfer_totals() {
        let it = Itinerary::new(
            vec![
                arc(leg(1, "G1", "G1-a", "A", "B", "08:00", 120).with_price(50.0)),
                arc(leg(2, "G2", "G2-a", "B", "C", "10:20", 100).with_price(60.0)),
            ],
            15,
        )
        .unwrap();
        assert_eq!(it.total_minutes(), 240);
        assert_eq!(it.total_price(), 110.0);
        assert_eq!(it.key(), "G1/G2/240");
        assert_eq!(it.train_labels(), vec!["G1", "G2"]);
        assert_eq!(it.speed_mix(), SpeedMix::AllHighSpeed);
    }

    #[test]
    fn short_connection_rolls_to_next_day() {
        // 10 minutes at B is under the floor, so the wait becomes 1450
        let it = Itinerary::new(
            vec![
                arc(leg(1, "G1", "G1-a", "A", "B", "08:00", 120)),
                arc(leg(2, "K2", "K2-a", "B", "C", "10:10", 60)),
            ],
            15,
        )
        .unwrap();
        assert_eq!(it.total_minutes(), 120 + 1450 + 60);
        assert_eq!(it.speed_mix(), SpeedMix::Mixed);
    }

    #[test]
    fn same_run_has_no_floor() {
        let it = Itinerary::new(
            vec![
                arc(leg(1, "G1", "G1-a", "A", "B", "08:00", 120)),
                arc(leg(2, "G1", "G1-a", "B", "C", "10:05", 60)),
            ],
            15,
        )
        .unwrap();
        assert_eq!(it.total_minutes(), 120 + 5 + 60);
    }

    #[test]
    fn midnight_connection() {
        let it = Itinerary::new(
            vec![
                arc(leg(1, "Z1", "Z1-a", "A", "B", "22:50", 60)),
                arc(leg(2, "Z2", "Z2-a", "B", "C", "00:10", 60)),
            ],
            15,
        )
        .unwrap();
        assert_eq!(it.total_minutes(), 60 + 20 + 60);
    }

    #[test]
    fn serializes_for_clients() {
        let it = Itinerary::new(
            vec![arc(leg(1, "G1", "G1-a", "A", "B", "08:00", 60))],
            15,
        )
        .unwrap();
        let json = serde_json::to_value(&it).unwrap();
        assert_eq!(json["key"], "G1/60");
        assert_eq!(json["speed_mix"], "all_high_speed");
        assert_eq!(json["legs"][0]["departure"], "08:00");
    }
}
