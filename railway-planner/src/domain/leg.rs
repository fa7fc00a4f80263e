//! Train leg type.
//!
//! A `Leg` is one scheduled train run between two stops it serves directly.
//! Legs are shared between the repository, the graph and result itineraries,
//! so callers hold them as `Arc<Leg>`.

use serde::{Deserialize, Serialize};

use super::{DomainError, MINUTES_PER_DAY, MinuteOfDay, SpeedFilter, StationName, TrainRunId};

/// Latest relative day a leg may arrive on.
pub const MAX_ARRIVAL_DAY: u8 = 2;

/// A leg of a train run.
///
/// # Invariants
///
/// - `departure + running_minutes == arrival_day * 1440 + arrival`
/// - `arrival_day <= 2`
/// - `from != to`
///
/// [`Leg::scheduled`] builds a leg that satisfies these, and
/// [`Leg::validate`] checks a leg that came from elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub id: u64,
    /// Public train label, e.g. "G101". Not unique across runs.
    pub train_label: String,
    pub run_id: TrainRunId,
    pub from: StationName,
    pub to: StationName,
    pub departure: MinuteOfDay,
    pub arrival: MinuteOfDay,
    pub running_minutes: u32,
    /// Days between departure and arrival (0-2).
    pub arrival_day: u8,
    pub high_speed: bool,
    /// Lowest-class fare.
    pub price: f64,
}

impl Leg {
    /// Build a leg from its departure time and running time, deriving the
    /// arrival time and day.
    ///
    /// The high-speed flag defaults from the train label (see
    /// [`Leg::label_is_high_speed`]) and the price to zero; use
    /// [`Leg::with_price`] and [`Leg::with_high_speed`] to override.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the arrival would fall after day 2 or the stations
    /// coincide.
    ///
    /// ```
    /// use railway_planner::domain::{Leg, MinuteOfDay};
    ///
    /// let leg = Leg::scheduled(
    ///     1,
    ///     "Z12",
    ///     "Z12-a",
    ///     "A",
    ///     "B",
    ///     MinuteOfDay::parse("23:00").unwrap(),
    ///     90,
    /// )
    /// .unwrap();
    /// assert_eq!(leg.arrival.to_string(), "00:30");
    /// assert_eq!(leg.arrival_day, 1);
    /// ```
    pub fn scheduled(
        id: u64,
        train_label: &str,
        run_id: impl Into<TrainRunId>,
        from: impl Into<StationName>,
        to: impl Into<StationName>,
        departure: MinuteOfDay,
        running_minutes: u32,
    ) -> Result<Self, DomainError> {
        let (arrival, days) = departure.add_minutes(running_minutes);
        let leg = Self {
            id,
            train_label: train_label.to_string(),
            run_id: run_id.into(),
            from: from.into(),
            to: to.into(),
            departure,
            arrival,
            running_minutes,
            arrival_day: days.min(u8::MAX as u32) as u8,
            high_speed: Self::label_is_high_speed(train_label),
            price: 0.0,
        };
        leg.validate()?;
        Ok(leg)
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    pub fn with_high_speed(mut self, high_speed: bool) -> Self {
        self.high_speed = high_speed;
        self
    }

    /// Check the leg invariants.
    pub fn validate(&self) -> Result<(), DomainError> {
        let invalid = |reason| DomainError::InvalidLeg {
            id: self.id,
            reason,
        };

        if self.from == self.to {
            return Err(invalid("departure and arrival stations coincide"));
        }
        if self.arrival_day > MAX_ARRIVAL_DAY {
            return Err(invalid("arrival day out of range"));
        }
        let Some(scheduled_end) = self.departure.minutes().checked_add(self.running_minutes)
        else {
            return Err(invalid("running time out of range"));
        };
        let stated_end = self.arrival_day as u32 * MINUTES_PER_DAY + self.arrival.minutes();
        if scheduled_end != stated_end {
            return Err(invalid("running time disagrees with arrival"));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(invalid("price must be a non-negative number"));
        }
        Ok(())
    }

    /// Whether a train label denotes a high-speed service.
    ///
    /// Labels beginning with G, D or C are high-speed classes.
    pub fn label_is_high_speed(label: &str) -> bool {
        matches!(label.as_bytes().first(), Some(b'G' | b'D' | b'C'))
    }

    /// Arrival in minutes after midnight of the departure day.
    pub fn arrival_offset(&self) -> u32 {
        self.departure.minutes() + self.running_minutes
    }
}

impl SpeedFilter {
    /// Whether this leg's train class is allowed.
    pub fn admits(self, leg: &Leg) -> bool {
        self.admits_class(leg.high_speed)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Build a leg from "HH:MM" strings. Panics on bad input.
    pub fn leg(id: u64, label: &str, run: &str, from: &str, to: &str, dep: &str, running: u32) -> Leg {
        Leg::scheduled(
            id,
            label,
            run,
            from,
            to,
            MinuteOfDay::parse(dep).unwrap(),
            running,
        )
        .unwrap()
    }
}
