//! Domain error types.
//!
//! These errors represent validation failures and data inconsistencies
//! in the domain layer. They are distinct from repository and search errors.

use super::{StationName, TimeError};

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DomainError {
    /// Leg fields are inconsistent with each other
    #[error("invalid leg {id}: {reason}")]
    InvalidLeg { id: u64, reason: &'static str },

    /// A wait edge must stay inside one station
    #[error("wait edge cannot join {arrival} to {departure}")]
    StationMismatch {
        arrival: StationName,
        departure: StationName,
    },

    /// Itinerary has no legs
    #[error("itinerary must have at least one leg")]
    EmptyItinerary,

    /// Consecutive legs don't meet at a common station
    #[error("leg arriving at {0} does not connect to leg leaving {1}")]
    LegsNotConnected(StationName, StationName),

    #[error(transparent)]
    Time(#[from] TimeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MinuteOfDay;

    #[test]
    fn error_display() {
        let err = DomainError::InvalidLeg {
            id: 7,
            reason: "arrival day out of range",
        };
        assert_eq!(err.to_string(), "invalid leg 7: arrival day out of range");

        let err = DomainError::StationMismatch {
            arrival: StationName::new("A"),
            departure: StationName::new("B"),
        };
        assert_eq!(err.to_string(), "wait edge cannot join A to B");

        let err = DomainError::EmptyItinerary;
        assert_eq!(err.to_string(), "itinerary must have at least one leg");

        let err = DomainError::LegsNotConnected(StationName::new("B"), StationName::new("C"));
        assert_eq!(
            err.to_string(),
            "leg arriving at B does not connect to leg leaving C"
        );

        let err: DomainError = MinuteOfDay::parse("x").unwrap_err().into();
        assert!(err.to_string().starts_with("invalid time"));
    }
}
