//! Domain types for the railway itinerary planner.
//!
//! This module contains the core domain model types that represent
//! validated timetable data. Types check their invariants at construction
//! time, so code that receives them can trust their validity.

mod error;
mod itinerary;
pub(crate) mod leg;
mod station;
mod time;
mod train;

pub use error::DomainError;
pub use itinerary::{Itinerary, SpeedMix};
pub use leg::{Leg, MAX_ARRIVAL_DAY};
pub use station::{Station, StationName};
pub use time::{
    MINUTES_PER_DAY, MinuteOfDay, TimeError, parse_running_time, stop_time, transfer_wait,
};
pub use train::{SpeedFilter, TrainRunId};
