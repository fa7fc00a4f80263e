//! Itinerary planner.
//!
//! Answers "how do I get from this station to that one?" with direct
//! trains, one-change pairings, and multi-change alternatives found over
//! the hub transfer graph.

mod config;
mod engine;
mod error;
mod pairing;
mod rank;
mod search;


pub use config::PlannerConfig;
pub use engine::{Boarding, Criterion, EngineQuery, PathState, cheapest_path};
pub use error::SearchError;
pub use pairing::pair_connections;
pub use rank::{SortMode, cap_per_speed_mix, deduplicate, rank_itineraries};
pub use search::{JourneyRequest, Planner};
