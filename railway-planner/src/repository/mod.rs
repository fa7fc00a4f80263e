//! Timetable collaborators.
//!
//! The planner reads legs and stations through the [`LegRepository`] and
//! [`StationRegistry`] traits. This allows the planner to be tested with mock
//! data and run against any backing store.

mod cache;
mod error;
mod hubs;
mod memory;
#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use crate::domain::{Leg, SpeedFilter, Station, StationName, TrainRunId};

pub use cache::{CacheConfig, CachedLegRepository};
pub use error::RepositoryError;
pub use hubs::HubStations;
pub use memory::MemoryTimetable;

/// Source of scheduled legs.
///
/// Every query method returns legs sorted by departure time, then id.
#[allow(async_fn_in_trait)]
pub trait LegRepository {
    /// All legs leaving `station`.
    async fn by_departure_station(
        &self,
        station: &StationName,
    ) -> Result<Vec<Arc<Leg>>, RepositoryError>;

    /// All legs arriving at `station`.
    async fn by_arrival_station(
        &self,
        station: &StationName,
    ) -> Result<Vec<Arc<Leg>>, RepositoryError>;

    /// Legs running directly from `from` to `to` whose class passes `speed`.
    async fn by_station_pair(
        &self,
        from: &StationName,
        to: &StationName,
        speed: SpeedFilter,
    ) -> Result<Vec<Arc<Leg>>, RepositoryError>;

    /// Legs leaving `from`, except those arriving at `excluded_to`.
    async fn by_departure_excluding_arrival(
        &self,
        from: &StationName,
        excluded_to: &StationName,
    ) -> Result<Vec<Arc<Leg>>, RepositoryError>;

    /// Legs arriving at `to`, except those leaving `excluded_from`.
    async fn by_arrival_excluding_departure(
        &self,
        to: &StationName,
        excluded_from: &StationName,
    ) -> Result<Vec<Arc<Leg>>, RepositoryError>;

    /// The leg of train run `run` from `from` to `to`, if it exists.
    async fn by_station_pair_and_train(
        &self,
        from: &StationName,
        to: &StationName,
        run: &TrainRunId,
    ) -> Result<Option<Arc<Leg>>, RepositoryError>;

    /// Store legs, returning how many were accepted.
    async fn batch_insert(&self, legs: Vec<Leg>) -> Result<usize, RepositoryError>;
}

/// Source of station metadata.
#[allow(async_fn_in_trait)]
pub trait StationRegistry {
    async fn by_name(&self, name: &StationName) -> Result<Option<Station>, RepositoryError>;

    /// Stations whose city starts with `prefix`.
    async fn by_city_prefix(&self, prefix: &str) -> Result<Vec<Station>, RepositoryError>;

    /// Stations whose name starts with `prefix`.
    async fn by_name_prefix(&self, prefix: &str) -> Result<Vec<Station>, RepositoryError>;

    /// The hub set the transfer graph is built over.
    async fn hub_stations(&self) -> Result<HubStations, RepositoryError>;
}
