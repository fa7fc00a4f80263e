//! Repository doubles for tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::domain::{Leg, SpeedFilter, Station, StationName, TrainRunId};

use super::{HubStations, LegRepository, MemoryTimetable, RepositoryError, StationRegistry};

/// Wraps a timetable, counting leg lookups and optionally failing them.
pub struct FlakyTimetable {
    pub timetable: MemoryTimetable,
    pub failing: AtomicBool,
    pub leg_lookups: AtomicUsize,
}

impl FlakyTimetable {
    pub fn new(timetable: MemoryTimetable) -> Self {
        Self {
            timetable,
            failing: AtomicBool::new(false),
            leg_lookups: AtomicUsize::new(0),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn lookups(&self) -> usize {
        self.leg_lookups.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), RepositoryError> {
        self.leg_lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            Err(RepositoryError::Unavailable("switched off".into()))
        } else {
            Ok(())
        }
    }
}

impl LegRepository for FlakyTimetable {
    async fn by_departure_station(
        &self,
        station: &StationName,
    ) -> Result<Vec<Arc<Leg>>, RepositoryError> {
        self.check()?;
        self.timetable.by_departure_station(station).await
    }

    async fn by_arrival_station(
        &self,
        station: &StationName,
    ) -> Result<Vec<Arc<Leg>>, RepositoryError> {
        self.check()?;
        self.timetable.by_arrival_station(station).await
    }

    async fn by_station_pair(
        &self,
        from: &StationName,
        to: &StationName,
        speed: SpeedFilter,
    ) -> Result<Vec<Arc<Leg>>, RepositoryError> {
        self.check()?;
        self.timetable.by_station_pair(from, to, speed).await
    }

    async fn by_departure_excluding_arrival(
        &self,
        from: &StationName,
        excluded_to: &StationName,
    ) -> Result<Vec<Arc<Leg>>, RepositoryError> {
        self.check()?;
        self.timetable
            .by_departure_excluding_arrival(from, excluded_to)
            .await
    }

    async fn by_arrival_excluding_departure(
        &self,
        to: &StationName,
        excluded_from: &StationName,
    ) -> Result<Vec<Arc<Leg>>, RepositoryError> {
        self.check()?;
        self.timetable
            .by_arrival_excluding_departure(to, excluded_from)
            .await
    }

    async fn by_station_pair_and_train(
        &self,
        from: &StationName,
        to: &StationName,
        run: &TrainRunId,
    ) -> Result<Option<Arc<Leg>>, RepositoryError> {
        self.check()?;
        self.timetable.by_station_pair_and_train(from, to, run).await
    }

    async fn batch_insert(&self, legs: Vec<Leg>) -> Result<usize, RepositoryError> {
        self.check()?;
        self.timetable.batch_insert(legs).await
    }
}

impl StationRegistry for FlakyTimetable {
    async fn by_name(&self, name: &StationName) -> Result<Option<Station>, RepositoryError> {
        self.timetable.by_name(name).await
    }

    async fn by_city_prefix(&self, prefix: &str) -> Result<Vec<Station>, RepositoryError> {
        self.timetable.by_city_prefix(prefix).await
    }

    async fn by_name_prefix(&self, prefix: &str) -> Result<Vec<Station>, RepositoryError> {
        self.timetable.by_name_prefix(prefix).await
    }

    async fn hub_stations(&self) -> Result<HubStations, RepositoryError> {
        self.timetable.hub_stations().await
    }
}
