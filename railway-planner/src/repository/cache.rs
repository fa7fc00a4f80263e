//! Caching layer for leg lookups.
//!
//! Every query overlay fetches the legs leaving its origin and arriving at
//! its destination. Popular stations are asked for over and over, so the
//! per-station lists are cached with a TTL. Pair and train lookups pass
//! straight through.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::trace;

use crate::domain::{Leg, SpeedFilter, Station, StationName, TrainRunId};

use super::{HubStations, LegRepository, RepositoryError, StationRegistry};

/// Which side of a leg the station is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Side {
    Departing,
    Arriving,
}

/// Cache key: (station, side).
type LegKey = (StationName, Side);

/// Cached leg list.
type LegEntry = Arc<Vec<Arc<Leg>>>;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_capacity: 1000,
        }
    }
}

/// Leg repository with caching.
///
/// Wraps any [`LegRepository`] and caches per-station lookups. Writes
/// through [`LegRepository::batch_insert`] invalidate the whole cache.
pub struct CachedLegRepository<R> {
    inner: R,
    legs: MokaCache<LegKey, LegEntry>,
}

impl<R> CachedLegRepository<R> {
    /// Create a new cached repository.
    pub fn new(inner: R, config: &CacheConfig) -> Self {
        let legs = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { inner, legs }
    }

    /// Access the underlying repository for operations that bypass cache.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Get cache statistics (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.legs.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.legs.invalidate_all();
    }
}

impl<R: LegRepository> CachedLegRepository<R> {
    async fn cached(
        &self,
        station: &StationName,
        side: Side,
    ) -> Result<Vec<Arc<Leg>>, RepositoryError> {
        let key = (station.clone(), side);

        // Try cache first
        if let Some(hit) = self.legs.get(&key).await {
            trace!(station = %station, ?side, "Leg cache hit");
            return Ok(hit.as_ref().clone());
        }

        let fetched = match side {
            Side::Departing => self.inner.by_departure_station(station).await?,
            Side::Arriving => self.inner.by_arrival_station(station).await?,
        };
        self.legs.insert(key, Arc::new(fetched.clone())).await;
        Ok(fetched)
    }
}

impl<R: LegRepository> LegRepository for CachedLegRepository<R> {
    async fn by_departure_station(
        &self,
        station: &StationName,
    ) -> Result<Vec<Arc<Leg>>, RepositoryError> {
        self.cached(station, Side::Departing).await
    }

    async fn by_arrival_station(
        &self,
        station: &StationName,
    ) -> Result<Vec<Arc<Leg>>, RepositoryError> {
        self.cached(station, Side::Arriving).await
    }

    async fn by_station_pair(
        &self,
        from: &StationName,
        to: &StationName,
        speed: SpeedFilter,
    ) -> Result<Vec<Arc<Leg>>, RepositoryError> {
        self.inner.by_station_pair(from, to, speed).await
    }

    async fn by_departure_excluding_arrival(
        &self,
        from: &StationName,
        excluded_to: &StationName,
    ) -> Result<Vec<Arc<Leg>>, RepositoryError> {
        let legs = self.cached(from, Side::Departing).await?;
        Ok(legs.into_iter().filter(|l| &l.to != excluded_to).collect())
    }

    async fn by_arrival_excluding_departure(
        &self,
        to: &StationName,
        excluded_from: &StationName,
    ) -> Result<Vec<Arc<Leg>>, RepositoryError> {
        let legs = self.cached(to, Side::Arriving).await?;
        Ok(legs
            .into_iter()
            .filter(|l| &l.from != excluded_from)
            .collect())
    }

    async fn by_station_pair_and_train(
        &self,
        from: &StationName,
        to: &StationName,
        run: &TrainRunId,
    ) -> Result<Option<Arc<Leg>>, RepositoryError> {
        self.inner.by_station_pair_and_train(from, to, run).await
    }

    async fn batch_insert(&self, legs: Vec<Leg>) -> Result<usize, RepositoryError> {
        let inserted = self.inner.batch_insert(legs).await?;
        self.legs.invalidate_all();
        Ok(inserted)
    }
}

impl<R: StationRegistry> StationRegistry for CachedLegRepository<R> {
    async fn by_name(&self, name: &StationName) -> Result<Option<Station>, RepositoryError> {
        self.inner.by_name(name).await
    }

    async fn by_city_prefix(&self, prefix: &str) -> Result<Vec<Station>, RepositoryError> {
        self.inner.by_city_prefix(prefix).await
    }

    async fn by_name_prefix(&self, prefix: &str) -> Result<Vec<Station>, RepositoryError> {
        self.inner.by_name_prefix(prefix).await
    }

    async fn hub_stations(&self) -> Result<HubStations, RepositoryError> {
        self.inner.hub_stations().await
    }
}
