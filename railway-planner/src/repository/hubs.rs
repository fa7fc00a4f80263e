//! Hub station set.

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::{Station, StationName};

/// The set of hub stations that anchor the transfer graph.
///
/// Produced by timetable ingestion from the stations' hub flags and read by
/// every graph build and query overlay. Cloning shares the underlying set.
#[derive(Debug, Clone, Default)]
pub struct HubStations {
    inner: Arc<HashSet<StationName>>,
}

impl HubStations {
    pub fn new(names: impl IntoIterator<Item = StationName>) -> Self {
        Self {
            inner: Arc::new(names.into_iter().collect()),
        }
    }

    /// Collect the hub-flagged stations.
    pub fn from_stations<'a>(stations: impl IntoIterator<Item = &'a Station>) -> Self {
        Self::new(
            stations
                .into_iter()
                .filter(|s| s.hub)
                .map(|s| s.name.clone()),
        )
    }

    pub fn contains(&self, station: &StationName) -> bool {
        self.inner.contains(station)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Hub names in a stable order.
    pub fn sorted(&self) -> Vec<StationName> {
        let mut names: Vec<_> = self.inner.iter().cloned().collect();
        names.sort();
        names
    }
}
