//! In-memory timetable.
//!
//! Loads stations and legs from a JSON file and serves them through the
//! repository traits. Useful for development, the command-line driver and
//! tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::domain::{
    DomainError, Leg, MinuteOfDay, SpeedFilter, Station, StationName, TrainRunId,
    parse_running_time,
};

use super::{HubStations, LegRepository, RepositoryError, StationRegistry};

/// On-disk timetable layout.
#[derive(Debug, Deserialize)]
struct TimetableFile {
    #[serde(default)]
    stations: Vec<serde_json::Value>,
    #[serde(default)]
    legs: Vec<serde_json::Value>,
}

/// A leg as written in the timetable file.
///
/// Times are "HH:MM" strings and the running time is "H:MM". The arrival
/// time and day are optional; when present they must agree with the running
/// time. The high-speed flag defaults from the train label.
#[derive(Debug, Deserialize)]
struct LegRecord {
    id: u64,
    train_label: String,
    run_id: String,
    from: String,
    to: String,
    departure: String,
    running_time: String,
    #[serde(default)]
    arrival: Option<String>,
    #[serde(default)]
    arrival_day: Option<u8>,
    #[serde(default)]
    high_speed: Option<bool>,
    #[serde(default)]
    price: f64,
}

impl LegRecord {
    fn into_leg(self) -> Result<Leg, DomainError> {
        let departure = MinuteOfDay::parse(&self.departure)?;
        let running = parse_running_time(&self.running_time)?;
        let mut leg = Leg::scheduled(
            self.id,
            &self.train_label,
            self.run_id.as_str(),
            self.from.as_str(),
            self.to.as_str(),
            departure,
            running,
        )?
        .with_price(self.price);

        if let Some(flag) = self.high_speed {
            leg = leg.with_high_speed(flag);
        }
        if let Some(arrival) = self.arrival {
            leg.arrival = MinuteOfDay::parse(&arrival)?;
        }
        if let Some(day) = self.arrival_day {
            leg.arrival_day = day;
        }
        leg.validate()?;
        Ok(leg)
    }
}

#[derive(Default)]
struct Inner {
    stations: HashMap<StationName, Station>,
    legs_by_id: HashMap<u64, Arc<Leg>>,
    by_departure: HashMap<StationName, Vec<Arc<Leg>>>,
    by_arrival: HashMap<StationName, Vec<Arc<Leg>>>,
}

impl Inner {
    /// Insert a leg, keeping the per-station lists sorted. Returns false if
    /// the leg was rejected.
    fn insert_leg(&mut self, leg: Leg) -> bool {
        if let Err(e) = leg.validate() {
            warn!(leg = leg.id, error = %e, "Skipping invalid leg");
            return false;
        }
        if self.legs_by_id.contains_key(&leg.id) {
            warn!(leg = leg.id, "Skipping duplicate leg id");
            return false;
        }
        for station in [&leg.from, &leg.to] {
            if !self.stations.contains_key(station) {
                warn!(leg = leg.id, station = %station, "Skipping leg at unknown station");
                return false;
            }
        }

        let leg = Arc::new(leg);
        self.legs_by_id.insert(leg.id, Arc::clone(&leg));
        insert_sorted(self.by_departure.entry(leg.from.clone()).or_default(), &leg);
        insert_sorted(self.by_arrival.entry(leg.to.clone()).or_default(), &leg);
        true
    }
}

/// Keep a leg list ordered by (departure, id).
fn insert_sorted(list: &mut Vec<Arc<Leg>>, leg: &Arc<Leg>) {
    let key = (leg.departure, leg.id);
    let pos = list.partition_point(|l| (l.departure, l.id) < key);
    list.insert(pos, Arc::clone(leg));
}

/// In-memory leg repository and station registry.
///
/// Cloning shares the underlying data.
#[derive(Clone, Default)]
pub struct MemoryTimetable {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryTimetable {
    /// Build a timetable from already-parsed data.
    ///
    /// Legs that fail validation, reuse an id, or reference an unknown
    /// station are skipped with a warning.
    pub fn from_parts(stations: Vec<Station>, legs: Vec<Leg>) -> Self {
        let mut inner = Inner::default();
        for station in stations {
            if inner.stations.contains_key(&station.name) {
                warn!(station = %station.name, "Skipping duplicate station");
                continue;
            }
            inner.stations.insert(station.name.clone(), station);
        }
        let total = legs.len();
        let mut accepted = 0;
        for leg in legs {
            if inner.insert_leg(leg) {
                accepted += 1;
            }
        }
        debug!(accepted, skipped = total - accepted, "Timetable assembled");

        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    /// Parse a timetable from JSON text.
    ///
    /// The document must be an object with `stations` and `legs` arrays.
    /// Individual records that fail to parse are skipped with a warning.
    pub fn from_json_str(json: &str) -> Result<Self, RepositoryError> {
        let file: TimetableFile = serde_json::from_str(json)?;

        let mut stations = Vec::with_capacity(file.stations.len());
        for value in file.stations {
            match serde_json::from_value::<Station>(value) {
                Ok(station) => stations.push(station),
                Err(e) => warn!(error = %e, "Skipping malformed station record"),
            }
        }

        let mut legs = Vec::with_capacity(file.legs.len());
        for value in file.legs {
            let record = match serde_json::from_value::<LegRecord>(value) {
                Ok(record) => record,
                Err(e) => {
                    warn!(error = %e, "Skipping malformed leg record");
                    continue;
                }
            };
            let id = record.id;
            match record.into_leg() {
                Ok(leg) => legs.push(leg),
                Err(e) => warn!(leg = id, error = %e, "Skipping invalid leg record"),
            }
        }

        if stations.is_empty() {
            return Err(RepositoryError::Malformed {
                message: "timetable has no stations".to_string(),
            });
        }

        Ok(Self::from_parts(stations, legs))
    }

    /// Load a timetable from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let timetable = Self::from_json_str(&json)?;
        info!(path = %path.display(), "Loaded timetable");
        Ok(timetable)
    }

    /// Number of stored legs.
    pub async fn leg_count(&self) -> usize {
        self.inner.read().await.legs_by_id.len()
    }

    /// Number of stored stations.
    pub async fn station_count(&self) -> usize {
        self.inner.read().await.stations.len()
    }

    async fn legs_where(
        &self,
        station: &StationName,
        departing: bool,
        keep: impl Fn(&Leg) -> bool,
    ) -> Vec<Arc<Leg>> {
        let guard = self.inner.read().await;
        let index = if departing {
            &guard.by_departure
        } else {
            &guard.by_arrival
        };
        index
            .get(station)
            .map(|legs| legs.iter().filter(|l| keep(l)).cloned().collect())
            .unwrap_or_default()
    }

    async fn stations_where(&self, keep: impl Fn(&Station) -> bool) -> Vec<Station> {
        let guard = self.inner.read().await;
        let mut found: Vec<Station> = guard.stations.values().filter(|s| keep(s)).cloned().collect();
        found.sort_by_key(|s| s.id);
        found
    }
}

impl LegRepository for MemoryTimetable {
    async fn by_departure_station(
        &self,
        station: &StationName,
    ) -> Result<Vec<Arc<Leg>>, RepositoryError> {
        Ok(self.legs_where(station, true, |_| true).await)
    }

    async fn by_arrival_station(
        &self,
        station: &StationName,
    ) -> Result<Vec<Arc<Leg>>, RepositoryError> {
        Ok(self.legs_where(station, false, |_| true).await)
    }

    async fn by_station_pair(
        &self,
        from: &StationName,
        to: &StationName,
        speed: SpeedFilter,
    ) -> Result<Vec<Arc<Leg>>, RepositoryError> {
        Ok(self
            .legs_where(from, true, |l| &l.to == to && speed.admits(l))
            .await)
    }

    async fn by_departure_excluding_arrival(
        &self,
        from: &StationName,
        excluded_to: &StationName,
    ) -> Result<Vec<Arc<Leg>>, RepositoryError> {
        Ok(self.legs_where(from, true, |l| &l.to != excluded_to).await)
    }

    async fn by_arrival_excluding_departure(
        &self,
        to: &StationName,
        excluded_from: &StationName,
    ) -> Result<Vec<Arc<Leg>>, RepositoryError> {
        Ok(self.legs_where(to, false, |l| &l.from != excluded_from).await)
    }

    async fn by_station_pair_and_train(
        &self,
        from: &StationName,
        to: &StationName,
        run: &TrainRunId,
    ) -> Result<Option<Arc<Leg>>, RepositoryError> {
        Ok(self
            .legs_where(from, true, |l| &l.to == to && &l.run_id == run)
            .await
            .into_iter()
            .next())
    }

    async fn batch_insert(&self, legs: Vec<Leg>) -> Result<usize, RepositoryError> {
        let mut guard = self.inner.write().await;
        let mut accepted = 0;
        for leg in legs {
            if guard.insert_leg(leg) {
                accepted += 1;
            }
        }
        Ok(accepted)
    }
}

impl StationRegistry for MemoryTimetable {
    async fn by_name(&self, name: &StationName) -> Result<Option<Station>, RepositoryError> {
        Ok(self.inner.read().await.stations.get(name).cloned())
    }

    async fn by_city_prefix(&self, prefix: &str) -> Result<Vec<Station>, RepositoryError> {
        Ok(self.stations_where(|s| s.city.starts_with(prefix)).await)
    }

    async fn by_name_prefix(&self, prefix: &str) -> Result<Vec<Station>, RepositoryError> {
        Ok(self
            .stations_where(|s| s.name.as_str().starts_with(prefix))
            .await)
    }

    async fn hub_stations(&self) -> Result<HubStations, RepositoryError> {
        let guard = self.inner.read().await;
        Ok(HubStations::from_stations(guard.stations.values()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::leg::test_support::leg;
    use std::io::Write;

    fn name(s: &str) -> StationName {
        StationName::new(s)
    }

    fn sample() -> MemoryTimetable {
        MemoryTimetable::from_parts(
            vec![
                Station::new(1, "A", "Alpha", true),
                Station::new(2, "B", "Beta", true),
                Station::new(3, "C", "Beta", false),
            ],
            vec![
                leg(1, "G1", "G1-a", "A", "B", "09:00", 60),
                leg(2, "K2", "K2-a", "A", "B", "08:00", 90),
                leg(3, "G1", "G1-a", "A", "C", "09:00", 150),
                leg(4, "G1", "G1-a", "B", "C", "10:05", 85),
            ],
        )
    }

    const SAMPLE_JSON: &str = r#"{
        "stations": [
            {"id": 1, "name": "A", "city": "Alpha", "hub": true},
            {"id": 2, "name": "B", "city": "Beta"},
            {"id": "bad"}
        ],
        "legs": [
            {"id": 1, "train_label": "G1", "run_id": "G1-a", "from": "A", "to": "B",
             "departure": "8:00", "running_time": "2:00", "price": 50.0},
            {"id": 2, "train_label": "K9", "run_id": "K9-a", "from": "A", "to": "B",
             "departure": "23:30", "running_time": "1:00", "arrival": "00:30", "arrival_day": 1},
            {"id": 3, "train_label": "K9", "run_id": "K9-a", "from": "A", "to": "B",
             "departure": "25:00", "running_time": "1:00"},
            {"id": 4, "train_label": "K9", "run_id": "K9-a", "from": "A", "to": "B",
             "departure": "10:00", "running_time": "1:00", "arrival": "12:00"},
            {"id": 5, "train_label": "G5", "run_id": "G5-a", "from": "A", "to": "Z",
             "departure": "10:00", "running_time": "1:00"},
            {"train_label": "no id"}
        ]
    }"#;

    #[tokio::test]
    async fn queries_are_sorted_by_departure() {
        let tt = sample();
        let deps = tt.by_departure_station(&name("A")).await.unwrap();
        let ids: Vec<u64> = deps.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);

        let arrs = tt.by_arrival_station(&name("C")).await.unwrap();
        let ids: Vec<u64> = arrs.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[tokio::test]
    async fn station_pair_respects_speed_filter() {
        let tt = sample();
        let all = tt
            .by_station_pair(&name("A"), &name("B"), SpeedFilter::Any)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let fast = tt
            .by_station_pair(&name("A"), &name("B"), SpeedFilter::HighSpeedOnly)
            .await
            .unwrap();
        assert_eq!(fast.len(), 1);
        assert_eq!(fast[0].train_label, "G1");
    }

    #[tokio::test]
    async fn exclusion_queries() {
        let tt = sample();
        let from_a = tt
            .by_departure_excluding_arrival(&name("A"), &name("C"))
            .await
            .unwrap();
        assert!(from_a.iter().all(|l| l.to != name("C")));
        assert_eq!(from_a.len(), 2);

        let into_c = tt
            .by_arrival_excluding_departure(&name("C"), &name("A"))
            .await
            .unwrap();
        assert_eq!(into_c.len(), 1);
        assert_eq!(into_c[0].id, 4);
    }

    #[tokio::test]
    async fn lookup_by_train() {
        let tt = sample();
        let found = tt
            .by_station_pair_and_train(&name("A"), &name("C"), &TrainRunId::new("G1-a"))
            .await
            .unwrap();
        assert_eq!(found.map(|l| l.id), Some(3));

        let missing = tt
            .by_station_pair_and_train(&name("A"), &name("C"), &TrainRunId::new("K2-a"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn batch_insert_skips_bad_legs() {
        let tt = sample();
        let mut broken = leg(11, "G7", "G7-a", "B", "A", "12:00", 60);
        broken.arrival_day = 2;
        let inserted = tt
            .batch_insert(vec![
                leg(10, "G7", "G7-a", "B", "A", "12:00", 60),
                broken,
                leg(1, "G8", "G8-a", "B", "A", "12:00", 60),
                leg(12, "G9", "G9-a", "B", "Nowhere", "12:00", 60),
            ])
            .await
            .unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(tt.leg_count().await, 5);
        let back = tt.by_departure_station(&name("B")).await.unwrap();
        assert_eq!(back.len(), 2);
    }

    #[tokio::test]
    async fn station_lookups() {
        let tt = sample();
        assert!(tt.by_name(&name("A")).await.unwrap().is_some());
        assert!(tt.by_name(&name("Q")).await.unwrap().is_none());

        let beta = tt.by_city_prefix("Be").await.unwrap();
        let names: Vec<_> = beta.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["B", "C"]);

        let by_name = tt.by_name_prefix("C").await.unwrap();
        assert_eq!(by_name.len(), 1);

        let hubs = tt.hub_stations().await.unwrap();
        assert_eq!(hubs.sorted(), vec![name("A"), name("B")]);
    }

    #[tokio::test]
    async fn json_skips_bad_records() {
        let tt = MemoryTimetable::from_json_str(SAMPLE_JSON).unwrap();
        assert_eq!(tt.station_count().await, 2);
        // 1 and 2 are valid; 3 has a bad time, 4 an inconsistent arrival,
        // 5 an unknown station, and the last no id
        assert_eq!(tt.leg_count().await, 2);

        let legs = tt.by_departure_station(&name("A")).await.unwrap();
        assert_eq!(legs[0].price, 50.0);
        assert!(legs[0].high_speed);
        assert_eq!(legs[1].arrival_day, 1);
        assert!(!legs[1].high_speed);
    }

    #[test]
    fn json_without_stations_is_malformed() {
        let err = MemoryTimetable::from_json_str(r#"{"legs": []}"#).err().unwrap();
        assert!(matches!(err, RepositoryError::Malformed { .. }));

        let err = MemoryTimetable::from_json_str("[1, 2]").err().unwrap();
        assert!(matches!(err, RepositoryError::Json(_)));
    }

    #[tokio::test]
    async fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_JSON.as_bytes()).unwrap();

        let tt = MemoryTimetable::from_json_file(file.path()).unwrap();
        assert_eq!(tt.leg_count().await, 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = MemoryTimetable::from_json_file(dir.path().join("absent.json"))
            .err()
            .unwrap();
        assert!(matches!(err, RepositoryError::Io(_)));
    }
}
