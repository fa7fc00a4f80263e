//! Station identity types.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// The unique name of a station, as used by the timetable.
///
/// Station names are the join key between legs and stations, so they are
/// cloned into every graph node. The `Arc<str>` keeps those clones cheap.
///
/// # Examples
///
/// ```
/// use railway_planner::domain::StationName;
///
/// let a = StationName::new("Beijing South");
/// let b: StationName = "Beijing South".into();
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "Beijing South");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct StationName(Arc<str>);

impl StationName {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name.trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationName({})", self.as_str())
    }
}

impl fmt::Display for StationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for StationName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for StationName {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<StationName> for String {
    fn from(value: StationName) -> Self {
        value.as_str().to_string()
    }
}

/// A station known to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub id: u32,
    pub name: StationName,
    /// City the station serves; several stations can share one.
    pub city: String,
    /// Whether the station anchors the transfer graph.
    #[serde(default)]
    pub hub: bool,
}

impl Station {
    pub fn new(id: u32, name: impl Into<StationName>, city: impl Into<String>, hub: bool) -> Self {
        Self {
            id,
            name: name.into(),
            city: city.into(),
            hub,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_trimmed() {
        assert_eq!(StationName::new("  Shanghai "), StationName::new("Shanghai"));
    }

    #[test]
    fn display_and_debug() {
        let name = StationName::new("Wuhan");
        assert_eq!(name.to_string(), "Wuhan");
        assert_eq!(format!("{name:?}"), "StationName(Wuhan)");
    }

    #[test]
    fn hashable() {
        let mut set = HashSet::new();
        set.insert(StationName::new("A"));
        set.insert(StationName::new("A"));
        set.insert(StationName::new("B"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn station_serde() {
        let json = r#"{"id":3,"name":"Nanjing South","city":"Nanjing"}"#;
        let station: Station = serde_json::from_str(json).unwrap();
        assert_eq!(station.name, StationName::new("Nanjing South"));
        assert!(!station.hub);

        let back = serde_json::to_value(&station).unwrap();
        assert_eq!(back["name"], "Nanjing South");
    }
}
