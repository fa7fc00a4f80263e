//! Train identity types.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Internal identifier of one train run.
///
/// Public train labels (e.g. "G101") are not unique: the same label can be
/// reused by different runs across the timetable. The run id is the identity
/// the planner uses to tell "staying on the train" apart from "changing
/// trains".
///
/// ```
/// use railway_planner::domain::TrainRunId;
///
/// let run = TrainRunId::new("240000G1010C");
/// assert_eq!(run.to_string(), "240000G1010C");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TrainRunId(Arc<str>);

impl TrainRunId {
    pub fn new(id: &str) -> Self {
        Self(Arc::from(id.trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TrainRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrainRunId({})", self.as_str())
    }
}

impl fmt::Display for TrainRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for TrainRunId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TrainRunId {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<TrainRunId> for String {
    fn from(value: TrainRunId) -> Self {
        value.as_str().to_string()
    }
}

/// Which train classes a search may use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedFilter {
    #[default]
    Any,
    HighSpeedOnly,
    ConventionalOnly,
}

impl SpeedFilter {
    /// Whether a train with the given high-speed flag is allowed.
    pub fn admits_class(self, high_speed: bool) -> bool {
        match self {
            SpeedFilter::Any => true,
            SpeedFilter::HighSpeedOnly => high_speed,
            SpeedFilter::ConventionalOnly => !high_speed,
        }
    }

    /// Build from the tri-state flag used by request layers, where `None`
    /// means "no preference".
    pub fn from_flag(high_speed: Option<bool>) -> Self {
        match high_speed {
            None => SpeedFilter::Any,
            Some(true) => SpeedFilter::HighSpeedOnly,
            Some(false) => SpeedFilter::ConventionalOnly,
        }
    }
}
