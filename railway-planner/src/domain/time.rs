//! Minute-of-day time handling for timetable data.
//!
//! Timetables give times as "HH:MM" strings with no date attached. A leg's
//! arrival can fall on a later day than its departure, so the arithmetic here
//! works modulo 1440 and reports how many midnights were crossed.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minutes in one day.
pub const MINUTES_PER_DAY: u32 = 1440;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time {input:?}: {reason}")]
pub struct TimeError {
    input: String,
    reason: &'static str,
}

impl TimeError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// A time of day, stored as minutes since midnight (0..1440).
///
/// # Examples
///
/// ```
/// use railway_planner::domain::MinuteOfDay;
///
/// let t = MinuteOfDay::parse("08:05").unwrap();
/// assert_eq!(t.minutes(), 485);
/// assert_eq!(t.to_string(), "08:05");
///
/// // Source data sometimes drops the zero padding
/// assert_eq!(MinuteOfDay::parse("8:5").unwrap(), t);
///
/// assert!(MinuteOfDay::parse("24:00").is_err());
/// assert!(MinuteOfDay::parse("0800").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MinuteOfDay(u16);

impl MinuteOfDay {
    /// Midnight.
    pub const MIDNIGHT: MinuteOfDay = MinuteOfDay(0);

    /// Create from minutes since midnight.
    ///
    /// Returns `None` if `minutes >= 1440`.
    pub fn new(minutes: u32) -> Option<Self> {
        if minutes < MINUTES_PER_DAY {
            Some(Self(minutes as u16))
        } else {
            None
        }
    }

    /// Create from hour and minute components.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Self::new(hour * 60 + minute)
    }

    /// Parse "HH:MM" (one or two digits on each side of the colon).
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let (hour, minute) = split_hm(s)?;
        if hour > 23 {
            return Err(TimeError::new(s, "hour must be 0-23"));
        }
        if minute > 59 {
            return Err(TimeError::new(s, "minute must be 0-59"));
        }
        Ok(Self((hour * 60 + minute) as u16))
    }

    /// Minutes since midnight.
    pub fn minutes(self) -> u32 {
        self.0 as u32
    }

    pub fn hour(self) -> u32 {
        self.minutes() / 60
    }

    pub fn minute(self) -> u32 {
        self.minutes() % 60
    }

    /// Add a number of minutes, returning the wrapped time and how many
    /// midnights were crossed.
    ///
    /// ```
    /// use railway_planner::domain::MinuteOfDay;
    ///
    /// let late = MinuteOfDay::parse("23:50").unwrap();
    /// let (t, days) = late.add_minutes(20);
    /// assert_eq!(t.to_string(), "00:10");
    /// assert_eq!(days, 1);
    /// ```
    pub fn add_minutes(self, minutes: u32) -> (Self, u32) {
        let total = self.minutes() as u64 + minutes as u64;
        let per_day = MINUTES_PER_DAY as u64;
        (Self((total % per_day) as u16), (total / per_day) as u32)
    }

    /// Convert to a chrono `NaiveTime`.
    pub fn to_naive_time(self) -> NaiveTime {
        // hour() <= 23 and minute() <= 59 by construction
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0).unwrap_or(NaiveTime::MIN)
    }

    /// Convert from a chrono `NaiveTime`, dropping seconds.
    pub fn from_naive_time(time: NaiveTime) -> Self {
        Self((time.hour() * 60 + time.minute()) as u16)
    }
}

impl fmt::Debug for MinuteOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MinuteOfDay({self})")
    }
}

impl fmt::Display for MinuteOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl TryFrom<String> for MinuteOfDay {
    type Error = TimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MinuteOfDay> for String {
    fn from(value: MinuteOfDay) -> Self {
        value.to_string()
    }
}

/// Parse an elapsed running time written as "H:MM".
///
/// Unlike [`MinuteOfDay::parse`] the hour part may exceed 23, since a train
/// can run for more than a day.
///
/// ```
/// use railway_planner::domain::parse_running_time;
///
/// assert_eq!(parse_running_time("2:00").unwrap(), 120);
/// assert_eq!(parse_running_time("27:15").unwrap(), 1635);
/// assert!(parse_running_time("2:75").is_err());
/// ```
pub fn parse_running_time(s: &str) -> Result<u32, TimeError> {
    let (hour, minute) = split_hm(s)?;
    if minute > 59 {
        return Err(TimeError::new(s, "minute must be 0-59"));
    }
    Ok(hour * 60 + minute)
}

/// Split "H:M" into its numeric parts.
fn split_hm(s: &str) -> Result<(u32, u32), TimeError> {
    let (h, m) = s
        .trim()
        .split_once(':')
        .ok_or_else(|| TimeError::new(s, "expected H:MM format"))?;

    let parse_part = |part: &str| -> Result<u32, TimeError> {
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TimeError::new(s, "expected decimal digits"));
        }
        part.parse::<u32>()
            .map_err(|_| TimeError::new(s, "expected decimal digits"))
    };

    let hour = parse_part(h)?;
    let minute = parse_part(m)?;
    if m.len() > 2 {
        return Err(TimeError::new(s, "minute must be at most two digits"));
    }
    Ok((hour, minute))
}

/// Minutes spent waiting at a station from `from` until `to`, assuming `to`
/// is the next occurrence of that time of day.
///
/// Always in `0..1440`, and zero iff the two times are equal.
///
/// ```
/// use railway_planner::domain::{MinuteOfDay, stop_time};
///
/// let arrive = MinuteOfDay::parse("23:50").unwrap();
/// let depart = MinuteOfDay::parse("00:10").unwrap();
/// assert_eq!(stop_time(arrive, depart), 20);
/// assert_eq!(stop_time(arrive, arrive), 0);
/// ```
pub fn stop_time(from: MinuteOfDay, to: MinuteOfDay) -> u32 {
    (to.minutes() + MINUTES_PER_DAY - from.minutes()) % MINUTES_PER_DAY
}

/// Wait between arriving at `arrival` and catching a train at `departure`,
/// honouring a minimum connection floor.
///
/// If the next same-day occurrence of `departure` is closer than `floor`
/// minutes, the passenger has to take the following day's departure instead.
pub fn transfer_wait(arrival: MinuteOfDay, departure: MinuteOfDay, floor: u32) -> u32 {
    let wait = stop_time(arrival, departure);
    if wait < floor {
        wait + MINUTES_PER_DAY
    } else {
        wait
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> MinuteOfDay {
        MinuteOfDay::parse(s).unwrap()
    }

    #[test]
    fn parse_valid_times() {
        assert_eq!(t("00:00").minutes(), 0);
        assert_eq!(t("23:59").minutes(), 1439);
        assert_eq!(t("14:30").hour(), 14);
        assert_eq!(t("14:30").minute(), 30);
        assert_eq!(t("7:05"), t("07:05"));
        assert_eq!(t(" 10:20 "), t("10:20"));
    }

    #[test]
    fn parse_invalid_format() {
        assert!(MinuteOfDay::parse("1430").is_err());
        assert!(MinuteOfDay::parse("14-30").is_err());
        assert!(MinuteOfDay::parse(":30").is_err());
        assert!(MinuteOfDay::parse("14:").is_err());
        assert!(MinuteOfDay::parse("ab:cd").is_err());
        assert!(MinuteOfDay::parse("14:300").is_err());
        assert!(MinuteOfDay::parse("+1:30").is_err());
    }

    #[test]
    fn parse_out_of_range() {
        assert!(MinuteOfDay::parse("24:00").is_err());
        assert!(MinuteOfDay::parse("12:60").is_err());
    }

    #[test]
    fn error_message_names_input() {
        let err = MinuteOfDay::parse("25:00").unwrap_err();
        assert_eq!(err.to_string(), "invalid time \"25:00\": hour must be 0-23");
    }

    #[test]
    fn display_is_zero_padded() {
        assert_eq!(t("8:5").to_string(), "08:05");
        assert_eq!(format!("{:?}", t("8:5")), "MinuteOfDay(08:05)");
    }

    #[test]
    fn constructors() {
        assert_eq!(MinuteOfDay::new(1439), Some(t("23:59")));
        assert_eq!(MinuteOfDay::new(1440), None);
        assert_eq!(MinuteOfDay::from_hm(10, 20), Some(t("10:20")));
        assert_eq!(MinuteOfDay::from_hm(24, 0), None);
    }

    #[test]
    fn add_minutes_crosses_midnight() {
        assert_eq!(t("10:00").add_minutes(120), (t("12:00"), 0));
        assert_eq!(t("23:00").add_minutes(90), (t("00:30"), 1));
        assert_eq!(t("22:00").add_minutes(1440 + 180), (t("01:00"), 2));
    }

    #[test]
    fn add_minutes_handles_huge_offsets() {
        let (time, days) = t("23:59").add_minutes(u32::MAX);
        let total = 1439u64 + u32::MAX as u64;
        assert_eq!(time.minutes() as u64, total % 1440);
        assert_eq!(days as u64, total / 1440);
    }

    #[test]
    fn chrono_roundtrip() {
        let time = t("17:42");
        assert_eq!(MinuteOfDay::from_naive_time(time.to_naive_time()), time);
    }

    #[test]
    fn running_time() {
        assert_eq!(parse_running_time("0:45").unwrap(), 45);
        assert_eq!(parse_running_time("48:00").unwrap(), 2880);
        assert!(parse_running_time("1:60").is_err());
        assert!(parse_running_time("abc").is_err());
    }

    #[test]
    fn stop_time_cases() {
        assert_eq!(stop_time(t("10:00"), t("10:20")), 20);
        assert_eq!(stop_time(t("23:50"), t("00:10")), 20);
        assert_eq!(stop_time(t("10:20"), t("10:00")), 1420);
        assert_eq!(stop_time(t("06:00"), t("06:00")), 0);
    }

    #[test]
    fn transfer_wait_applies_floor() {
        // 10 minutes is under the floor: catch tomorrow's 10:10 instead
        assert_eq!(transfer_wait(t("10:00"), t("10:10"), 15), 1450);
        assert_eq!(transfer_wait(t("10:00"), t("10:15"), 15), 15);
        assert_eq!(transfer_wait(t("10:00"), t("10:20"), 15), 20);
        assert_eq!(transfer_wait(t("23:50"), t("00:10"), 15), 20);
        // A zero floor never adds a day
        assert_eq!(transfer_wait(t("10:00"), t("10:00"), 0), 0);
    }

    #[test]
    fn serde_uses_string_form() {
        let json = serde_json::to_string(&t("09:07")).unwrap();
        assert_eq!(json, "\"09:07\"");
        let back: MinuteOfDay = serde_json::from_str("\"9:7\"").unwrap();
        assert_eq!(back, t("09:07"));
        assert!(serde_json::from_str::<MinuteOfDay>("\"99:00\"").is_err());
    }
}
