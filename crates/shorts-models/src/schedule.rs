//! Time-of-day parsing and schedule slots.
//!
//! Publish times are configured as `H:MM` or `HH:MM` on a 24-hour clock.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minutes in a day; time-of-day arithmetic wraps modulo this value.
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// A minute-resolution time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    minute_of_day: u16,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Result<Self, TimeOfDayError> {
        if hour > 23 {
            return Err(TimeOfDayError::HourOutOfRange(hour));
        }
        if minute > 59 {
            return Err(TimeOfDayError::MinuteOutOfRange(minute));
        }
        Ok(Self {
            minute_of_day: (hour * 60 + minute) as u16,
        })
    }

    /// Build from minutes since midnight, wrapping across day boundaries.
    pub fn from_minutes_wrapping(minutes: i64) -> Self {
        Self {
            minute_of_day: minutes.rem_euclid(MINUTES_PER_DAY) as u16,
        }
    }

    pub fn minute_of_day(&self) -> u16 {
        self.minute_of_day
    }

    pub fn hour(&self) -> u32 {
        u32::from(self.minute_of_day / 60)
    }

    pub fn minute(&self) -> u32 {
        u32::from(self.minute_of_day % 60)
    }

    /// Shift by a signed number of minutes, wrapping across midnight.
    pub fn offset_by(&self, minutes: i64) -> Self {
        Self::from_minutes_wrapping(i64::from(self.minute_of_day) + minutes)
    }

    pub fn to_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeOfDayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TimeOfDayError::Empty);
        }

        let (hour, minute) = s
            .split_once(':')
            .ok_or_else(|| TimeOfDayError::InvalidFormat(s.to_string()))?;

        if minute.len() != 2 || hour.is_empty() || hour.len() > 2 {
            return Err(TimeOfDayError::InvalidFormat(s.to_string()));
        }

        let hour: u32 = hour
            .parse()
            .map_err(|_| TimeOfDayError::InvalidFormat(s.to_string()))?;
        let minute: u32 = minute
            .parse()
            .map_err(|_| TimeOfDayError::InvalidFormat(s.to_string()))?;

        Self::new(hour, minute)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = TimeOfDayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// Time-of-day parsing error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeOfDayError {
    #[error("time of day cannot be empty")]
    Empty,
    #[error("invalid time of day '{0}', expected H:MM or HH:MM")]
    InvalidFormat(String),
    #[error("hour {0} out of range 0-23")]
    HourOutOfRange(u32),
    #[error("minute {0} out of range 0-59")]
    MinuteOutOfRange(u32),
}

/// A nominal publish time plus the random offset drawn when the scheduler
/// was armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub nominal: TimeOfDay,
    pub offset_minutes: i64,
}

impl ScheduleSlot {
    pub fn new(nominal: TimeOfDay, offset_minutes: i64) -> Self {
        Self {
            nominal,
            offset_minutes,
        }
    }

    /// Nominal time shifted by the offset, wrapped across midnight.
    pub fn effective(&self) -> TimeOfDay {
        self.nominal.offset_by(self.offset_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_digit_hour() {
        let t: TimeOfDay = "8:00".parse().unwrap();
        assert_eq!(t.hour(), 8);
        assert_eq!(t.minute(), 0);
        assert_eq!(t.to_string(), "08:00");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!("".parse::<TimeOfDay>(), Err(TimeOfDayError::Empty));
        assert!("800".parse::<TimeOfDay>().is_err());
        assert!("8:0".parse::<TimeOfDay>().is_err());
        assert!("ab:cd".parse::<TimeOfDay>().is_err());
        assert_eq!(
            "24:00".parse::<TimeOfDay>(),
            Err(TimeOfDayError::HourOutOfRange(24))
        );
        assert_eq!(
            "12:60".parse::<TimeOfDay>(),
            Err(TimeOfDayError::MinuteOutOfRange(60))
        );
    }

    #[test]
    fn test_offset_wraps_midnight() {
        let t: TimeOfDay = "23:50".parse().unwrap();
        assert_eq!(t.offset_by(15).to_string(), "00:05");

        let t: TimeOfDay = "00:05".parse().unwrap();
        assert_eq!(t.offset_by(-15).to_string(), "23:50");
    }

    #[test]
    fn test_slot_effective_time() {
        let slot = ScheduleSlot::new("15:00".parse().unwrap(), -7);
        assert_eq!(slot.effective().to_string(), "14:53");
    }

    #[test]
    fn test_serde_as_string() {
        let t: TimeOfDay = "9:30".parse().unwrap();
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"09:30\"");
        let back: TimeOfDay = serde_json::from_str("\"09:30\"").unwrap();
        assert_eq!(back, t);
    }
}
