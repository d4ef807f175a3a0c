//! Night-mode window resolution.
//!
//! Windows are compared at minute precision and are inclusive on both ends.
//! A window whose start equals its end is empty.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::Timelike;

use crate::error::Error;

/// Wall-clock time of day, "HH:MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    pub fn now() -> Self {
        Self::from_time(&chrono::Local::now())
    }

    pub fn from_time(time: &impl Timelike) -> Self {
        // chrono guarantees hour < 24 and minute < 60
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }

    fn minutes_since_midnight(self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }
}

impl FromStr for ClockTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidConfiguration(format!("invalid time {s:?}, expected HH:MM"));

        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour: u8 = hour.parse().map_err(|_| invalid())?;
        let minute: u8 = minute.parse().map_err(|_| invalid())?;
        ClockTime::new(hour, minute).ok_or_else(invalid)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NightWindow {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl NightWindow {
    pub fn parse(start: &str, end: &str) -> Result<Self, Error> {
        Ok(Self {
            start: start.parse()?,
            end: end.parse()?,
        })
    }

    pub fn contains(&self, now: ClockTime) -> bool {
        let start = self.start.minutes_since_midnight();
        let end = self.end.minutes_since_midnight();
        let now = now.minutes_since_midnight();

        match start.cmp(&end) {
            // wraps past midnight: only (end, start) is day
            Ordering::Greater => now >= start || now <= end,
            Ordering::Less => now >= start && now <= end,
            Ordering::Equal => false,
        }
    }
}

pub fn is_night_now(now: ClockTime, start: &str, end: &str) -> Result<bool, Error> {
    Ok(NightWindow::parse(start, end)?.contains(now))
}
