use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_OPEN_TIME: &str = "11:00";
pub const DEFAULT_CLOSE_TIME: &str = "22:00";
pub const DEFAULT_LAST_ORDER_TIME: &str = "21:30";

/// Closing at midnight, as old listings write it.
const END_OF_DAY: &str = "24:00";

/// Maximum number of slots a single day can hold (split hours).
pub const MAX_TIME_SLOTS: usize = 3;

/// One continuous service period within a day.
///
/// Times are kept as `HH:MM` strings, the same shape the JSON column and the form use.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub open_time: String,
    pub close_time: String,
    pub last_order_time: String,
}

impl TimeSlot {
    pub fn new(open_time: &str, close_time: &str, last_order_time: &str) -> Self {
        Self {
            open_time: open_time.to_string(),
            close_time: close_time.to_string(),
            last_order_time: last_order_time.to_string(),
        }
    }

    pub fn set(&mut self, field: HoursField, value: &str) {
        let target = match field {
            HoursField::OpenTime => &mut self.open_time,
            HoursField::CloseTime => &mut self.close_time,
            HoursField::LastOrderTime => &mut self.last_order_time,
        };
        *target = value.to_string();
    }

    /// Last order is only worth showing when it is set and differs from closing.
    pub fn shows_last_order(&self) -> bool {
        !self.last_order_time.is_empty() && self.last_order_time != self.close_time
    }

    /// `11:00-22:00(L.O.21:30)`
    pub fn display(&self) -> String {
        if self.shows_last_order() {
            format!(
                "{}-{}(L.O.{})",
                self.open_time, self.close_time, self.last_order_time
            )
        } else {
            format!("{}-{}", self.open_time, self.close_time)
        }
    }

    /// Whether `time` falls inside this slot.
    ///
    /// Orders are not taken after last order, so that is the effective end when present.
    /// `24:00` ends the slot at midnight. A slot with unparsable times never contains anything.
    pub fn contains(&self, time: NaiveTime) -> bool {
        let end = if self.last_order_time.is_empty() {
            &self.close_time
        } else {
            &self.last_order_time
        };
        let minute = time.hour() * 60 + time.minute();
        match (minute_of_day(&self.open_time), minute_of_day(end)) {
            (Some(open), Some(end)) => open <= minute && minute <= end,
            _ => false,
        }
    }
}

impl Default for TimeSlot {
    fn default() -> Self {
        Self::new(DEFAULT_OPEN_TIME, DEFAULT_CLOSE_TIME, DEFAULT_LAST_ORDER_TIME)
    }
}

/// The three editable fields of a slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoursField {
    OpenTime,
    CloseTime,
    LastOrderTime,
}

impl std::str::FromStr for HoursField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open_time" => Ok(HoursField::OpenTime),
            "close_time" => Ok(HoursField::CloseTime),
            "last_order_time" => Ok(HoursField::LastOrderTime),
            _ => Err(AppError::BadRequest(format!("unknown hours field '{}'", s))),
        }
    }
}

/// `HH:MM`, 24 hour, zero padded.
pub fn is_hhmm(value: &str) -> bool {
    value.len() == 5 && value.as_bytes()[2] == b':' && parse_time(value).is_some()
}

pub fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

/// Minutes since midnight, with `24:00` as the end of the day (1440).
fn minute_of_day(value: &str) -> Option<u32> {
    if value == END_OF_DAY {
        return Some(24 * 60);
    }
    parse_time(value).map(|time| time.hour() * 60 + time.minute())
}

/// Parse a request parameter into a time, rejecting anything that is not `HH:MM`.
pub fn require_time(value: &str) -> Result<NaiveTime, AppError> {
    let value = value.trim();
    if !is_hhmm(value) {
        return Err(AppError::InvalidTime(value.to_string()));
    }
    parse_time(value).ok_or_else(|| AppError::InvalidTime(value.to_string()))
}

/// The half-hour choices offered by the hours editor, `00:00` through `23:30`.
pub fn time_options() -> Vec<String> {
    (0..24)
        .flat_map(|hour| [0, 30].map(move |minute| format!("{:02}:{:02}", hour, minute)))
        .collect()
}
