use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One of the 7 fixed weekday keys.
///
/// The serialized form is the locale-independent key (`"monday"`); the Japanese labels are
/// only used for display and the legacy text format.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Monday first, the order every listing and projection uses.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }

    /// Single character label, e.g. `月`.
    pub fn label(&self) -> &'static str {
        match self {
            Weekday::Monday => "月",
            Weekday::Tuesday => "火",
            Weekday::Wednesday => "水",
            Weekday::Thursday => "木",
            Weekday::Friday => "金",
            Weekday::Saturday => "土",
            Weekday::Sunday => "日",
        }
    }

    /// Full label, e.g. `月曜日`.
    pub fn full_label(&self) -> &'static str {
        match self {
            Weekday::Monday => "月曜日",
            Weekday::Tuesday => "火曜日",
            Weekday::Wednesday => "水曜日",
            Weekday::Thursday => "木曜日",
            Weekday::Friday => "金曜日",
            Weekday::Saturday => "土曜日",
            Weekday::Sunday => "日曜日",
        }
    }

    pub fn from_key(key: &str) -> Result<Self, AppError> {
        Weekday::ALL
            .into_iter()
            .find(|day| day.key() == key)
            .ok_or_else(|| AppError::InvalidDay(key.to_string()))
    }
}

impl FromStr for Weekday {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Weekday::from_key(s.trim())
    }
}

impl Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(value: chrono::Weekday) -> Self {
        Weekday::ALL[value.num_days_from_monday() as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip() {
        for day in Weekday::ALL {
            assert_eq!(Weekday::from_key(day.key()).unwrap(), day);
        }
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(matches!(
            Weekday::from_key("Monday"),
            Err(AppError::InvalidDay(_))
        ));
        assert!("holiday".parse::<Weekday>().is_err());
    }

    #[test]
    fn converts_from_chrono() {
        assert_eq!(Weekday::from(chrono::Weekday::Mon), Weekday::Monday);
        assert_eq!(Weekday::from(chrono::Weekday::Sun), Weekday::Sunday);
    }

    #[test]
    fn serializes_as_key() {
        let json = serde_json::to_string(&Weekday::Wednesday).unwrap();
        assert_eq!(json, "\"wednesday\"");
    }
}
