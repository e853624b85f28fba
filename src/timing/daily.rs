use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::time_slot::{TimeSlot, MAX_TIME_SLOTS};

/// The schedule for one weekday.
///
/// A closed day has no slots. An open day normally has 1 to 3; an open day with none means
/// the hours are unspecified.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub is_closed: bool,
    pub time_slots: Vec<TimeSlot>,
}

impl DaySchedule {
    pub fn new_open(slot: TimeSlot) -> Self {
        Self {
            is_closed: false,
            time_slots: vec![slot],
        }
    }

    pub fn new_closed() -> Self {
        Self {
            is_closed: true,
            time_slots: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        !self.is_closed
    }

    pub fn first_slot(&self) -> Option<&TimeSlot> {
        self.time_slots.first()
    }

    pub fn is_full(&self) -> bool {
        self.time_slots.len() >= MAX_TIME_SLOTS
    }

    pub fn is_open_at(&self, time: NaiveTime) -> bool {
        self.is_open() && self.time_slots.iter().any(|slot| slot.contains(time))
    }

    /// `定休日`, `営業時間未設定` or the slots joined by `, `.
    pub fn display(&self) -> String {
        if self.is_closed {
            return "定休日".to_string();
        }
        if self.time_slots.is_empty() {
            return "営業時間未設定".to_string();
        }
        self.time_slots
            .iter()
            .map(TimeSlot::display)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::time_slot::parse_time;

    #[test]
    fn closed_day_is_never_open() {
        let mut day = DaySchedule::new_closed();
        // Stale slots left on a closed record must not count.
        day.time_slots.push(TimeSlot::default());
        assert!(!day.is_open_at(parse_time("12:00").unwrap()));
    }

    #[test]
    fn split_hours_gap() {
        let day = DaySchedule {
            is_closed: false,
            time_slots: vec![
                TimeSlot::new("11:00", "14:00", "13:30"),
                TimeSlot::new("17:00", "22:00", "21:30"),
            ],
        };
        assert!(day.is_open_at(parse_time("12:00").unwrap()));
        assert!(!day.is_open_at(parse_time("15:00").unwrap()));
        assert!(day.is_open_at(parse_time("18:00").unwrap()));
        assert_eq!(
            day.display(),
            "11:00-14:00(L.O.13:30), 17:00-22:00(L.O.21:30)"
        );
    }

    #[test]
    fn open_until_midnight() {
        let day = DaySchedule::new_open(TimeSlot::new("18:00", "24:00", "24:00"));
        assert!(day.is_open_at(parse_time("23:00").unwrap()));
        assert!(!day.is_open_at(parse_time("12:00").unwrap()));
        assert_eq!(day.display(), "18:00-24:00");
    }

    #[test]
    fn display_states() {
        assert_eq!(DaySchedule::new_closed().display(), "定休日");
        assert_eq!(DaySchedule::default().display(), "営業時間未設定");
    }
}
