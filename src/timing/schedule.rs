use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveTime, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{
    common_hours::CommonHours,
    daily::DaySchedule,
    time_slot::{HoursField, TimeSlot, MAX_TIME_SLOTS},
    weekday::Weekday,
};

/// The weekly business hours of a store.
///
/// All 7 days are always present. Values coming from storage or requests should go through
/// [`BusinessHoursData::sanitize`], which tolerates anything older schemas left behind.
///
/// Two editing views share this one value:
/// - simple: [`toggle_closed_day`](Self::toggle_closed_day) and
///   [`apply_common_hours`](Self::apply_common_hours), driven by [`CommonHours`]
/// - detailed: the per-slot operations
///
/// Every mutation is total. Bad indexes are ignored rather than reported, and times are
/// written as given; only [`BusinessHoursData::sanitize`] looks at the shape of the input.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHoursData {
    pub monday: DaySchedule,
    pub tuesday: DaySchedule,
    pub wednesday: DaySchedule,
    pub thursday: DaySchedule,
    pub friday: DaySchedule,
    pub saturday: DaySchedule,
    pub sunday: DaySchedule,
}

impl BusinessHoursData {
    /// Every day open with the same single slot.
    pub fn uniform(slot: TimeSlot) -> Self {
        let mut data = Self::default();
        for day in Weekday::ALL {
            *data.day_mut(day) = DaySchedule::new_open(slot.clone());
        }
        data
    }

    pub fn day(&self, day: Weekday) -> &DaySchedule {
        match day {
            Weekday::Monday => &self.monday,
            Weekday::Tuesday => &self.tuesday,
            Weekday::Wednesday => &self.wednesday,
            Weekday::Thursday => &self.thursday,
            Weekday::Friday => &self.friday,
            Weekday::Saturday => &self.saturday,
            Weekday::Sunday => &self.sunday,
        }
    }

    pub fn day_mut(&mut self, day: Weekday) -> &mut DaySchedule {
        match day {
            Weekday::Monday => &mut self.monday,
            Weekday::Tuesday => &mut self.tuesday,
            Weekday::Wednesday => &mut self.wednesday,
            Weekday::Thursday => &mut self.thursday,
            Weekday::Friday => &mut self.friday,
            Weekday::Saturday => &mut self.saturday,
            Weekday::Sunday => &mut self.sunday,
        }
    }

    pub fn days(&self) -> impl Iterator<Item = (Weekday, &DaySchedule)> {
        Weekday::ALL.into_iter().map(move |day| (day, self.day(day)))
    }

    /// Build a total, well-typed schedule out of whatever was stored.
    ///
    /// - anything that is not an object (including `null`) gives the default schedule
    /// - a missing or non-object day becomes `{is_closed: false, time_slots: []}`
    /// - a non-boolean `is_closed` reads as `false`
    /// - a missing or non-array `time_slots` becomes empty
    /// - slot entries that are not objects are dropped, missing string fields become `""`
    /// - at most [`MAX_TIME_SLOTS`] slots are kept
    pub fn sanitize(raw: &Value) -> Self {
        let mut data = Self::default();
        let Some(object) = raw.as_object() else {
            if !raw.is_null() {
                warn!("business hours are not an object, using defaults");
            }
            return data;
        };
        for day in Weekday::ALL {
            *data.day_mut(day) = match object.get(day.key()) {
                Some(value) => Self::sanitize_day(value),
                None => DaySchedule::default(),
            };
        }
        data
    }

    fn sanitize_day(raw: &Value) -> DaySchedule {
        let is_closed = raw
            .get("is_closed")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let time_slots = match raw.get("time_slots").and_then(Value::as_array) {
            Some(slots) => slots
                .iter()
                .filter_map(Self::sanitize_slot)
                .take(MAX_TIME_SLOTS)
                .collect(),
            None => Vec::new(),
        };
        DaySchedule {
            is_closed,
            time_slots,
        }
    }

    fn sanitize_slot(raw: &Value) -> Option<TimeSlot> {
        let slot = raw.as_object()?;
        let field = |name: &str| {
            slot.get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Some(TimeSlot {
            open_time: field("open_time"),
            close_time: field("close_time"),
            last_order_time: field("last_order_time"),
        })
    }

    /// Sanitize a stored JSON string. Unparsable text is treated like a missing value.
    pub fn from_json_str(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Self::sanitize(&value),
            Err(err) => {
                warn!("stored business hours are not valid json: {}", err);
                Self::default()
            }
        }
    }

    pub fn closed_days(&self) -> BTreeSet<Weekday> {
        self.days()
            .filter(|(_, schedule)| schedule.is_closed)
            .map(|(day, _)| day)
            .collect()
    }

    /// The representative hours for simple mode: the first slot of the first open day that
    /// has one, or the defaults when no such day exists.
    pub fn common_hours(&self) -> CommonHours {
        let closed_days = self.closed_days();
        match self.first_open_slot() {
            Some(slot) => CommonHours::from_slot(slot, closed_days),
            None => CommonHours {
                closed_days,
                ..CommonHours::default()
            },
        }
    }

    fn first_open_slot(&self) -> Option<&TimeSlot> {
        self.days()
            .filter(|(_, schedule)| schedule.is_open())
            .find_map(|(_, schedule)| schedule.first_slot())
    }

    /// Open a closed day with the current common hours, or close an open one.
    pub fn toggle_closed_day(&mut self, day: Weekday) {
        let common = self.common_hours();
        let schedule = self.day_mut(day);
        if schedule.is_closed {
            *schedule = DaySchedule::new_open(common.slot());
        } else {
            *schedule = DaySchedule::new_closed();
        }
        debug!("{} is now {}", day, if schedule.is_closed { "closed" } else { "open" });
    }

    /// Simple-mode write: set one field on the first slot of every open day.
    ///
    /// Open days without slots get a fresh slot built from the common hours. Closed days and
    /// slots after the first are left alone.
    pub fn apply_common_hours(&mut self, field: HoursField, value: &str) {
        let fresh = self.common_hours().slot_with(field, value);
        for day in Weekday::ALL {
            let schedule = self.day_mut(day);
            if schedule.is_closed {
                continue;
            }
            match schedule.time_slots.first_mut() {
                Some(slot) => slot.set(field, value),
                None => schedule.time_slots.push(fresh.clone()),
            }
        }
        debug!("common {:?} set to {}", field, value);
    }

    pub fn update_time_slot(&mut self, day: Weekday, index: usize, field: HoursField, value: &str) {
        match self.day_mut(day).time_slots.get_mut(index) {
            Some(slot) => slot.set(field, value),
            None => warn!("{} has no time slot {}", day, index),
        }
    }

    /// Append a slot seeded from the common hours.
    ///
    /// Returns `false` without changing anything when the day is closed or already holds
    /// [`MAX_TIME_SLOTS`] slots.
    pub fn add_time_slot(&mut self, day: Weekday) -> bool {
        let slot = self.common_hours().slot();
        let schedule = self.day_mut(day);
        if schedule.is_closed || schedule.is_full() {
            debug!("not adding a time slot to {}", day);
            return false;
        }
        schedule.time_slots.push(slot);
        true
    }

    pub fn remove_time_slot(&mut self, day: Weekday, index: usize) {
        let slots = &mut self.day_mut(day).time_slots;
        if index < slots.len() {
            slots.remove(index);
        } else {
            warn!("{} has no time slot {} to remove", day, index);
        }
    }

    /// Empty a day's slots without touching `is_closed`.
    pub fn clear_time_slots(&mut self, day: Weekday) {
        self.day_mut(day).time_slots.clear();
    }

    pub fn is_open_at(&self, day: Weekday, time: NaiveTime) -> bool {
        self.day(day).is_open_at(time)
    }

    pub fn is_open_any_day_at(&self, time: NaiveTime) -> bool {
        Weekday::ALL
            .into_iter()
            .any(|day| self.is_open_at(day, time))
    }

    pub fn is_open(&self, timestamp: DateTime<Tz>) -> bool {
        let day = Weekday::from(timestamp.weekday());
        let Some(time) = NaiveTime::from_hms_opt(timestamp.hour(), timestamp.minute(), 0) else {
            return false;
        };
        self.is_open_at(day, time)
    }

    /// `月曜日: 11:00-22:00(L.O.21:30)`, one line per day.
    pub fn display_lines(&self) -> Vec<String> {
        self.days()
            .map(|(day, schedule)| format!("{}: {}", day.full_label(), schedule.display()))
            .collect()
    }

    /// One line summary for exports, e.g. `営業時間: 11:00-22:00; 定休日: 月、火`.
    pub fn summary_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        let first_slot = self.first_open_slot();

        if let Some(slot) = first_slot {
            parts.push(format!("営業時間: {}-{}", slot.open_time, slot.close_time));
            if slot.shows_last_order() {
                parts.push(format!("ラストオーダー: {}", slot.last_order_time));
            }
        }

        let closed: Vec<&str> = self
            .closed_days()
            .into_iter()
            .map(|day| day.label())
            .collect();
        if !closed.is_empty() {
            parts.push(format!("定休日: {}", closed.join("、")));
        } else if first_slot.is_some() {
            parts.push("定休日: 年中無休".to_string());
        }

        if parts.is_empty() {
            return "営業時間未設定".to_string();
        }
        parts.join("; ")
    }
}
