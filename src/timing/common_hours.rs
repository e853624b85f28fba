use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{
    time_slot::{HoursField, TimeSlot, DEFAULT_CLOSE_TIME, DEFAULT_LAST_ORDER_TIME, DEFAULT_OPEN_TIME},
    weekday::Weekday,
};

/// The simple-mode projection: one open/close/last-order triple for every open day plus the
/// set of closed days.
///
/// Never stored. It is derived from `BusinessHoursData::common_hours` whenever it is needed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonHours {
    pub open_time: String,
    pub close_time: String,
    pub last_order_time: String,
    #[serde(rename = "closedDays")]
    pub closed_days: BTreeSet<Weekday>,
}

impl CommonHours {
    pub fn from_slot(slot: &TimeSlot, closed_days: BTreeSet<Weekday>) -> Self {
        Self {
            open_time: slot.open_time.clone(),
            close_time: slot.close_time.clone(),
            last_order_time: slot.last_order_time.clone(),
            closed_days,
        }
    }

    pub fn slot(&self) -> TimeSlot {
        TimeSlot::new(&self.open_time, &self.close_time, &self.last_order_time)
    }

    /// The representative slot with one field replaced.
    pub fn slot_with(&self, field: HoursField, value: &str) -> TimeSlot {
        let mut slot = self.slot();
        slot.set(field, value);
        slot
    }

    pub fn is_closed(&self, day: Weekday) -> bool {
        self.closed_days.contains(&day)
    }
}

impl Default for CommonHours {
    fn default() -> Self {
        Self {
            open_time: DEFAULT_OPEN_TIME.to_string(),
            close_time: DEFAULT_CLOSE_TIME.to_string(),
            last_order_time: DEFAULT_LAST_ORDER_TIME.to_string(),
            closed_days: BTreeSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_days_serialize_in_weekday_order() {
        let hours = CommonHours {
            closed_days: [Weekday::Sunday, Weekday::Monday].into_iter().collect(),
            ..CommonHours::default()
        };
        let json = serde_json::to_value(&hours).unwrap();
        assert_eq!(json["closedDays"], serde_json::json!(["monday", "sunday"]));
        assert_eq!(json["open_time"], "11:00");
    }

    #[test]
    fn slot_with_replaces_one_field() {
        let slot = CommonHours::default().slot_with(HoursField::CloseTime, "23:00");
        assert_eq!(slot, TimeSlot::new("11:00", "23:00", "21:30"));
    }
}
