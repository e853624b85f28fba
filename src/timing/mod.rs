pub mod common_hours;
pub mod daily;
pub mod jst_datetime_now;
pub mod schedule;
pub mod time_slot;
pub mod weekday;
