use std::{collections::BTreeSet, sync::OnceLock};

use regex::{Captures, Regex};
use tracing::debug;

use crate::timing::{
    common_hours::CommonHours, daily::DaySchedule, schedule::BusinessHoursData,
    time_slot::{DEFAULT_CLOSE_TIME, DEFAULT_LAST_ORDER_TIME, DEFAULT_OPEN_TIME},
    weekday::Weekday,
};

/// Codec for the old free-text business hours field.
///
/// The text only ever held one set of hours plus a list of closed days, so both directions go
/// through [`CommonHours`]. Parsing is a best-effort heuristic used to migrate old records;
/// split hours and per-day differences do not survive it.
///
/// ```text
/// 営業時間: 11:00-22:00
/// ラストオーダー: 21:30
/// 定休日: 月曜日、火曜日
/// ```
pub struct LegacyCodec {
    closed_days_regex: Regex,
    time_range_regex: Regex,
    last_order_regex: Regex,
}

impl LegacyCodec {
    pub fn new() -> Self {
        Self {
            closed_days_regex: Regex::new(r"(?i)定休日[：:]\s*([^\r\n]+?)(?:\n|$)").unwrap(),
            time_range_regex: Regex::new(r"([0-9]{1,2}):([0-9]{2})[-～〜]([0-9]{1,2}):([0-9]{2})")
                .unwrap(),
            last_order_regex: Regex::new(
                r"(?i)(?:ラストオーダー|L\.O\.?|LO)[：:\s]*([0-9]{1,2}):([0-9]{2})",
            )
            .unwrap(),
        }
    }

    /// Extract the common hours from legacy text. Anything not found falls back to the
    /// defaults (11:00-22:00, last order 21:30, no closed days).
    pub fn parse_common(&self, text: &str) -> CommonHours {
        if text.is_empty() {
            return CommonHours::default();
        }

        let closed_days = match self.closed_days_regex.captures(text) {
            Some(captures) => Self::parse_closed_days(captures.get(1).map_or("", |m| m.as_str())),
            None => BTreeSet::new(),
        };

        let (open_time, close_time) = match self.time_range_regex.captures(text) {
            Some(captures) => (
                Self::padded_time(&captures, 1, 2),
                Self::padded_time(&captures, 3, 4),
            ),
            None => (DEFAULT_OPEN_TIME.to_string(), DEFAULT_CLOSE_TIME.to_string()),
        };

        let last_order_time = match self.last_order_regex.captures(text) {
            Some(captures) => Self::padded_time(&captures, 1, 2),
            None => DEFAULT_LAST_ORDER_TIME.to_string(),
        };

        debug!(
            "parsed legacy hours {}-{} (L.O. {}), {} closed day(s)",
            open_time,
            close_time,
            last_order_time,
            closed_days.len()
        );
        CommonHours {
            open_time,
            close_time,
            last_order_time,
            closed_days,
        }
    }

    /// Closed days come out with no slots, every other day gets the parsed hours.
    pub fn parse(&self, text: &str) -> BusinessHoursData {
        let common = self.parse_common(text);
        let mut data = BusinessHoursData::uniform(common.slot());
        for day in &common.closed_days {
            *data.day_mut(*day) = DaySchedule::new_closed();
        }
        data
    }

    pub fn generate_common(&self, hours: &CommonHours) -> String {
        let mut parts: Vec<String> = Vec::new();

        parts.push(format!("営業時間: {}-{}", hours.open_time, hours.close_time));

        if !hours.last_order_time.is_empty() && hours.last_order_time != hours.close_time {
            parts.push(format!("ラストオーダー: {}", hours.last_order_time));
        }

        if hours.closed_days.is_empty() {
            parts.push("定休日: 年中無休".to_string());
        } else {
            let labels: Vec<&str> = hours.closed_days.iter().map(|day| day.full_label()).collect();
            parts.push(format!("定休日: {}", labels.join("、")));
        }

        parts.join("\n")
    }

    /// Render structured hours in the legacy format via their common-hours projection.
    pub fn generate(&self, data: &BusinessHoursData) -> String {
        self.generate_common(&data.common_hours())
    }

    /// Full labels win over single characters. `日` is part of every full label, so on its
    /// own it only means Sunday when the list is exactly `日` or mentions `日曜`.
    fn parse_closed_days(text: &str) -> BTreeSet<Weekday> {
        Weekday::ALL
            .into_iter()
            .filter(|day| {
                if text.contains(day.full_label()) {
                    true
                } else if *day != Weekday::Sunday {
                    text.contains(day.label())
                } else {
                    text.contains("日曜") || text == "日"
                }
            })
            .collect()
    }

    fn padded_time(captures: &Captures, hour: usize, minute: usize) -> String {
        let hour = captures.get(hour).map_or("", |m| m.as_str());
        let minute = captures.get(minute).map_or("", |m| m.as_str());
        format!("{:0>2}:{}", hour, minute)
    }
}

impl Default for LegacyCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn shared_codec() -> &'static LegacyCodec {
    static CODEC: OnceLock<LegacyCodec> = OnceLock::new();
    CODEC.get_or_init(LegacyCodec::new)
}

pub fn parse_legacy_text(text: &str) -> BusinessHoursData {
    shared_codec().parse(text)
}

pub fn generate_legacy_text(data: &BusinessHoursData) -> String {
    shared_codec().generate(data)
}
