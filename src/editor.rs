use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    legacy::text::parse_legacy_text,
    timing::{
        common_hours::CommonHours,
        schedule::BusinessHoursData,
        time_slot::HoursField,
        weekday::Weekday,
    },
};

/// Which view of the hours the form is showing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    /// One set of hours for every open day, plus closed-day toggles.
    #[default]
    Simple,
    /// Per-day slots, up to 3 per day.
    Detailed,
}

/// One user interaction with the hours editor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EditAction {
    SetMode { mode: EditMode },
    ToggleClosedDay { day: Weekday },
    SetCommonHours { field: HoursField, value: String },
    UpdateTimeSlot { day: Weekday, index: usize, field: HoursField, value: String },
    AddTimeSlot { day: Weekday },
    RemoveTimeSlot { day: Weekday, index: usize },
    ClearTimeSlots { day: Weekday },
}

impl EditAction {
    /// Whether the action belongs to the given view. Mode switches and closed-day toggles are
    /// available in both.
    pub fn allowed_in(&self, mode: EditMode) -> bool {
        match self {
            EditAction::SetMode { .. } | EditAction::ToggleClosedDay { .. } => true,
            EditAction::SetCommonHours { .. } => mode == EditMode::Simple,
            EditAction::UpdateTimeSlot { .. }
            | EditAction::AddTimeSlot { .. }
            | EditAction::RemoveTimeSlot { .. }
            | EditAction::ClearTimeSlots { .. } => mode == EditMode::Detailed,
        }
    }
}

/// An open hours-editing session.
///
/// Both views read and write the same [`BusinessHoursData`]; there is nothing to commit when
/// switching between them. The simple view's [`CommonHours`] is re-derived on every read, so
/// detailed edits show up there as long as they touch a first slot.
#[derive(Clone, Debug, Default)]
pub struct HoursEditor {
    data: BusinessHoursData,
    mode: EditMode,
}

impl HoursEditor {
    pub fn new(data: BusinessHoursData) -> Self {
        Self {
            data,
            mode: EditMode::default(),
        }
    }

    /// Start from a record that only has the old free-text hours.
    pub fn from_legacy_text(text: &str) -> Self {
        Self::new(parse_legacy_text(text))
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: EditMode) {
        debug!("hours editor switched to {:?}", mode);
        self.mode = mode;
    }

    /// Hand the hours over for submission.
    pub fn into_data(self) -> BusinessHoursData {
        self.data
    }

    pub fn common_hours(&self) -> CommonHours {
        self.data.common_hours()
    }

    pub fn toggle_closed_day(&mut self, day: Weekday) {
        self.data.toggle_closed_day(day);
    }

    pub fn apply_common_hours(&mut self, field: HoursField, value: &str) {
        self.data.apply_common_hours(field, value);
    }

    pub fn update_time_slot(&mut self, day: Weekday, index: usize, field: HoursField, value: &str) {
        self.data.update_time_slot(day, index, field, value);
    }

    pub fn add_time_slot(&mut self, day: Weekday) -> bool {
        self.data.add_time_slot(day)
    }

    pub fn remove_time_slot(&mut self, day: Weekday, index: usize) {
        self.data.remove_time_slot(day, index);
    }

    pub fn clear_time_slots(&mut self, day: Weekday) {
        self.data.clear_time_slots(day);
    }

    /// Apply one interaction if it belongs to the current view. Returns whether it was applied.
    pub fn apply(&mut self, action: EditAction) -> bool {
        if !action.allowed_in(self.mode) {
            debug!("{:?} is not available in {:?} mode", action, self.mode);
            return false;
        }
        match action {
            EditAction::SetMode { mode } => self.set_mode(mode),
            EditAction::ToggleClosedDay { day } => self.toggle_closed_day(day),
            EditAction::SetCommonHours { field, value } => self.apply_common_hours(field, &value),
            EditAction::UpdateTimeSlot {
                day,
                index,
                field,
                value,
            } => self.update_time_slot(day, index, field, &value),
            EditAction::AddTimeSlot { day } => return self.add_time_slot(day),
            EditAction::RemoveTimeSlot { day, index } => self.remove_time_slot(day, index),
            EditAction::ClearTimeSlots { day } => self.clear_time_slots(day),
        }
        true
    }
}
