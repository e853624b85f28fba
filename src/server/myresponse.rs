use serde::Serialize;

use crate::{
    database::store::Store,
    editor::{EditMode, HoursEditor},
    timing::{
        common_hours::CommonHours, jst_datetime_now::jst_datetime_now,
        schedule::BusinessHoursData,
    },
};

/// Business hours as the edit form and the detail page want them.
#[derive(Serialize, Clone)]
pub struct HoursResponse {
    business_hours: BusinessHoursData,
    common_hours: CommonHours,
    display: Vec<String>,
    summary: String,
}

impl HoursResponse {
    pub fn new(business_hours: BusinessHoursData) -> Self {
        Self::with_common_hours(business_hours.common_hours(), business_hours)
    }

    fn with_common_hours(common_hours: CommonHours, business_hours: BusinessHoursData) -> Self {
        Self {
            common_hours,
            display: business_hours.display_lines(),
            summary: business_hours.summary_text(),
            business_hours,
        }
    }
}

#[derive(Serialize, Clone)]
pub struct StoreResponse {
    id: i64,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    legacy_hours: Option<String>,
    created_at: String,
    updated_at: String,
    /// Whether the store is open right now, Tokyo time.
    open_now: bool,
    #[serde(flatten)]
    hours: HoursResponse,
}

impl StoreResponse {
    pub fn new(store: Store) -> Self {
        Self {
            id: store.id,
            name: store.name,
            legacy_hours: store.legacy_hours,
            created_at: store.created_at,
            updated_at: store.updated_at,
            open_now: store.business_hours.is_open(jst_datetime_now()),
            hours: HoursResponse::new(store.business_hours),
        }
    }
}

/// Result of replaying editor actions.
#[derive(Serialize, Clone)]
pub struct EditResponse {
    mode: EditMode,
    applied: Vec<bool>,
    #[serde(flatten)]
    hours: HoursResponse,
}

impl EditResponse {
    /// Close the editing session, reporting the mode and common hours it ended with.
    pub fn new(editor: HoursEditor, applied: Vec<bool>) -> Self {
        let mode = editor.mode();
        let common_hours = editor.common_hours();
        Self {
            mode,
            applied,
            hours: HoursResponse::with_common_hours(common_hours, editor.into_data()),
        }
    }
}
