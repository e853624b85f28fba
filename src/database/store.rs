use serde::{Deserialize, Serialize};

use crate::timing::schedule::BusinessHoursData;

/// A store row with its hours already sanitized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: i64,
    pub name: String,
    pub business_hours: BusinessHoursData,
    /// Free-text hours from before the structured format, if the record has any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy_hours: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Create store payload.
///
/// `business_hours` is kept as raw JSON so it can be sanitized instead of rejected.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewStore {
    pub name: String,
    #[serde(default)]
    pub business_hours: Option<serde_json::Value>,
    #[serde(default)]
    pub legacy_hours: Option<String>,
}
