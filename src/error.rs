use thiserror::Error;

/// Errors surfaced by the service layers.
///
/// The business-hours model itself never fails: malformed input is neutralized by
/// `BusinessHoursData::sanitize`. Everything here comes from the edges (database,
/// request parsing, configuration).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("could not get a database connection: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid business day '{0}', must be one of: monday, tuesday, wednesday, thursday, friday, saturday, sunday")]
    InvalidDay(String),

    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_day_lists_valid_keys() {
        let err = AppError::InvalidDay("funday".to_string());
        let message = err.to_string();
        assert!(message.contains("funday"));
        assert!(message.contains("sunday"));
    }

    #[test]
    fn json_errors_convert() {
        let err: AppError = serde_json::from_str::<u8>("nope").unwrap_err().into();
        assert!(matches!(err, AppError::Json(_)));
    }
}
