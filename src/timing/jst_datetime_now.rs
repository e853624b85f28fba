use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Stores are all in Japan, so "open now" is always judged in Tokyo time.
pub fn jst_datetime_now() -> DateTime<Tz> {
    Utc::now().with_timezone(&chrono_tz::Asia::Tokyo)
}
