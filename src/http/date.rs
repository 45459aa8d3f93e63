//! HTTP date handling for `Last-Modified` and `If-Modified-Since`

use chrono::{DateTime, Utc};
use std::time::SystemTime;

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Format a timestamp as an IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn format_http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE_FORMAT).to_string()
}

/// Parse an `If-Modified-Since` value.
///
/// Only zero-offset dates (`GMT`, `UT`, `+0000`, `-0000`) are accepted;
/// anything else is ignored rather than converted.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc2822(value.trim()).ok()?;
    if parsed.offset().local_minus_utc() != 0 {
        return None;
    }
    Some(parsed.with_timezone(&Utc))
}

/// Whether a resource modified at `modified` is unchanged since `since`.
///
/// Sub-second precision of the modification time is dropped, matching
/// the resolution of HTTP dates.
pub fn not_modified_since(modified: SystemTime, since: &DateTime<Utc>) -> bool {
    DateTime::<Utc>::from(modified).timestamp() <= since.timestamp()
}
