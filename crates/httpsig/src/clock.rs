//! Freshness checks on the signed timestamp header.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

use crate::canonical::{DATE, HeaderValues, X_DATE};
use crate::error::{SignatureError, SignatureResult};

/// `IMF-fixdate`, the preferred HTTP date format.
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Format a timestamp as an HTTP date.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use httpsig::clock::format_http_date;
///
/// let ts = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
/// assert_eq!(format_http_date(ts), "Sun, 06 Nov 1994 08:49:37 GMT");
/// ```
#[must_use]
pub fn format_http_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format(HTTP_DATE_FORMAT).to_string()
}

/// Parse an HTTP date in `IMF-fixdate` form.
///
/// Parsing is strict: the zone must be the literal `GMT`, and the weekday must
/// agree with the calendar date. Dates in other zones or with a wrong weekday
/// are rejected with [`SignatureError::InvalidDate`].
pub fn parse_http_date(value: &str) -> SignatureResult<DateTime<Utc>> {
    let parsed = NaiveDateTime::parse_from_str(value.trim(), HTTP_DATE_FORMAT)?;
    Ok(parsed.and_utc())
}

/// Check the signed timestamp against the current time.
///
/// See [`check_freshness_at`].
pub fn check_freshness(headers: &HeaderValues, allowed_skew: i64) -> SignatureResult<()> {
    check_freshness_at(headers, allowed_skew, Utc::now())
}

/// Check the signed timestamp against `now`.
///
/// A negative `allowed_skew` disables the check. Zero is rejected as a
/// misconfiguration. `x-date` takes precedence over `date`. Only elapsed time
/// counts: a timestamp in the future always passes.
///
/// # Errors
///
/// Returns [`SignatureError::AllowedClockSkewMisconfigured`] for a zero skew,
/// [`SignatureError::DateHeaderMissingForClockSkew`] when neither timestamp was
/// signed, [`SignatureError::InvalidDate`] when the timestamp does not parse, and
/// [`SignatureError::AllowedClockSkewExceeded`] when it is too old.
pub fn check_freshness_at(
    headers: &HeaderValues,
    allowed_skew: i64,
    now: DateTime<Utc>,
) -> SignatureResult<()> {
    if allowed_skew < 0 {
        return Ok(());
    }
    if allowed_skew == 0 {
        return Err(SignatureError::AllowedClockSkewMisconfigured);
    }

    let value = [X_DATE, DATE]
        .into_iter()
        .filter_map(|name| headers.get(name))
        .find(|value| !value.is_empty())
        .ok_or(SignatureError::DateHeaderMissingForClockSkew)?;

    let signed_at = parse_http_date(value)?;
    let elapsed = (now - signed_at).num_seconds();
    if elapsed > allowed_skew {
        debug!(elapsed, allowed_skew, "Signed timestamp is too old");
        return Err(SignatureError::AllowedClockSkewExceeded);
    }

    Ok(())
}
