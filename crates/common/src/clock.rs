//! Timestamp parsing for story metadata and timeline records.
//!
//! Story exports carry capture times in several textual shapes depending on
//! whether they came from EXIF data or from the export itself. Every accepted
//! shape is normalized to a UTC instant; naive forms are read as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Naive date-time layouts tried after RFC 3339, in order.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y:%m:%d %H:%M:%S",
    "%Y%m%dT%H%M%S%.f",
];

/// The textual form a timestamp was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampForm {
    /// Integer seconds since the Unix epoch.
    UnixSeconds,
    /// RFC 3339 with an explicit zone (`Z` or offset).
    Rfc3339,
    /// ISO-8601 without a zone, or with a bare trailing `Z`.
    NaiveIso,
    /// ISO-8601 calendar date with no time of day.
    IsoDate,
    /// EXIF style `%Y:%m:%d %H:%M:%S`.
    Exif,
    /// Compact `%Y%m%dT%H%M%S`, optionally with fraction and `Z`.
    Compact,
}

/// A timestamp string matched none of the accepted forms.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognized timestamp format: {input:?}")]
pub struct TimestampError {
    pub input: String,
}

/// Parse a timestamp in any accepted form.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, TimestampError> {
    parse_timestamp_with_form(input).map(|(instant, _)| instant)
}

/// Parse a timestamp and report which form it was recognized as.
pub fn parse_timestamp_with_form(
    input: &str,
) -> Result<(DateTime<Utc>, TimestampForm), TimestampError> {
    let trimmed = input.trim();
    let unrecognized = || TimestampError {
        input: input.to_string(),
    };

    if trimmed.is_empty() {
        return Err(unrecognized());
    }

    if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let secs: i64 = trimmed.parse().map_err(|_| unrecognized())?;
        return DateTime::from_timestamp(secs, 0)
            .map(|t| (t, TimestampForm::UnixSeconds))
            .ok_or_else(unrecognized);
    }

    if let Ok(t) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok((t.with_timezone(&Utc), TimestampForm::Rfc3339));
    }

    let naive = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    for format in NAIVE_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(naive, format) {
            let form = match *format {
                "%Y:%m:%d %H:%M:%S" => TimestampForm::Exif,
                "%Y%m%dT%H%M%S%.f" => TimestampForm::Compact,
                _ => TimestampForm::NaiveIso,
            };
            return Ok((t.and_utc(), form));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(naive, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(unrecognized)?;
        return Ok((midnight.and_utc(), TimestampForm::IsoDate));
    }

    Err(unrecognized())
}

/// Parse epoch milliseconds as written by legacy timeline exports.
pub fn parse_epoch_millis(input: &str) -> Option<DateTime<Utc>> {
    let millis: i64 = input.trim().parse().ok()?;
    DateTime::from_timestamp_millis(millis)
}

/// Convert a fractional hour count into a signed duration.
///
/// Values beyond the representable range saturate; NaN maps to zero.
pub fn hours_to_duration(hours: f64) -> chrono::Duration {
    if hours.is_nan() {
        return chrono::Duration::zero();
    }
    let millis = (hours * 3_600_000.0).round() as i64;
    chrono::Duration::try_milliseconds(millis).unwrap_or(if hours > 0.0 {
        chrono::Duration::MAX
    } else {
        chrono::Duration::MIN
    })
}
