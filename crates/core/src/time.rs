//! Timestamp parsing and normalization.
//!
//! Every timestamp leaving the system is UTC with millisecond precision, and
//! every duration is a whole number of minutes rounded half-up.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Timelike, Utc};

use crate::error::ChronologiconError;

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Offset-bearing layouts accepted after RFC 3339 fails: optional seconds and
/// colon-less offsets.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
];

/// Offset-less layouts, tried last. Interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Round a millisecond span to whole minutes, half-up.
pub fn round_minutes(millis: i64) -> i64 {
    (millis + MILLIS_PER_MINUTE / 2).div_euclid(MILLIS_PER_MINUTE)
}

/// Minutes from `start` to `end`, rounded half-up. Negative if `end < start`.
pub fn minutes_between(start: &DateTime<Utc>, end: &DateTime<Utc>) -> i64 {
    round_minutes((*end - *start).num_milliseconds())
}

/// Drop sub-millisecond precision.
pub fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = ts.nanosecond() / 1_000_000 * 1_000_000;
    ts.with_nanosecond(nanos).unwrap_or(ts)
}

/// Render as `YYYY-MM-DDTHH:MM:SS.fffZ`.
pub fn to_iso_millis(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a calendar timestamp that carries an explicit time component.
///
/// Accepts `YYYY-MM-DDTHH:MM[:SS[.fff]]` followed by `Z`, a `+HH:MM` or
/// `+HHMM` offset, or nothing (taken as UTC). Date-only strings such as
/// `2023-01-01` are rejected.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ChronologiconError> {
    let trimmed = raw.trim();
    if !trimmed.contains('T') {
        return Err(ChronologiconError::InvalidTimestamp(raw.to_string()));
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(truncate_to_millis(ts.with_timezone(&Utc)));
    }

    if let Some(ts) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(trimmed, fmt).ok())
    {
        return Ok(truncate_to_millis(ts.with_timezone(&Utc)));
    }

    // A trailing `Z` on a layout RFC 3339 refused (e.g. no seconds) is UTC.
    let local = trimmed
        .strip_suffix('Z')
        .or_else(|| trimmed.strip_suffix('z'))
        .unwrap_or(trimmed);

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(local, fmt).ok())
        .map(|naive| truncate_to_millis(Utc.from_utc_datetime(&naive)))
        .ok_or_else(|| ChronologiconError::InvalidTimestamp(raw.to_string()))
}

/// Serde adapter writing `DateTime<Utc>` as millisecond ISO-8601.
pub mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::to_iso_millis(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }

    /// Same format for `Option<DateTime<Utc>>`; `None` becomes `null`.
    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            ts: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => s.serialize_some(&super::super::to_iso_millis(ts)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<String>::deserialize(d)?
                .map(|raw| super::super::parse_timestamp(&raw).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_minutes_half_up() {
        assert_eq!(round_minutes(0), 0);
        assert_eq!(round_minutes(29_999), 0);
        assert_eq!(round_minutes(30_000), 1);
        assert_eq!(round_minutes(90 * 60_000), 90);
        assert_eq!(round_minutes(-90_000), -1);
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let ts = parse_timestamp("2023-01-01T12:00:00+02:00").unwrap();
        assert_eq!(to_iso_millis(&ts), "2023-01-01T10:00:00.000Z");
    }

    #[test]
    fn test_parse_naive_is_utc() {
        let ts = parse_timestamp("2023-01-01T10:30").unwrap();
        assert_eq!(to_iso_millis(&ts), "2023-01-01T10:30:00.000Z");

        let ts = parse_timestamp("2023-01-01T10:30:15.5").unwrap();
        assert_eq!(to_iso_millis(&ts), "2023-01-01T10:30:15.500Z");
    }

    #[test]
    fn test_parse_minutes_only_with_zulu() {
        let ts = parse_timestamp("2023-01-01T10:00Z").unwrap();
        assert_eq!(to_iso_millis(&ts), "2023-01-01T10:00:00.000Z");
    }

    #[test]
    fn test_parse_minutes_only_with_offset() {
        let ts = parse_timestamp("2023-01-01T10:00+02:00").unwrap();
        assert_eq!(to_iso_millis(&ts), "2023-01-01T08:00:00.000Z");

        let ts = parse_timestamp("2023-01-01T10:00-0130").unwrap();
        assert_eq!(to_iso_millis(&ts), "2023-01-01T11:30:00.000Z");
    }

    #[test]
    fn test_parse_colonless_offset() {
        let ts = parse_timestamp("2023-01-01T10:00:00.000+0530").unwrap();
        assert_eq!(to_iso_millis(&ts), "2023-01-01T04:30:00.000Z");

        let ts = parse_timestamp("2023-01-01T10:00:00+0530").unwrap();
        assert_eq!(to_iso_millis(&ts), "2023-01-01T04:30:00.000Z");
    }

    #[test]
    fn test_parse_rejects_date_only() {
        assert!(parse_timestamp("2023-01-01").is_err());
        assert!(parse_timestamp("not a date").is_err());
        assert!(parse_timestamp("2023-13-01T00:00:00Z").is_err());
    }

    #[test]
    fn test_truncates_sub_millisecond() {
        let ts = parse_timestamp("2023-01-01T00:00:00.123456789Z").unwrap();
        assert_eq!(to_iso_millis(&ts), "2023-01-01T00:00:00.123Z");
    }

    #[test]
    fn test_minutes_between() {
        let a = parse_timestamp("2023-01-01T10:00:00Z").unwrap();
        let b = parse_timestamp("2023-01-01T11:30:00Z").unwrap();
        assert_eq!(minutes_between(&a, &b), 90);
        assert_eq!(minutes_between(&a, &a), 0);
    }
}
