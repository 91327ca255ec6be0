//! Caller timezone handling.
//!
//! Clients name their timezone in the `Timezone` header. Naive datetimes in
//! request bodies are read as wall-clock time in that zone and every instant
//! in a response is rendered back in it.

use crate::error::{RegistrationError, Result};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, de};
use std::convert::Infallible;

/// Header carrying the caller's IANA timezone name.
pub const TIMEZONE_HEADER: &str = "Timezone";

/// Zone used when the caller sends none or an unknown one.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Kolkata;

/// Display format for instants: `25/09/2025 07:50 PM`.
pub const DISPLAY_FORMAT: &str = "%d/%m/%Y %I:%M %p";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M%:z"];

/// Resolve a header value, falling back to `default` when absent or unknown.
#[must_use]
pub fn resolve(header: Option<&str>, default: Tz) -> Tz {
    match header.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => name.parse::<Tz>().unwrap_or_else(|_| {
            tracing::debug!(timezone = name, "Unknown timezone, using default");
            default
        }),
        None => default,
    }
}

/// Parse a configured timezone name, falling back to [`DEFAULT_TIMEZONE`].
#[must_use]
pub fn parse_or_default(name: &str) -> Tz {
    resolve(Some(name), DEFAULT_TIMEZONE)
}

/// Render an instant as wall-clock time in `tz`.
#[must_use]
pub fn format_local(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format(DISPLAY_FORMAT).to_string()
}

/// A datetime as written by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeInput {
    /// Carries its own UTC offset
    Absolute(DateTime<FixedOffset>),
    /// Wall-clock time, interpreted in the caller's zone
    Naive(NaiveDateTime),
}

impl TimeInput {
    /// Parse RFC 3339 (or `YYYY-MM-DDTHH:MM±HH:MM`) or a naive
    /// `YYYY-MM-DD[T ]HH:MM[:SS[.fff]]` string.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self::Absolute(dt));
        }
        let normalized = raw.replace('Z', "+00:00");
        if let Some(dt) = OFFSET_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(&normalized, fmt).ok())
        {
            return Some(Self::Absolute(dt));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(Self::Naive)
    }

    /// Resolve to an absolute instant.
    ///
    /// Ambiguous wall-clock times take the earlier instant.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::InvalidInput`] for `field` when a naive
    /// time falls into a gap of `tz` (daylight saving transition).
    pub fn to_utc(self, tz: Tz, field: &'static str) -> Result<DateTime<Utc>> {
        match self {
            Self::Absolute(dt) => Ok(dt.with_timezone(&Utc)),
            Self::Naive(naive) => tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| {
                    RegistrationError::invalid(
                        field,
                        format!("{naive} does not exist in timezone {}.", tz.name()),
                    )
                }),
        }
    }
}

impl<'de> Deserialize<'de> for TimeInput {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| {
            de::Error::custom(
                "Datetime has wrong format. Use one of these formats instead: \
                 YYYY-MM-DDThh:mm[:ss[.uuuuuu]][+HH:MM|-HH:MM|Z].",
            )
        })
    }
}

/// Server-wide default zone, pulled from application state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DefaultTimezone(pub Tz);

impl Default for DefaultTimezone {
    fn default() -> Self {
        Self(DEFAULT_TIMEZONE)
    }
}

/// The zone the current request should be read and rendered in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallerTimezone(pub Tz);

#[async_trait]
impl<S> FromRequestParts<S> for CallerTimezone
where
    DefaultTimezone: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let DefaultTimezone(default) = DefaultTimezone::from_ref(state);
        let header = parts
            .headers
            .get(TIMEZONE_HEADER)
            .and_then(|v| v.to_str().ok());

        Ok(Self(resolve(header, default)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::Request;
    use chrono_tz::America::New_York;

    #[test]
    fn unknown_zone_falls_back() {
        assert_eq!(resolve(Some("Mars/Olympus"), DEFAULT_TIMEZONE), DEFAULT_TIMEZONE);
        assert_eq!(resolve(None, chrono_tz::UTC), chrono_tz::UTC);
        assert_eq!(resolve(Some(" America/New_York "), DEFAULT_TIMEZONE), New_York);
    }

    #[test]
    fn naive_input_is_read_in_caller_zone() {
        let input = TimeInput::parse("2025-09-25T10:20:00").unwrap();
        let instant = input.to_utc(New_York, "start_time").unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2025, 9, 25, 14, 20, 0).unwrap());
        assert_eq!(format_local(instant, DEFAULT_TIMEZONE), "25/09/2025 07:50 PM");
    }

    #[test]
    fn offset_input_ignores_caller_zone() {
        let input = TimeInput::parse("2025-09-25T10:20:00+05:30").unwrap();
        let instant = input.to_utc(New_York, "start_time").unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2025, 9, 25, 4, 50, 0).unwrap());

        let zulu = TimeInput::parse("2025-09-25T10:20Z").unwrap();
        assert!(matches!(zulu, TimeInput::Absolute(_)));
    }

    #[test]
    fn minutes_only_and_space_separator() {
        assert!(matches!(TimeInput::parse("2025-09-25T10:20"), Some(TimeInput::Naive(_))));
        assert!(matches!(TimeInput::parse("2025-09-25 10:20:30.5"), Some(TimeInput::Naive(_))));
        assert!(TimeInput::parse("25/09/2025").is_none());
    }

    #[test]
    fn dst_gap_is_rejected() {
        let input = TimeInput::parse("2025-03-09T02:30").unwrap();
        let err = input.to_utc(New_York, "start_time").unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidInput { field: "start_time", .. }));
    }

    #[test]
    fn ambiguous_time_takes_earliest() {
        let input = TimeInput::parse("2025-11-02T01:30").unwrap();
        let instant = input.to_utc(New_York, "start_time").unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2025, 11, 2, 5, 30, 0).unwrap());
    }

    #[test]
    fn deserializes_from_json_string() {
        let parsed: TimeInput = serde_json::from_str("\"2025-09-25T10:20\"").unwrap();
        assert!(matches!(parsed, TimeInput::Naive(_)));
        assert!(serde_json::from_str::<TimeInput>("\"tomorrow\"").is_err());
    }

    #[tokio::test]
    async fn extractor_uses_state_default() {
        let req = Request::builder().body(()).expect("Valid request");
        let (mut parts, _) = req.into_parts();
        let state = DefaultTimezone(New_York);

        let CallerTimezone(tz) = CallerTimezone::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(tz, New_York);

        let req = Request::builder()
            .header(TIMEZONE_HEADER, "Europe/Paris")
            .body(())
            .expect("Valid request");
        let (mut parts, _) = req.into_parts();
        let CallerTimezone(tz) = CallerTimezone::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(tz, chrono_tz::Europe::Paris);
    }
}
