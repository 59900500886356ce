use std::fmt;

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// The fixed human-readable pattern used on the wire and in snapshots.
pub const DATE_TIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// Creation time of a message, at whole-second resolution (UTC).
///
/// Serialized as `DD-MM-YYYY HH:MM:SS`. Sub-second precision is dropped on
/// construction so that formatting and parsing round-trip exactly.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageTimestamp(NaiveDateTime);

impl MessageTimestamp {
    /// The current wall-clock time.
    pub fn now() -> Self {
        Self::from_naive(Utc::now().naive_utc())
    }

    /// Parse the `DD-MM-YYYY HH:MM:SS` form.
    pub fn parse(value: &str) -> Result<Self, TypeError> {
        NaiveDateTime::parse_from_str(value.trim(), DATE_TIME_FORMAT)
            .map(Self)
            .map_err(|_| TypeError::InvalidDateTime {
                value: value.to_string(),
            })
    }

    /// Build from milliseconds since the UNIX epoch.
    pub fn from_epoch_millis(ms: i64) -> Result<Self, TypeError> {
        DateTime::from_timestamp_millis(ms)
            .map(|dt| Self::from_naive(dt.naive_utc()))
            .ok_or(TypeError::TimestampOutOfRange(ms))
    }

    /// Milliseconds since the UNIX epoch.
    pub fn epoch_millis(&self) -> i64 {
        self.0.and_utc().timestamp_millis()
    }

    fn from_naive(naive: NaiveDateTime) -> Self {
        Self(naive.with_nanosecond(0).unwrap_or(naive))
    }
}

impl fmt::Debug for MessageTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageTimestamp({self})")
    }
}

impl fmt::Display for MessageTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_TIME_FORMAT))
    }
}

impl Serialize for MessageTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MessageTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        DateTimeInput::deserialize(deserializer)?
            .resolve()
            .map_err(serde::de::Error::custom)
    }
}

/// A date-time as a client may submit it: the formatted string or an
/// epoch-millisecond number.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateTimeInput {
    Millis(i64),
    Text(String),
}

impl DateTimeInput {
    /// Validate into a [`MessageTimestamp`].
    pub fn resolve(&self) -> Result<MessageTimestamp, TypeError> {
        match self {
            Self::Millis(ms) => MessageTimestamp::from_epoch_millis(*ms),
            Self::Text(text) => MessageTimestamp::parse(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_format_roundtrip() {
        let ts = MessageTimestamp::parse("05-03-2024 14:07:09").unwrap();
        assert_eq!(ts.to_string(), "05-03-2024 14:07:09");
    }

    #[test]
    fn rejects_malformed_string() {
        let err = MessageTimestamp::parse("2024-03-05T14:07:09").unwrap_err();
        assert!(matches!(err, TypeError::InvalidDateTime { .. }));
        assert!(MessageTimestamp::parse("32-01-2024 00:00:00").is_err());
    }

    #[test]
    fn epoch_millis_drops_subsecond() {
        let ts = MessageTimestamp::from_epoch_millis(1_700_000_000_123).unwrap();
        assert_eq!(ts.epoch_millis(), 1_700_000_000_000);
        assert_eq!(ts.to_string(), "14-11-2023 22:13:20");
    }

    #[test]
    fn serde_uses_fixed_pattern() {
        let ts = MessageTimestamp::parse("01-01-2025 00:00:01").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"01-01-2025 00:00:01\"");
        let parsed: MessageTimestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ts);
    }

    #[test]
    fn deserializes_epoch_number() {
        let parsed: MessageTimestamp = serde_json::from_str("0").unwrap();
        assert_eq!(parsed.to_string(), "01-01-1970 00:00:00");
    }

    #[test]
    fn input_variants_resolve() {
        let text = DateTimeInput::Text("10-10-2020 10:10:10".into());
        let millis = DateTimeInput::Millis(text.resolve().unwrap().epoch_millis());
        assert_eq!(text.resolve().unwrap(), millis.resolve().unwrap());
        assert!(DateTimeInput::Text("yesterday".into()).resolve().is_err());
    }

    #[test]
    fn now_is_recent() {
        // After 2020-01-01.
        assert!(MessageTimestamp::now().epoch_millis() > 1_577_836_800_000);
    }

    proptest::proptest! {
        #[test]
        fn display_parse_roundtrip(secs in 0i64..4_102_444_800) {
            let ts = MessageTimestamp::from_epoch_millis(secs * 1000).unwrap();
            let reparsed = MessageTimestamp::parse(&ts.to_string()).unwrap();
            proptest::prop_assert_eq!(reparsed, ts);
            proptest::prop_assert_eq!(reparsed.epoch_millis(), secs * 1000);
        }
    }
}
