//! Serde adapter storing `SystemTime` as an RFC 3339 timestamp.
//!
//! Plain `SystemTime` serialization rejects times before the Unix epoch,
//! which filesystems happily report.

use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub(crate) fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    DateTime::<Utc>::from(*time).serialize(serializer)
}

pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
where
    D: Deserializer<'de>,
{
    DateTime::<Utc>::deserialize(deserializer).map(SystemTime::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Stamped {
        #[serde(with = "crate::timestamp")]
        at: SystemTime,
    }

    #[test]
    fn test_pre_epoch_round_trip() {
        let value = Stamped {
            at: UNIX_EPOCH - Duration::new(100, 250),
        };
        let json = serde_json::to_string(&value).unwrap();
        assert!(json.contains("1969-12-31T23:58:19"));
        assert_eq!(serde_json::from_str::<Stamped>(&json).unwrap(), value);
    }

    #[test]
    fn test_nanoseconds_survive() {
        let value = Stamped {
            at: UNIX_EPOCH + Duration::new(1_700_000_000, 123_456_789),
        };
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(serde_json::from_str::<Stamped>(&json).unwrap(), value);
    }
}
