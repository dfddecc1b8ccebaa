use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Strongly typed call identifier backed by ULID.
///
/// Assigned when a connection is accepted and attached to every log record
/// of that call.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct CallId(pub ulid::Ulid);

impl CallId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    #[must_use]
    pub fn from_ulid(id: ulid::Ulid) -> Self {
        Self(id)
    }

    /// Id derived from the backend's `agi_uniqueid` (`SECONDS.SEQUENCE`).
    ///
    /// The ULID time is the call's start second and the random part is the
    /// backend's sequence number, so one backend call always maps to the same
    /// id and ids sort by call start. Anything else yields a fresh id.
    #[must_use]
    pub fn from_unique_id(unique_id: &str) -> Self {
        let Some((secs, seq)) = unique_id.trim().split_once('.') else {
            return Self::new();
        };
        match (secs.parse::<u64>(), seq.parse::<u128>()) {
            (Ok(secs), Ok(seq)) => Self(ulid::Ulid::from_parts(secs.saturating_mul(1000), seq)),
            _ => Self::new(),
        }
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for CallId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for CallId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ulid::Ulid::from_string(s).map(CallId)
    }
}

impl Serialize for CallId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CallId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<CallId>()
            .map_err(|_| serde::de::Error::custom("invalid call id"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_id_roundtrips_through_string() {
        let id = CallId::new();
        let parsed: CallId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-ulid".parse::<CallId>().is_err());
    }

    #[test]
    fn test_unique_id_maps_to_stable_call_id() {
        let a = CallId::from_unique_id("1700000000.42");
        assert_eq!(a, CallId::from_unique_id("1700000000.42"));
        assert_eq!(a.0.timestamp_ms(), 1_700_000_000_000);
        assert_ne!(a, CallId::from_unique_id("1700000000.43"));
        assert!(a < CallId::from_unique_id("1700000001.1"));
    }

    #[test]
    fn test_malformed_unique_id_gets_fresh_id() {
        assert_ne!(CallId::from_unique_id("SIP-7"), CallId::from_unique_id("SIP-7"));
        assert_ne!(CallId::from_unique_id(""), CallId::from_unique_id(""));
    }

    #[test]
    fn test_call_ids_are_unique() {
        assert_ne!(CallId::new(), CallId::new());
    }
}
