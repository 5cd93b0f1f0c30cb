use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// A numeric platform identifier (guild, channel, user, message).
///
/// Serialized as a JSON number. Deserialization also accepts numeric strings,
/// since older storage files wrote some identifiers quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Snowflake(u64);

impl Snowflake {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for Snowflake {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid identifier: {0:?}")]
pub struct ParseSnowflakeError(String);

impl FromStr for Snowflake {
    type Err = ParseSnowflakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ParseSnowflakeError(s.to_string()))
    }
}

impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

struct SnowflakeVisitor;

impl de::Visitor<'_> for SnowflakeVisitor {
    type Value = Snowflake;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer or a numeric string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Snowflake, E> {
        Ok(Snowflake(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Snowflake, E> {
        u64::try_from(v)
            .map(Snowflake)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Snowflake, E> {
        v.parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SnowflakeVisitor)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("1234", 1234)]
    #[case("\"1234\"", 1234)]
    #[case("1152921504606846976", 1_152_921_504_606_846_976)]
    #[case("\"1152921504606846976\"", 1_152_921_504_606_846_976)]
    fn accepts_numbers_and_numeric_strings(#[case] json: &str, #[case] expected: u64) {
        let id: Snowflake = serde_json::from_str(json).unwrap();
        assert_eq!(id.get(), expected);
    }

    #[rstest]
    #[case("-1")]
    #[case("\"abc\"")]
    #[case("1.5")]
    fn rejects_non_identifiers(#[case] json: &str) {
        assert!(serde_json::from_str::<Snowflake>(json).is_err());
    }

    #[test]
    fn serializes_as_number() {
        let json = serde_json::to_string(&Snowflake::new(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn parses_from_str() {
        assert_eq!(" 77 ".parse::<Snowflake>().unwrap(), Snowflake::new(77));
        assert!("seventy".parse::<Snowflake>().is_err());
    }
}
