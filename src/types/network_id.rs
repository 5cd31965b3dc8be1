// ABOUTME: Validated numeric LAN identifier.
// ABOUTME: Parses the string form handed in by callers into the provider's 32-bit LAN id.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkIdError {
    #[error("network id cannot be empty")]
    Empty,

    #[error("network id is not numeric: '{0}'")]
    NotNumeric(String),

    #[error("network id cannot be negative: {0}")]
    Negative(i64),

    #[error("network id out of range: {0}")]
    OutOfRange(String),
}

/// Identifier of a logical network (LAN).
///
/// LAN ids are signed 32-bit integers on the provider side; only the
/// non-negative half is addressable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetworkId(i32);

impl NetworkId {
    pub fn new(value: i32) -> Result<Self, NetworkIdError> {
        if value < 0 {
            return Err(NetworkIdError::Negative(value.into()));
        }
        Ok(Self(value))
    }

    pub fn parse(value: &str) -> Result<Self, NetworkIdError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(NetworkIdError::Empty);
        }

        let digits = trimmed.strip_prefix(['-', '+']).unwrap_or(trimmed);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(NetworkIdError::NotNumeric(trimmed.to_string()));
        }

        // Parse wide first so "-5" reports Negative and huge values report OutOfRange.
        let wide: i64 = trimmed
            .parse()
            .map_err(|_| NetworkIdError::OutOfRange(trimmed.to_string()))?;
        if wide < 0 {
            return Err(NetworkIdError::Negative(wide));
        }
        let value =
            i32::try_from(wide).map_err(|_| NetworkIdError::OutOfRange(trimmed.to_string()))?;

        Ok(Self(value))
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl FromStr for NetworkId {
    type Err = NetworkIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_number() {
        assert_eq!(NetworkId::parse("7").unwrap().value(), 7);
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(NetworkId::parse(" 12 ").unwrap().value(), 12);
    }

    #[test]
    fn zero_is_valid() {
        assert_eq!(NetworkId::parse("0").unwrap().value(), 0);
    }

    #[test]
    fn rejects_letters() {
        assert_eq!(
            NetworkId::parse("abc"),
            Err(NetworkIdError::NotNumeric("abc".to_string()))
        );
    }

    #[test]
    fn rejects_lone_sign() {
        assert!(matches!(
            NetworkId::parse("-"),
            Err(NetworkIdError::NotNumeric(_))
        ));
    }

    #[test]
    fn rejects_negative() {
        assert_eq!(NetworkId::parse("-3"), Err(NetworkIdError::Negative(-3)));
        assert!(NetworkId::new(-1).is_err());
    }

    #[test]
    fn rejects_values_past_i32() {
        assert!(matches!(
            NetworkId::parse("2147483648"),
            Err(NetworkIdError::OutOfRange(_))
        ));
        assert_eq!(NetworkId::parse("2147483647").unwrap().value(), i32::MAX);
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(NetworkId::parse("   "), Err(NetworkIdError::Empty));
    }
}
