// ABOUTME: Validated deployment unit name.
// ABOUTME: Unit names are non-empty and free of control characters and path separators.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitNameError {
    #[error("deployment unit name cannot be empty")]
    Empty,

    #[error("deployment unit name exceeds maximum length of 255 characters")]
    TooLong,

    #[error("deployment unit name cannot contain '{0}'")]
    InvalidChar(char),
}

/// Name of a deployable unit (e.g. `app.war`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitName(String);

impl UnitName {
    pub fn new(value: &str) -> Result<Self, UnitNameError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(UnitNameError::Empty);
        }

        if value.chars().count() > 255 {
            return Err(UnitNameError::TooLong);
        }

        if let Some(c) = value
            .chars()
            .find(|c| c.is_control() || *c == '/' || *c == '\\')
        {
            return Err(UnitNameError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for UnitName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UnitName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        UnitName::new(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_archive_names() {
        assert_eq!(UnitName::new("app.war").unwrap().as_str(), "app.war");
        assert_eq!(UnitName::new("  ear-1.0.ear ").unwrap().as_str(), "ear-1.0.ear");
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(UnitName::new(""), Err(UnitNameError::Empty));
        assert_eq!(UnitName::new("   "), Err(UnitNameError::Empty));
    }

    #[test]
    fn rejects_path_separators() {
        assert_eq!(
            UnitName::new("target/app.war"),
            Err(UnitNameError::InvalidChar('/'))
        );
    }

    #[test]
    fn rejects_overlong_names() {
        let long = "a".repeat(256);
        assert_eq!(UnitName::new(&long), Err(UnitNameError::TooLong));
    }
}
