//! Qualified function references (`skill.function`)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::RegistryError;

/// Reference to a registered function: exactly one `.` separating two names
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionRef {
    pub skill: String,
    pub function: String,
}

impl FunctionRef {
    pub fn new(skill: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            skill: skill.into(),
            function: function.into(),
        }
    }
}

/// A skill or function name: non-empty, no dots, no whitespace
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('.') && !name.chars().any(char::is_whitespace)
}

impl FromStr for FunctionRef {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RegistryError::InvalidReference { reference: s.to_string() };
        let (skill, function) = s.split_once('.').ok_or_else(invalid)?;
        if !is_valid_name(skill) || !is_valid_name(function) {
            return Err(invalid());
        }
        Ok(Self::new(skill, function))
    }
}

impl fmt::Display for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.skill, self.function)
    }
}

impl Serialize for FunctionRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FunctionRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
