use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Unit of measure printed next to a purchased quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Lb,
    Kg,
    Oz,
    G,
    Each,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown unit: '{0}'")]
pub struct UnitParseError(pub String);

impl Unit {
    /// Units a receipt prices by weight.
    pub fn is_weight(self) -> bool {
        !matches!(self, Unit::Each)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Lb => write!(f, "lb"),
            Unit::Kg => write!(f, "kg"),
            Unit::Oz => write!(f, "oz"),
            Unit::G => write!(f, "g"),
            Unit::Each => write!(f, "ea"),
        }
    }
}

impl std::str::FromStr for Unit {
    type Err = UnitParseError;

    /// Case-insensitive; accepts the spellings OCR commonly produces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lb" | "lbs" | "ib" | "1b" => Ok(Unit::Lb),
            "kg" | "kgs" => Ok(Unit::Kg),
            "oz" => Ok(Unit::Oz),
            "g" | "gr" => Ok(Unit::G),
            "ea" | "each" | "ct" => Ok(Unit::Each),
            other => Err(UnitParseError(other.to_string())),
        }
    }
}
