// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Logical operator combining the children of a condition expression node.
///
/// - `And`: true iff every child is true (vacuously true with no children).
/// - `Or`: true iff at least one child is true (vacuously false).
/// - `Xor`: true iff exactly one child is true (false with no children).
///
/// Parsing, from strings and from config files, ignores case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
    Xor,
}

impl FromStr for LogicalOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "and" => Ok(LogicalOperator::And),
            "or" => Ok(LogicalOperator::Or),
            "xor" => Ok(LogicalOperator::Xor),
            other => Err(format!(
                "invalid logical operator: {other} (expected \"and\", \"or\" or \"xor\")"
            )),
        }
    }
}

impl TryFrom<String> for LogicalOperator {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogicalOperator::And => "and",
            LogicalOperator::Or => "or",
            LogicalOperator::Xor => "xor",
        };
        f.write_str(s)
    }
}

/// Optional layout metadata carried by an action for editors.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}
