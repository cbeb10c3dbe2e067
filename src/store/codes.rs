//! Human-readable codes for requirements, test cases and defects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const REQUIREMENT_PREFIX: &str = "REQ";
pub const TEST_CASE_PREFIX: &str = "TC";
pub const DEFECT_PREFIX: &str = "BUG";

/// Strategy for numbering new codes within a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeSequence {
    /// `len + 1`. Deleting and re-adding can hand out a code that was used before.
    #[default]
    #[serde(rename = "length")]
    CollectionLength,
    /// `max(counter, len) + 1`, with the counter persisted on the owner.
    Monotonic,
}

impl CodeSequence {
    /// Produce the next code for a collection currently holding `len` items.
    ///
    /// `counter` is the owner's persisted high-water mark. It is raised in
    /// both modes so switching to monotonic later never goes backwards.
    pub fn next(self, prefix: &str, len: usize, counter: &mut u32) -> String {
        let len = u32::try_from(len).unwrap_or(u32::MAX);
        let number = match self {
            CodeSequence::CollectionLength => len.saturating_add(1),
            CodeSequence::Monotonic => (*counter).max(len).saturating_add(1),
        };
        *counter = (*counter).max(number);
        format_code(prefix, number)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CodeSequence::CollectionLength => "length",
            CodeSequence::Monotonic => "monotonic",
        }
    }
}

impl fmt::Display for CodeSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CodeSequence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "length" => Ok(CodeSequence::CollectionLength),
            "monotonic" => Ok(CodeSequence::Monotonic),
            _ => Err(format!(
                "Invalid code sequence: '{}'. Valid values: length, monotonic",
                s
            )),
        }
    }
}

/// `PREFIX-NNN`, zero-padded to at least three digits.
pub fn format_code(prefix: &str, number: u32) -> String {
    format!("{}-{:03}", prefix, number)
}
