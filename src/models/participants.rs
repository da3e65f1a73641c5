//! The two tracked participants.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The pair of people whose head-to-head record is tracked.
///
/// The first participant is used in format hints and is reported first when
/// a tally is tied.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participants {
    first: String,
    second: String,
}

impl Participants {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    /// Build from a configured name list. Returns `None` unless there are
    /// exactly two non-empty names.
    pub fn from_names(names: &[String]) -> Option<Self> {
        match names {
            [first, second] if !first.trim().is_empty() && !second.trim().is_empty() => {
                Some(Self::new(first.trim(), second.trim()))
            }
            _ => None,
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    pub fn names(&self) -> [&str; 2] {
        [&self.first, &self.second]
    }

    /// Whether `text` mentions either participant, ignoring case.
    pub fn mentioned_in(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.names()
            .iter()
            .any(|name| lowered.contains(&name.to_lowercase()))
    }
}

impl Default for Participants {
    fn default() -> Self {
        Self::new("Jess", "Dan")
    }
}

impl fmt::Display for Participants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.first, self.second)
    }
}

impl fmt::Debug for Participants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Participants({}, {})", self.first, self.second)
    }
}
