//! Score message parsing.
//!
//! A score message is a short run of `.`-separated sentences:
//!
//! ```text
//! Jess by 5. Catan. Rainy. Night
//! ```
//!
//! The first sentence names the winner and the margin, the second names the
//! game, and every further sentence becomes a yes/no condition field
//! (`"Rainy?" = "Yes"`).

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::models::{
    Participants, Record, CONDITION_PRESENT, GAME, GAME_DATE, SCORE_DIFFERENCE, WINNER,
};

static BY_SCORE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"by \d").unwrap());

const GAME_MISSING: &str = "The second sentence should be the game name";
const GAME_NAMES_PLAYER: &str = "The second sentence should only be the game name";

/// A message that does not follow the expected sentence layout.
///
/// Every violated rule is collected so the sender can fix them all at once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("The message was not sent in the correct format. {}", .violations.join(". "))]
pub struct FormatError {
    pub violations: Vec<String>,
}

/// Turns score messages into records.
#[derive(Debug, Clone)]
pub struct MessageParser {
    participants: Participants,
    timezone: Tz,
}

impl Default for MessageParser {
    fn default() -> Self {
        Self::new(Participants::default(), chrono_tz::America::Los_Angeles)
    }
}

impl MessageParser {
    pub fn new(participants: Participants, timezone: Tz) -> Self {
        Self {
            participants,
            timezone,
        }
    }

    pub fn participants(&self) -> &Participants {
        &self.participants
    }

    /// Parse a message, stamping it with today's date in the reference zone.
    pub fn parse(&self, text: &str) -> Result<Record, FormatError> {
        self.parse_at(text, Utc::now())
    }

    /// Parse a message as if it arrived at `now`.
    pub fn parse_at(&self, text: &str, now: DateTime<Utc>) -> Result<Record, FormatError> {
        let clauses: Vec<&str> = text.split('.').map(str::trim).collect();
        let mut violations = Vec::new();

        let result = clauses
            .first()
            .filter(|first| BY_SCORE.is_match(first))
            .and_then(|first| first.split_once(" by "))
            .map(|(winner, diff)| (winner.trim(), diff.trim()))
            .filter(|(winner, diff)| {
                !winner.is_empty() && !diff.is_empty() && diff.bytes().all(|b| b.is_ascii_digit())
            });
        if result.is_none() {
            violations.push(format!(
                "The first sentence should follow the format of '{} by 5'",
                self.participants.first()
            ));
        }

        match clauses.get(1) {
            None | Some(&"") => violations.push(GAME_MISSING.to_string()),
            Some(game) if self.participants.mentioned_in(game) => {
                violations.push(GAME_NAMES_PLAYER.to_string())
            }
            Some(_) => {}
        }

        let (winner, score_difference) = match result {
            Some(parts) if violations.is_empty() => parts,
            _ => return Err(FormatError { violations }),
        };

        let today = now.with_timezone(&self.timezone);
        let mut record = Record::new();
        record.insert(
            GAME_DATE,
            format!("{}/{}/{}", today.month(), today.day(), today.year()),
        );
        record.insert(WINNER, winner);
        record.insert(SCORE_DIFFERENCE, score_difference);
        record.insert(GAME, clauses[1]);

        for clause in clauses.iter().skip(2).filter(|c| !c.is_empty()) {
            record.insert(format!("{}?", clause), CONDITION_PRESENT);
        }

        debug!("Parsed message into {:?}", record);
        Ok(record)
    }
}
