//! Game result records.
//!
//! A [`Record`] is a flat field → value mapping. Field order follows insertion
//! order; once persisted, the sheet's column order takes over.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// Date the game was played, in `M/D/YYYY` form.
pub const GAME_DATE: &str = "Game date";

/// Name of the winning participant.
pub const WINNER: &str = "Winner";

/// Margin of victory, kept verbatim from the message.
pub const SCORE_DIFFERENCE: &str = "Score difference";

/// Name of the game that was played.
pub const GAME: &str = "Game";

/// Fields every parsed record carries, in header order.
pub const REQUIRED_FIELDS: [&str; 4] = [GAME_DATE, WINNER, SCORE_DIFFERENCE, GAME];

/// Fields ignored when matching a record's conditions against history.
pub const NON_CONDITION_FIELDS: [&str; 3] = [GAME_DATE, WINNER, SCORE_DIFFERENCE];

/// Value stored for every optional condition field.
pub const CONDITION_PRESENT: &str = "Yes";

/// One game result as an ordered field → value mapping.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field. Replacing keeps the field's original position.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == field) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == field)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn winner(&self) -> Option<&str> {
        self.get(WINNER)
    }

    pub fn game(&self) -> Option<&str> {
        self.get(GAME)
    }

    pub fn score_difference(&self) -> Option<&str> {
        self.get(SCORE_DIFFERENCE)
    }

    pub fn game_date(&self) -> Option<&str> {
        self.get(GAME_DATE)
    }

    /// Fields that take part in the matching-conditions filter: the game plus
    /// every optional condition.
    pub fn condition_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter()
            .filter(|(k, _)| !NON_CONDITION_FIELDS.contains(k))
    }

    /// True when `other` holds the same value for every condition field of `self`.
    pub fn conditions_match(&self, other: &Record) -> bool {
        self.condition_fields()
            .all(|(field, value)| other.get(field) == Some(value))
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
