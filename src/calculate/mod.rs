//! Head-to-head statistics.
//!
//! Computes the tallies behind a score reply:
//! - Overall wins per participant
//! - Wins in the game just played
//! - How often the winner has won this game by this exact margin
//! - Wins under every condition of the new result

use std::collections::BTreeMap;

use crate::models::{Participants, Record, WINNER};

/// Win counts per name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    counts: BTreeMap<String, u32>,
}

impl Tally {
    pub fn get(&self, name: &str) -> u32 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Count records per value of `field`. Records without the field are skipped.
pub fn tally<'a, I>(records: I, field: &str) -> Tally
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut counts = BTreeMap::new();
    for value in records.into_iter().filter_map(|r| r.get(field)) {
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
    Tally { counts }
}

/// Count wins per participant.
pub fn tally_winners<'a, I>(records: I) -> Tally
where
    I: IntoIterator<Item = &'a Record>,
{
    tally(records, WINNER)
}

/// `"<leader> is winning X-Y"`, or `"it's a tie X-X"`.
pub fn describe(tally: &Tally, participants: &Participants) -> String {
    let first = tally.get(participants.first());
    let second = tally.get(participants.second());

    if first > second {
        format!("{} is winning {}-{}", participants.first(), first, second)
    } else if second > first {
        format!("{} is winning {}-{}", participants.second(), second, first)
    } else {
        format!("it's a tie {}-{}", first, second)
    }
}

/// Everything a score reply reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub winner: String,
    pub game: String,
    pub score_difference: String,
    pub overall: Tally,
    pub per_game: Tally,
    /// Results with the same game, margin and winner as the new one.
    pub repeat: usize,
    /// Tally over results sharing every condition of the new one.
    pub conditions: Tally,
}

impl Summary {
    /// Compute the summary for `new_record` against `history`.
    ///
    /// `history` is whatever the store holds when the reply is built; when the
    /// new record was appended first it counts toward every tally.
    pub fn compute(history: &[Record], new_record: &Record) -> Self {
        let winner = new_record.winner().unwrap_or_default();
        let game = new_record.game().unwrap_or_default();
        let score_difference = new_record.score_difference().unwrap_or_default();

        let same_game = |r: &&Record| r.game() == Some(game);

        let overall = tally_winners(history);
        let per_game = tally_winners(history.iter().filter(same_game));
        let repeat = history
            .iter()
            .filter(same_game)
            .filter(|r| r.score_difference() == Some(score_difference))
            .filter(|r| r.winner() == Some(winner))
            .count();
        let conditions = tally_winners(
            history
                .iter()
                .filter(|r| new_record.conditions_match(r)),
        );

        Self {
            winner: winner.to_string(),
            game: game.to_string(),
            score_difference: score_difference.to_string(),
            overall,
            per_game,
            repeat,
            conditions,
        }
    }

    /// Multi-line reply text.
    pub fn render(&self, participants: &Participants) -> String {
        let times = if self.repeat > 1 { "times" } else { "time" };
        format!(
            "Congrats {winner}!\n\
             Overall, {overall}.\n\
             {per_game} in {game}.\n\
             {winner} has won by {diff} in this game {repeat} {times}.\n\
             For all matching conditions, {conditions}.",
            winner = self.winner,
            overall = describe(&self.overall, participants),
            per_game = describe(&self.per_game, participants),
            game = self.game,
            diff = self.score_difference,
            repeat = self.repeat,
            times = times,
            conditions = describe(&self.conditions, participants),
        )
    }
}

/// Compute and render the reply for `new_record`.
pub fn summarize(history: &[Record], new_record: &Record, participants: &Participants) -> String {
    Summary::compute(history, new_record).render(participants)
}
