//! The scoring pipeline shared by every entry point.
//!
//! parse → open sheet → grow header → append → read back → summarize.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::calculate::Summary;
use crate::models::{Participants, Record};
use crate::parser::{FormatError, MessageParser};
use crate::sheets::{RangeStore, SheetError, SheetSession};

/// Anything that stops a message from being scored.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Sheet(#[from] SheetError),
}

impl ScoreError {
    /// Kind name used in error replies.
    pub fn kind(&self) -> &'static str {
        match self {
            ScoreError::Format(_) => "FormatError",
            ScoreError::Sheet(e) => e.kind(),
        }
    }

    /// `"<ErrorKind>: <message>"`, the form sent back to the sender.
    pub fn reply(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }
}

/// A successfully scored message.
#[derive(Debug, Clone)]
pub struct Scored {
    pub record: Record,
    pub summary: Summary,
    pub reply: String,
}

/// Scores messages against one sheet.
pub struct Scorer {
    store: Arc<dyn RangeStore>,
    sheet_name: String,
    parser: MessageParser,
}

impl Scorer {
    pub fn new(
        store: Arc<dyn RangeStore>,
        sheet_name: impl Into<String>,
        parser: MessageParser,
    ) -> Self {
        Self {
            store,
            sheet_name: sheet_name.into(),
            parser,
        }
    }

    pub fn parser(&self) -> &MessageParser {
        &self.parser
    }

    pub fn participants(&self) -> &Participants {
        self.parser.participants()
    }

    /// Record `message` and build the reply.
    ///
    /// The new result is appended before the history is read back, so it is
    /// counted in every tally of its own reply.
    pub async fn score(&self, message: &str) -> Result<Scored, ScoreError> {
        let record = self.parser.parse(message)?;
        self.score_record(record).await
    }

    /// Store an already parsed record and build the reply.
    pub async fn score_record(&self, record: Record) -> Result<Scored, ScoreError> {
        let mut session = SheetSession::open(self.store.clone(), self.sheet_name.as_str()).await?;
        session.grow_columns(record.keys()).await?;
        session.append(&record).await?;

        let history = session.read_all().await?;
        let summary = Summary::compute(&history, &record);
        let reply = summary.render(self.participants());

        info!(
            "Scored {} win in {} ({} results on file)",
            summary.winner,
            summary.game,
            history.len()
        );

        Ok(Scored {
            record,
            summary,
            reply,
        })
    }

    /// Score `message`, turning any failure into an error reply.
    pub async fn reply_to(&self, message: &str) -> String {
        match self.score(message).await {
            Ok(scored) => scored.reply,
            Err(e) => {
                warn!("Could not score {:?}: {}", message, e);
                e.reply()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::REQUIRED_FIELDS;
    use crate::sheets::MemorySheet;

    fn scorer_with(sheet: Arc<MemorySheet>) -> Scorer {
        Scorer::new(sheet, "Sheet1", MessageParser::default())
    }

    fn empty_table() -> Arc<MemorySheet> {
        Arc::new(MemorySheet::with_header("Sheet1", &REQUIRED_FIELDS))
    }

    #[tokio::test]
    async fn test_first_result() {
        let sheet = empty_table();
        let scorer = scorer_with(sheet.clone());

        let scored = scorer.score("Jess by 5.Catan").await.unwrap();
        assert_eq!(scored.summary.repeat, 1);
        assert_eq!(scored.reply.lines().next(), Some("Congrats Jess!"));
        assert!(scored.reply.contains("Overall, Jess is winning 1-0."));
        assert_eq!(sheet.rows().len(), 2);
    }

    #[tokio::test]
    async fn test_conditions_grow_header() {
        let sheet = empty_table();
        let scorer = scorer_with(sheet.clone());

        scorer.score("Jess by 5.Catan").await.unwrap();
        let scored = scorer.score("Dan by 3.Catan.Rainy").await.unwrap();

        assert_eq!(sheet.rows()[0].last().map(String::as_str), Some("Rainy?"));
        assert_eq!(scored.summary.overall.get("Jess"), 1);
        assert_eq!(scored.summary.overall.get("Dan"), 1);
        // Only the rainy game matches the new result's conditions
        assert_eq!(scored.summary.conditions.total(), 1);
        assert!(scored
            .reply
            .ends_with("For all matching conditions, Dan is winning 1-0."));
    }

    #[tokio::test]
    async fn test_repeat_counts_prior_matches() {
        let sheet = empty_table();
        let scorer = scorer_with(sheet);

        scorer.score("Jess by 5.Catan").await.unwrap();
        scorer.score("Dan by 5.Catan").await.unwrap();
        let scored = scorer.score("Jess by 5.Catan").await.unwrap();

        assert_eq!(scored.summary.repeat, 2);
        assert!(scored
            .reply
            .contains("Jess has won by 5 in this game 2 times."));
    }

    #[tokio::test]
    async fn test_format_error_reply() {
        let sheet = empty_table();
        let scorer = scorer_with(sheet.clone());

        let reply = scorer.reply_to("Jess wins.Catan").await;
        assert_eq!(
            reply,
            "FormatError: The message was not sent in the correct format. \
             The first sentence should follow the format of 'Jess by 5'"
        );
        // Nothing was written
        assert_eq!(sheet.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_store_unavailable_reply() {
        let sheet = empty_table();
        sheet.set_unavailable(true);
        let scorer = scorer_with(sheet);

        let reply = scorer.reply_to("Jess by 5.Catan").await;
        assert!(reply.starts_with("StoreUnavailable: "), "{}", reply);
    }

    #[tokio::test]
    async fn test_schema_error_reply() {
        let scorer = scorer_with(Arc::new(MemorySheet::new("Sheet1")));
        let reply = scorer.reply_to("Jess by 5.Catan").await;
        assert!(reply.starts_with("SchemaError: "), "{}", reply);
    }

    #[tokio::test]
    async fn test_stray_cell_past_header_blocks_scoring() {
        let sheet = empty_table();
        sheet.push_row(
            ["3/2/2024", "Dan", "2", "Azul", "", "x"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        let scorer = scorer_with(sheet.clone());

        let reply = scorer.reply_to("Dan by 3.Azul.Rainy").await;
        assert!(reply.starts_with("SchemaError: "), "{}", reply);
        // Header was not grown and no row was added
        assert_eq!(sheet.rows()[0], REQUIRED_FIELDS);
        assert_eq!(sheet.rows().len(), 2);
    }

    #[test]
    fn test_error_kinds() {
        let format = ScoreError::from(FormatError {
            violations: vec!["x".to_string()],
        });
        assert_eq!(format.kind(), "FormatError");

        let sheet = ScoreError::from(SheetError::Unavailable("down".to_string()));
        assert_eq!(sheet.reply(), "StoreUnavailable: store unavailable: down");
    }
}
