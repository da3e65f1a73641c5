use std::sync::Arc;

use crate::messages::MessageLog;
use crate::scoring::Scorer;

#[derive(Clone)]
pub struct AppState {
    pub scorer: Arc<Scorer>,
    pub message_log: MessageLog,
}

impl AppState {
    pub fn new(scorer: Scorer, message_log: MessageLog) -> Self {
        Self {
            scorer: Arc::new(scorer),
            message_log,
        }
    }
}

/// State over an in-memory sheet (header only) and an in-memory message log.
#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    test_state_with(Arc::new(crate::sheets::MemorySheet::with_header(
        "Sheet1",
        &crate::models::REQUIRED_FIELDS,
    )))
}

#[cfg(test)]
pub(crate) fn test_state_with(sheet: Arc<crate::sheets::MemorySheet>) -> AppState {
    use crate::parser::MessageParser;
    use crate::storage::MemoryBlobStore;

    AppState::new(
        Scorer::new(sheet, "Sheet1", MessageParser::default()),
        MessageLog::new(Arc::new(MemoryBlobStore::new()), "messages.json"),
    )
}
