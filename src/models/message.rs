//! Message log entries.

use serde::{Deserialize, Serialize};

/// Which side of the exchange wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The person submitting a score.
    Sender,
    /// The service's reply.
    Receiver,
}

/// One message in the persisted log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub body: String,
    pub who: Speaker,
}

impl MessageEntry {
    pub fn sender(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            who: Speaker::Sender,
        }
    }

    pub fn receiver(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            who: Speaker::Receiver,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_json_shape() {
        let entry = MessageEntry::sender("Jess by 5.Catan");
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"body":"Jess by 5.Catan","who":"sender"}"#);
    }

    #[test]
    fn test_entry_deserialization() {
        let entry: MessageEntry =
            serde_json::from_str(r#"{"body":"Congrats Jess!","who":"receiver"}"#).unwrap();
        assert_eq!(entry, MessageEntry::receiver("Congrats Jess!"));
    }

    #[test]
    fn test_unknown_speaker_rejected() {
        let result = serde_json::from_str::<MessageEntry>(r#"{"body":"hi","who":"bot"}"#);
        assert!(result.is_err());
    }
}
