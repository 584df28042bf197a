use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Code,
}

/// Message body: either prose or a code snippet
///
/// Untagged on the wire, so `{"text": ...}` and `{"code": ..., "language": ...}`
/// are both accepted. Code is tried first because it has more required fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Code { code: String, language: String },
    Text { text: String },
}

impl MessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn code(code: impl Into<String>, language: impl Into<String>) -> Self {
        Self::Code {
            code: code.into(),
            language: language.into(),
        }
    }

    pub fn kind(&self) -> MessageType {
        match self {
            Self::Text { .. } => MessageType::Text,
            Self::Code { .. } => MessageType::Code,
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text { text } => text.trim().is_empty(),
            Self::Code { code, .. } => code.trim().is_empty(),
        }
    }
}

/// A single post within a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub conversation_id: String,
    pub user_id: String,
    pub content: MessageContent,
    pub message_type: MessageType,
    pub timestamp: DateTime<Utc>,
    pub reply_to_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_tags: Option<Vec<String>>,
}

/// Message as handed to the store. `thread_id` is filled from the
/// conversation at write time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub id: String,
    pub conversation_id: String,
    pub user_id: String,
    pub content: MessageContent,
    pub timestamp: DateTime<Utc>,
    pub reply_to_message_id: Option<String>,
    pub concept_tags: Option<Vec<String>>,
}

impl NewMessage {
    pub fn into_message(self, thread_id: String) -> Message {
        let message_type = self.content.kind();
        Message {
            id: self.id,
            thread_id,
            conversation_id: self.conversation_id,
            user_id: self.user_id,
            content: self.content,
            message_type,
            timestamp: self.timestamp,
            reply_to_message_id: self.reply_to_message_id,
            concept_tags: self.concept_tags,
        }
    }
}
