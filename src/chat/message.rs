use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const ASSISTANT_AVATAR: &str = "https://placehold.co/100x100?text=AI";

/// Who wrote a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: u64,
    pub display_name: String,
    pub avatar: Option<String>,
}

impl Author {
    /// The person typing.
    pub fn user() -> Self {
        Self {
            id: 1,
            display_name: "You".to_owned(),
            avatar: None,
        }
    }

    /// The remote model, and the author of the fallback message.
    pub fn assistant() -> Self {
        Self {
            id: 2,
            display_name: "AI Assistant".to_owned(),
            avatar: Some(ASSISTANT_AVATAR.to_owned()),
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.id == 2
    }
}

/// A single entry in the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique within one conversation.
    pub id: u64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author: Author,
}

impl ChatMessage {
    pub fn new(id: u64, text: impl Into<String>, author: Author) -> Self {
        Self {
            id,
            text: text.into(),
            created_at: Utc::now(),
            author,
        }
    }
}
