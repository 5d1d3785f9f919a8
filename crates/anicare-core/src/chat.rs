//! Chat transcript records.

use serde::{Deserialize, Serialize};

/// A chat turn waiting to be appended to its session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChatExchange {
    pub session_id: String,
    pub message: String,
    pub response: String,
}

/// One stored chat turn. Sessions group exchanges; order within a session is submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatExchange {
    pub id: u64,
    pub session_id: String,
    pub message: String,
    pub response: String,
    /// Unix timestamp (milliseconds).
    pub timestamp: i64,
}

impl ChatExchange {
    pub fn from_new(id: u64, new: NewChatExchange, timestamp: i64) -> Self {
        Self {
            id,
            session_id: new.session_id,
            message: new.message,
            response: new.response,
            timestamp,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }
}

/// Validated body of a chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
    /// Client-supplied profile summary; the gateway falls back to the latest stored profile.
    pub pet_context: Option<String>,
}
