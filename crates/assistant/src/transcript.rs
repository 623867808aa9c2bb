//! Conversation transcript
//!
//! Owns the ordered list of chat messages for the active conversation.
//! Append-only ordering with point update/deletion by id; switching
//! conversations replaces the list wholesale.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Unique identifier for a chat message within a conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Who authored a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Presentation category for assistant status messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Success,
    Error,
    Filter,
    Info,
    Confirmation,
    Action,
}

/// One message in the conversation transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Assigned by the transcript on append when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    pub role: Role,
    pub content: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MessageKind>,
}

impl ChatMessage {
    /// A user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: None,
            role: Role::User,
            content: content.into(),
            kind: None,
        }
    }

    /// An assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: None,
            role: Role::Assistant,
            content: content.into(),
            kind: None,
        }
    }

    /// Attach a presentation kind
    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Partial update to a transcript message
#[derive(Debug, Clone, Default)]
pub struct MessagePatch {
    pub content: Option<String>,
    pub kind: Option<MessageKind>,
}

/// The ordered transcript of the active conversation
///
/// Interior-mutable so the session and the tool dispatcher can share it
/// behind an `Arc`. Updates scan the list; the list is bounded by recent
/// history, so O(n) per call is acceptable.
pub struct Transcript {
    messages: Mutex<Vec<ChatMessage>>,
    /// Tie-breaker so ids stay unique under rapid consecutive appends
    /// within the same millisecond
    sequence: AtomicU64,
}

impl Transcript {
    /// Create an empty transcript
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            sequence: AtomicU64::new(0),
        }
    }

    /// Generate a fresh unique message id
    fn next_id(&self) -> MessageId {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        MessageId::new(format!("{}-{}", millis, seq))
    }

    /// Append a message, assigning an id if it has none. Returns the id.
    pub fn append(&self, mut message: ChatMessage) -> MessageId {
        let id = match &message.id {
            Some(id) => id.clone(),
            None => {
                let id = self.next_id();
                message.id = Some(id.clone());
                id
            }
        };
        self.messages.lock().unwrap().push(message);
        id
    }

    /// Update a message in place by id. No-op when the id is absent.
    pub fn update_by_id(&self, id: &MessageId, patch: MessagePatch) {
        let mut messages = self.messages.lock().unwrap();
        if let Some(message) = messages.iter_mut().find(|m| m.id.as_ref() == Some(id)) {
            if let Some(content) = patch.content {
                message.content = content;
            }
            if let Some(kind) = patch.kind {
                message.kind = Some(kind);
            }
        }
    }

    /// Remove the message with the given id, if present
    pub fn delete_by_id(&self, id: &MessageId) {
        self.messages
            .lock()
            .unwrap()
            .retain(|m| m.id.as_ref() != Some(id));
    }

    /// Replace the whole transcript (conversation switch), assigning ids to
    /// entries that lack one
    pub fn replace_all(&self, messages: Vec<ChatMessage>) {
        let messages = messages
            .into_iter()
            .map(|mut m| {
                if m.id.is_none() {
                    m.id = Some(self.next_id());
                }
                m
            })
            .collect();
        *self.messages.lock().unwrap() = messages;
    }

    /// Clear the transcript
    pub fn clear(&self) {
        self.messages.lock().unwrap().clear();
    }

    /// Snapshot of all messages in order
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.lock().unwrap().clone()
    }

    /// Snapshot of the last `n` messages in order
    pub fn last_n(&self, n: usize) -> Vec<ChatMessage> {
        let messages = self.messages.lock().unwrap();
        let start = messages.len().saturating_sub(n);
        messages[start..].to_vec()
    }

    /// Number of messages in the transcript
    pub fn len(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    /// Whether the transcript is empty
    pub fn is_empty(&self) -> bool {
        self.messages.lock().unwrap().is_empty()
    }

    /// Fetch a message by id
    pub fn get(&self, id: &MessageId) -> Option<ChatMessage> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id.as_ref() == Some(id))
            .cloned()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
