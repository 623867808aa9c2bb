//! Conversation persistence bridge
//!
//! Best-effort replication of locally generated status messages (tool
//! dispatch and confirmation outcomes) to the backend conversation store.
//! The chat endpoint stores streamed turns itself, so user messages and
//! streamed replies never pass through here. The local transcript is
//! authoritative for the session: persistence failures are logged and
//! swallowed, never surfaced to the user and never rolled back locally.

use log::warn;
use std::sync::{Arc, Mutex};

use crate::api::AssistantBackend;
use crate::transcript::ChatMessage;

/// Replicates transcript mutations to durable storage
///
/// Holds the active conversation id; messages are only replicated while an
/// id is bound. A `meta` stream event may rebind the id mid-stream when the
/// backend creates a fresh conversation.
pub struct PersistenceBridge {
    backend: Arc<dyn AssistantBackend>,
    conversation_id: Mutex<Option<String>>,
}

impl PersistenceBridge {
    /// Create a bridge with no conversation bound
    pub fn new(backend: Arc<dyn AssistantBackend>) -> Self {
        Self {
            backend,
            conversation_id: Mutex::new(None),
        }
    }

    /// Bind the active conversation id
    pub fn bind(&self, id: impl Into<String>) {
        *self.conversation_id.lock().unwrap() = Some(id.into());
    }

    /// Unbind the active conversation (fresh conversation, nothing stored yet)
    pub fn unbind(&self) {
        *self.conversation_id.lock().unwrap() = None;
    }

    /// The currently bound conversation id, if any
    pub fn current(&self) -> Option<String> {
        self.conversation_id.lock().unwrap().clone()
    }

    /// Replicate a message to the bound conversation, fire-and-forget
    pub fn persist(&self, message: &ChatMessage) {
        let Some(id) = self.current() else {
            return;
        };
        if let Err(e) = self.backend.add_message(&id, message) {
            warn!("Failed to persist message to conversation {}: {}", id, e);
        }
    }
}
