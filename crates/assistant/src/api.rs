//! Backend abstraction for the assistant service
//!
//! Covers the streaming chat endpoint and the conversation persistence API.
//! The trait seam lets tests drive the session with scripted streams.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use config::ApiConfig;
use serde::{Deserialize, Serialize};
use std::io::Read;

use crate::context::ChatContext;
use crate::transcript::{ChatMessage, Role};

/// One role/content pair of recent history sent with a chat request
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl From<&ChatMessage> for HistoryEntry {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Request body for the streaming chat endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub context: ChatContext,
    pub conversation_history: Vec<HistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// Summary row for the conversation history sidebar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "lastMessageAt", default)]
    pub last_message_at: Option<DateTime<Utc>>,
}

/// A stored conversation with its ordered messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Trait for the assistant backend service
pub trait AssistantBackend: Send + Sync {
    /// Open a streaming chat response. The returned reader yields
    /// newline-delimited event records for [`crate::StreamDecoder`].
    fn chat_stream(&self, request: &ChatRequest) -> Result<Box<dyn Read>>;

    /// List conversation summaries, most recent first
    fn list_conversations(&self) -> Result<Vec<ConversationSummary>>;

    /// Fetch one conversation with its messages
    fn get_conversation(&self, id: &str) -> Result<Conversation>;

    /// Append a message to a stored conversation
    fn add_message(&self, conversation_id: &str, message: &ChatMessage) -> Result<()>;

    /// Delete a stored conversation
    fn delete_conversation(&self, id: &str) -> Result<()>;
}

/// Assistant REST API client
pub struct HttpAssistantBackend {
    config: ApiConfig,
}

impl HttpAssistantBackend {
    /// Create a new assistant client from API config
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.config.auth_token.as_deref().unwrap_or(""))
    }
}

impl AssistantBackend for HttpAssistantBackend {
    fn chat_stream(&self, request: &ChatRequest) -> Result<Box<dyn Read>> {
        let url = self.url("/assistant/chat/stream");

        let response = ureq::post(&url)
            .header("Authorization", &self.bearer())
            .send_json(request)
            .context("Failed to open chat stream")?;

        Ok(Box::new(response.into_body().into_reader()))
    }

    fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        let url = self.url("/assistant/conversations");

        let mut response = ureq::get(&url)
            .header("Authorization", &self.bearer())
            .call()
            .context("Failed to send conversations request")?;

        let summaries: Vec<ConversationSummary> = response
            .body_mut()
            .read_json()
            .context("Failed to parse conversations response")?;

        Ok(summaries)
    }

    fn get_conversation(&self, id: &str) -> Result<Conversation> {
        let url = self.url(&format!("/assistant/conversations/{}", id));

        let mut response = ureq::get(&url)
            .header("Authorization", &self.bearer())
            .call()
            .context("Failed to send conversation request")?;

        let conversation: Conversation = response
            .body_mut()
            .read_json()
            .context("Failed to parse conversation response")?;

        Ok(conversation)
    }

    fn add_message(&self, conversation_id: &str, message: &ChatMessage) -> Result<()> {
        let url = self.url(&format!("/assistant/conversations/{}/messages", conversation_id));

        ureq::post(&url)
            .header("Authorization", &self.bearer())
            .send_json(message)
            .context("Failed to persist message")?;

        Ok(())
    }

    fn delete_conversation(&self, id: &str) -> Result<()> {
        let url = self.url(&format!("/assistant/conversations/{}", id));

        ureq::delete(&url)
            .header("Authorization", &self.bearer())
            .call()
            .context("Failed to delete conversation")?;

        Ok(())
    }
}
