//! Assistant session orchestration
//!
//! Owns one conversation turn end to end: append the user message, open the
//! response stream, fold text deltas into a placeholder message, then run
//! any tool calls through the dispatcher. Also fronts the conversation
//! persistence API (list, load, delete) for the shell.

use anyhow::Result;
use log::{error, info, warn};
use mail::MailStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::api::{AssistantBackend, ChatRequest, ConversationSummary, HistoryEntry};
use crate::context::ChatContext;
use crate::dispatcher::ToolDispatcher;
use crate::gate::{ConfirmationGate, PendingAction};
use crate::persistence::PersistenceBridge;
use crate::stream::{StreamDecoder, StreamEvent};
use crate::tools::{ToolAction, ToolCall};
use crate::transcript::{ChatMessage, MessageId, MessageKind, MessagePatch, Transcript};

/// How many prior messages accompany each chat request
const HISTORY_LIMIT: usize = 10;

/// One assistant conversation bound to a mail store
pub struct AssistantSession {
    mail: Arc<MailStore>,
    backend: Arc<dyn AssistantBackend>,
    transcript: Arc<Transcript>,
    gate: Arc<ConfirmationGate>,
    bridge: Arc<PersistenceBridge>,
    dispatcher: ToolDispatcher,
    conversations: Mutex<Vec<ConversationSummary>>,
    is_processing: AtomicBool,
}

impl AssistantSession {
    /// Wire up a session over the given mail store and assistant backend
    pub fn new(mail: Arc<MailStore>, backend: Arc<dyn AssistantBackend>) -> Self {
        let transcript = Arc::new(Transcript::new());
        let gate = Arc::new(ConfirmationGate::new());
        let bridge = Arc::new(PersistenceBridge::new(backend.clone()));
        let dispatcher = ToolDispatcher::new(
            mail.clone(),
            transcript.clone(),
            gate.clone(),
            bridge.clone(),
        );
        Self {
            mail,
            backend,
            transcript,
            gate,
            bridge,
            dispatcher,
            conversations: Mutex::new(Vec::new()),
            is_processing: AtomicBool::new(false),
        }
    }

    /// The session transcript
    pub fn transcript(&self) -> &Arc<Transcript> {
        &self.transcript
    }

    /// The confirmation gate
    pub fn gate(&self) -> &Arc<ConfirmationGate> {
        &self.gate
    }

    /// Whether a turn is currently in flight
    pub fn is_processing(&self) -> bool {
        self.is_processing.load(Ordering::SeqCst)
    }

    /// Cached conversation summaries, most recent first
    pub fn conversations(&self) -> Vec<ConversationSummary> {
        self.conversations.lock().unwrap().clone()
    }

    /// The active conversation id, if one is bound
    pub fn conversation_id(&self) -> Option<String> {
        self.bridge.current()
    }

    /// Send one user message and process the full response turn
    ///
    /// Re-entrant calls while a turn is in flight are rejected; blank
    /// messages are ignored.
    pub fn send_message(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if self
            .is_processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Dropping message sent while a turn is in flight");
            return;
        }

        self.run_turn(text);
        self.is_processing.store(false, Ordering::SeqCst);
    }

    fn run_turn(&self, text: &str) {
        // History is what the user saw before typing this message
        let history: Vec<HistoryEntry> = self
            .transcript
            .last_n(HISTORY_LIMIT)
            .iter()
            .map(HistoryEntry::from)
            .collect();

        // The chat endpoint stores the user message and the streamed reply
        // server-side; only dispatcher and gate status messages go through
        // the persistence bridge.
        self.transcript.append(ChatMessage::user(text));

        // Placeholder the stream folds text deltas into
        let placeholder_id = self.transcript.append(ChatMessage::assistant(""));

        let request = ChatRequest {
            message: text.to_string(),
            context: ChatContext::from_store(&self.mail),
            conversation_history: history,
            conversation_id: self.bridge.current(),
        };

        let reader = match self.backend.chat_stream(&request) {
            Ok(reader) => reader,
            Err(e) => {
                error!("Chat stream failed to open: {:#}", e);
                self.transcript.update_by_id(
                    &placeholder_id,
                    MessagePatch {
                        content: Some(format!("Sorry, I encountered an error: {}", e)),
                        kind: Some(MessageKind::Error),
                    },
                );
                return;
            }
        };

        let outcome = self.drain_stream(reader, &placeholder_id);

        if outcome.text.is_empty() && !outcome.had_error {
            // Nothing visible accumulated; drop the placeholder so tool
            // status messages do not trail an empty bubble
            self.transcript.delete_by_id(&placeholder_id);
        }

        for call in outcome.tool_calls {
            match ToolAction::parse(&call) {
                Some(action) => self.dispatcher.execute(action),
                None => warn!("Skipping unrecognized tool call {:?}", call.name),
            }
        }
    }

    /// Fold stream events into the placeholder, collecting tool calls
    fn drain_stream(&self, reader: Box<dyn std::io::Read>, placeholder_id: &MessageId) -> TurnOutcome {
        let mut outcome = TurnOutcome::default();

        for event in StreamDecoder::new(reader) {
            match event {
                StreamEvent::Text { content } => {
                    outcome.text.push_str(&content);
                    self.transcript.update_by_id(
                        placeholder_id,
                        MessagePatch {
                            content: Some(outcome.text.clone()),
                            kind: None,
                        },
                    );
                }
                StreamEvent::ToolCalls { tool_calls } => {
                    // The backend sends the full batch; a later event
                    // supersedes an earlier one
                    outcome.tool_calls = tool_calls;
                }
                StreamEvent::Meta { conversation_id } => {
                    if let Some(id) = conversation_id {
                        info!("Conversation bound: {}", id);
                        self.bridge.bind(id);
                        if let Err(e) = self.load_conversations() {
                            warn!("Failed to refresh conversation list: {:#}", e);
                        }
                    }
                }
                StreamEvent::Error { error } => {
                    error!("Assistant stream reported an error: {}", error);
                    outcome.had_error = true;
                    self.transcript.update_by_id(
                        placeholder_id,
                        MessagePatch {
                            content: Some(error),
                            kind: Some(MessageKind::Error),
                        },
                    );
                }
            }
        }

        outcome
    }

    /// Execute the pending gated action. No-op while the gate is idle.
    pub fn confirm_action(&self) {
        match self.gate.confirm() {
            Some(PendingAction::SendEmail) => match self.mail.send_email() {
                Ok(id) => {
                    info!("Email sent: {}", id.as_str());
                    self.say("Email sent successfully!", MessageKind::Success);
                }
                Err(e) => {
                    error!("Send failed: {:#}", e);
                    // Draft is intact; leave the gate armed for a retry
                    self.gate.arm(PendingAction::SendEmail);
                    self.say(
                        "I couldn't send the email. The draft is still here if you want to try again.",
                        MessageKind::Error,
                    );
                }
            },
            None => {}
        }
    }

    /// Discard the pending gated action. The compose draft is kept so the
    /// user can edit and send manually. No-op while the gate is idle.
    pub fn cancel_action(&self) {
        if self.gate.cancel().is_some() {
            self.say("Action cancelled.", MessageKind::Info);
        }
    }

    /// Refresh the cached conversation summaries from the backend
    pub fn load_conversations(&self) -> Result<()> {
        let summaries = self.backend.list_conversations()?;
        *self.conversations.lock().unwrap() = summaries;
        Ok(())
    }

    /// Load a stored conversation into the transcript and bind it
    pub fn load_conversation(&self, id: &str) -> Result<()> {
        let conversation = self.backend.get_conversation(id)?;
        self.transcript.replace_all(conversation.messages);
        self.bridge.bind(conversation.id);
        self.gate.cancel();
        Ok(())
    }

    /// Clear the transcript and unbind, starting a fresh conversation
    pub fn start_new_conversation(&self) {
        self.transcript.clear();
        self.bridge.unbind();
        self.gate.cancel();
    }

    /// Delete a stored conversation; if it is the active one, start fresh
    pub fn delete_conversation(&self, id: &str) -> Result<()> {
        self.backend.delete_conversation(id)?;
        self.conversations
            .lock()
            .unwrap()
            .retain(|summary| summary.id != id);
        if self.bridge.current().as_deref() == Some(id) {
            self.start_new_conversation();
        }
        Ok(())
    }

    fn say(&self, content: &str, kind: MessageKind) {
        let message = ChatMessage::assistant(content).with_kind(kind);
        self.transcript.append(message.clone());
        self.bridge.persist(&message);
    }
}

/// What a drained stream produced
#[derive(Default)]
struct TurnOutcome {
    text: String,
    tool_calls: Vec<ToolCall>,
    had_error: bool,
}
