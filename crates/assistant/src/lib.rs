//! Assistant crate - Conversational layer over the mail store
//!
//! This crate turns a streaming chat backend into mail actions:
//! - Stream decoding: newline-delimited `data: <json>` records into typed
//!   events, resilient to records split across reads
//! - The transcript: ordered chat messages with stable ids and typed
//!   status kinds
//! - Tool calls: a closed set of actions decoded from backend payloads and
//!   dispatched against the mail store
//! - The confirmation gate: irreversible effects (sending email) wait for
//!   explicit user sign-off
//! - Conversation persistence: best-effort replication of the transcript
//!   to the backend conversation store
//!
//! [`AssistantSession`] wires these together; the shell only needs the
//! session plus a [`mail::MailStore`].

pub mod api;
pub mod context;
pub mod dispatcher;
pub mod gate;
pub mod persistence;
pub mod session;
pub mod stream;
pub mod tools;
pub mod transcript;

pub use api::{AssistantBackend, ChatRequest, Conversation, ConversationSummary, HttpAssistantBackend};
pub use context::ChatContext;
pub use dispatcher::ToolDispatcher;
pub use gate::{ConfirmationGate, PendingAction};
pub use persistence::PersistenceBridge;
pub use session::AssistantSession;
pub use stream::{StreamDecoder, StreamEvent};
pub use tools::{ToolAction, ToolCall};
pub use transcript::{ChatMessage, MessageId, MessageKind, MessagePatch, Role, Transcript};
