//! Chat context assembly
//!
//! Every user message is sent with a snapshot of what the mail UI is
//! showing, so the backend can ground tool calls in the visible state.

use chrono::{DateTime, Utc};
use mail::{ComposeDraft, Email, InboxFilters, MailStore};
use serde::Serialize;

/// How many visible emails are summarized into the context
const VISIBLE_EMAIL_LIMIT: usize = 5;

/// Mailbox counters
#[derive(Debug, Clone, Serialize)]
pub struct ContextStats {
    pub inbox_count: usize,
    pub sent_count: usize,
}

/// Summary of one visible email
#[derive(Debug, Clone, Serialize)]
pub struct VisibleEmail {
    pub id: String,
    pub from: String,
    pub subject: String,
    pub snippet: String,
    pub date: DateTime<Utc>,
    pub is_unread: bool,
}

impl From<&Email> for VisibleEmail {
    fn from(email: &Email) -> Self {
        // Prefer the address, fall back to the display name
        let from = if email.from_address.email.is_empty() {
            email.from_address.name.clone().unwrap_or_default()
        } else {
            email.from_address.email.clone()
        };
        Self {
            id: email.id.as_str().to_string(),
            from,
            subject: email.subject.clone(),
            snippet: email.snippet.clone(),
            date: email.date,
            is_unread: !email.is_read,
        }
    }
}

/// Summary of the open email, body included
#[derive(Debug, Clone, Serialize)]
pub struct OpenEmail {
    pub id: String,
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    pub date: DateTime<Utc>,
}

impl From<&Email> for OpenEmail {
    fn from(email: &Email) -> Self {
        Self {
            id: email.id.as_str().to_string(),
            from: email.from_address.email.clone(),
            to: email.to_address.clone(),
            subject: email.subject.clone(),
            body: email.body_or_snippet().to_string(),
            date: email.date,
        }
    }
}

/// The mail-state snapshot attached to each chat request
#[derive(Debug, Clone, Serialize)]
pub struct ChatContext {
    pub current_view: String,
    pub is_searching: bool,
    pub search_query: String,
    pub stats: ContextStats,
    pub visible_emails: Vec<VisibleEmail>,
    pub open_email: Option<OpenEmail>,
    pub compose_draft: ComposeDraft,
    pub inbox_filter: InboxFilters,
}

impl ChatContext {
    /// Snapshot the mail store into a chat context
    pub fn from_store(store: &MailStore) -> Self {
        let visible = store.visible_emails();
        Self {
            current_view: store.current_view().as_str().to_string(),
            is_searching: store.is_search_active(),
            search_query: store.current_search_query(),
            stats: ContextStats {
                inbox_count: store.total_emails(),
                sent_count: store.total_sent(),
            },
            visible_emails: visible
                .iter()
                .take(VISIBLE_EMAIL_LIMIT)
                .map(VisibleEmail::from)
                .collect(),
            open_email: store.current_email().as_ref().map(OpenEmail::from),
            compose_draft: store.compose_draft(),
            inbox_filter: store.filters(),
        }
    }
}
