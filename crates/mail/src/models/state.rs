//! Client-side state types: views, compose draft, inbox filters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Email, EmailId};

/// The view the mail UI is currently showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Inbox,
    Sent,
    Compose,
    Email,
    Thread,
}

impl View {
    /// Views that render a mailbox listing and need fresh data on entry
    pub fn is_list_view(&self) -> bool {
        matches!(self, View::Inbox | View::Sent)
    }

    /// Parse a view name as sent by the assistant backend
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "inbox" => Some(View::Inbox),
            "sent" => Some(View::Sent),
            "compose" => Some(View::Compose),
            "email" => Some(View::Email),
            "thread" => Some(View::Thread),
            _ => None,
        }
    }

    /// Name used in user-facing messages and wire payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Inbox => "inbox",
            View::Sent => "sent",
            View::Compose => "compose",
            View::Email => "email",
            View::Thread => "thread",
        }
    }
}

/// The compose form state
///
/// Mutated incrementally by both direct user edits and assistant tool calls,
/// and fully reset on send-success. Cancelling a pending send keeps the
/// draft so the user can edit and send manually.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComposeDraft {
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
    pub reply_to_id: Option<EmailId>,
}

impl ComposeDraft {
    /// Reset the draft to its empty state
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Merge a partial update into the draft. Unset patch fields are left
    /// untouched.
    pub fn merge(&mut self, patch: DraftPatch) {
        if let Some(to) = patch.to {
            self.to = to;
        }
        if let Some(cc) = patch.cc {
            self.cc = cc;
        }
        if let Some(bcc) = patch.bcc {
            self.bcc = bcc;
        }
        if let Some(subject) = patch.subject {
            self.subject = subject;
        }
        if let Some(body) = patch.body {
            self.body = body;
        }
        if let Some(reply_to_id) = patch.reply_to_id {
            self.reply_to_id = Some(reply_to_id);
        }
    }
}

/// Partial update to a [`ComposeDraft`]
#[derive(Debug, Clone, Default)]
pub struct DraftPatch {
    pub to: Option<Vec<String>>,
    pub cc: Option<Vec<String>>,
    pub bcc: Option<Vec<String>>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub reply_to_id: Option<EmailId>,
}

/// Inbox listing filters. All fields are optional; `None` means unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboxFilters {
    pub from_address: Option<String>,
    pub after_date: Option<DateTime<Utc>>,
    pub before_date: Option<DateTime<Utc>>,
    pub is_unread: Option<bool>,
    pub query: Option<String>,
}

impl InboxFilters {
    /// Reset all filters
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Merge a partial update into the filters. Unset patch fields are left
    /// untouched.
    pub fn merge(&mut self, patch: FilterPatch) {
        if let Some(from_address) = patch.from_address {
            self.from_address = Some(from_address);
        }
        if let Some(after_date) = patch.after_date {
            self.after_date = Some(after_date);
        }
        if let Some(before_date) = patch.before_date {
            self.before_date = Some(before_date);
        }
        if let Some(is_unread) = patch.is_unread {
            self.is_unread = Some(is_unread);
        }
        if let Some(query) = patch.query {
            self.query = Some(query);
        }
    }
}

/// Partial update to [`InboxFilters`]
#[derive(Debug, Clone, Default)]
pub struct FilterPatch {
    pub from_address: Option<String>,
    pub after_date: Option<DateTime<Utc>>,
    pub before_date: Option<DateTime<Utc>>,
    pub is_unread: Option<bool>,
    pub query: Option<String>,
}

/// One page of a mailbox listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    pub emails: Vec<Email>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub total: usize,
}
