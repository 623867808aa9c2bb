//! Tool call decoding
//!
//! The backend emits tool calls as loose `{name, arguments}` pairs. They are
//! parsed into the closed [`ToolAction`] sum type here, at the
//! deserialization boundary; the dispatcher then matches exhaustively, so
//! adding a tool is adding a variant plus one match arm. Unknown tool names
//! and malformed argument objects are logged and dropped here, never inside
//! dispatch.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A raw tool call as it appears on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    /// Argument object; unknown extra fields are accepted and ignored
    #[serde(default)]
    pub arguments: Value,
}

/// Arguments for `compose_email`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComposeArgs {
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub bcc: Vec<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

/// Arguments for `search_emails`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchArgs {
    pub sender: Option<String>,
    pub subject_keywords: Option<String>,
    pub body_keywords: Option<String>,
    pub has_attachment: Option<bool>,
    /// Symbolic range, resolved to an absolute date at dispatch time
    pub date_range: Option<String>,
    /// Raw fallback query
    pub query: Option<String>,
}

/// Arguments for `filter_emails`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterArgs {
    pub days_ago: Option<u32>,
    pub is_unread: Option<bool>,
    pub from_address: Option<String>,
}

/// Arguments for `open_email`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenArgs {
    pub email_id: Option<String>,
    /// 1-based position in the currently visible inbox list
    pub list_position: Option<usize>,
    pub sender: Option<String>,
    pub subject: Option<String>,
    pub is_latest: Option<bool>,
}

/// Arguments for `navigate`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NavigateArgs {
    pub view: Option<String>,
}

/// Arguments for `reply_to_email`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplyArgs {
    pub email_id: Option<String>,
    /// Overrides the quoted-body default
    pub body: Option<String>,
}

/// Arguments for `delete_email`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteArgs {
    pub email_id: Option<String>,
}

/// Arguments for `mark_as_read`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarkReadArgs {
    pub email_id: Option<String>,
    #[serde(default)]
    pub is_read: bool,
}

/// The closed set of tool actions the dispatcher understands
#[derive(Debug, Clone)]
pub enum ToolAction {
    ComposeEmail(ComposeArgs),
    SendEmail,
    SearchEmails(SearchArgs),
    FilterEmails(FilterArgs),
    OpenEmail(OpenArgs),
    Navigate(NavigateArgs),
    ReplyToEmail(ReplyArgs),
    DeleteEmail(DeleteArgs),
    MarkAsRead(MarkReadArgs),
    RefreshInbox,
}

impl ToolAction {
    /// Parse a raw tool call into an action
    ///
    /// Unknown names and malformed argument objects are logged and yield
    /// `None`; the caller skips them.
    pub fn parse(call: &ToolCall) -> Option<ToolAction> {
        fn args<T: serde::de::DeserializeOwned + Default>(name: &str, value: &Value) -> Option<T> {
            // A missing argument object means "all defaults"
            if value.is_null() {
                return Some(T::default());
            }
            match serde_json::from_value(value.clone()) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    warn!("Malformed arguments for tool {}: {}", name, e);
                    None
                }
            }
        }

        let action = match call.name.as_str() {
            "compose_email" => ToolAction::ComposeEmail(args(&call.name, &call.arguments)?),
            "send_email" => ToolAction::SendEmail,
            "search_emails" => ToolAction::SearchEmails(args(&call.name, &call.arguments)?),
            "filter_emails" => ToolAction::FilterEmails(args(&call.name, &call.arguments)?),
            "open_email" => ToolAction::OpenEmail(args(&call.name, &call.arguments)?),
            "navigate" => ToolAction::Navigate(args(&call.name, &call.arguments)?),
            "reply_to_email" => ToolAction::ReplyToEmail(args(&call.name, &call.arguments)?),
            "delete_email" => ToolAction::DeleteEmail(args(&call.name, &call.arguments)?),
            "mark_as_read" => ToolAction::MarkAsRead(args(&call.name, &call.arguments)?),
            "refresh_inbox" => ToolAction::RefreshInbox,
            unknown => {
                warn!("Unknown tool: {}", unknown);
                return None;
            }
        };
        Some(action)
    }
}
