//! Email model as served by the Vela backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for an email (backend message ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailId(pub String);

impl EmailId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for EmailId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EmailId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An email address with optional display name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailAddress {
    /// Display name (e.g., "John Doe")
    pub name: Option<String>,
    /// Email address (e.g., "john@example.com")
    pub email: String,
}

impl EmailAddress {
    /// Create a new email address with just the email
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }

    /// Create a new email address with a display name
    pub fn with_name(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: email.into(),
        }
    }

    /// Parse an email address from a string like "John Doe <john@example.com>"
    pub fn parse(s: &str) -> Self {
        let s = s.trim();

        // Try to parse "Name <email>" format
        if let Some(angle_start) = s.rfind('<')
            && let Some(angle_end) = s.rfind('>')
            && angle_start < angle_end
        {
            let name = s[..angle_start].trim();
            let email = s[angle_start + 1..angle_end].trim();
            return Self {
                name: if name.is_empty() {
                    None
                } else {
                    Some(name.to_string())
                },
                email: email.to_string(),
            };
        }

        // Otherwise, treat the whole string as an email
        Self {
            name: None,
            email: s.to_string(),
        }
    }

    /// Format the email address for display
    pub fn display(&self) -> String {
        match &self.name {
            Some(name) => format!("{} <{}>", name, self.email),
            None => self.email.clone(),
        }
    }
}

/// A single email as returned by the backend
///
/// List endpoints return emails without `body_text` populated; the single
/// email endpoint fills it in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Email {
    /// Backend message ID
    pub id: EmailId,
    /// ID of the thread this email belongs to
    pub thread_id: Option<String>,
    /// Sender address
    pub from_address: EmailAddress,
    /// Recipient addresses (To field)
    #[serde(default)]
    pub to_address: Vec<String>,
    /// CC recipients
    #[serde(default)]
    pub cc_address: Vec<String>,
    /// Subject line
    pub subject: String,
    /// Short plain-text preview of the body
    pub snippet: String,
    /// Full plain-text body, when fetched individually
    #[serde(default)]
    pub body_text: Option<String>,
    /// When the email was received
    pub date: DateTime<Utc>,
    /// Whether the email has been read
    pub is_read: bool,
    /// Whether the email carries at least one attachment
    #[serde(default)]
    pub has_attachment: bool,
}

impl Email {
    /// Create a new email builder
    pub fn builder(id: EmailId) -> EmailBuilder {
        EmailBuilder::new(id)
    }

    /// Best available body text, falling back to the snippet
    pub fn body_or_snippet(&self) -> &str {
        self.body_text.as_deref().unwrap_or(&self.snippet)
    }
}

/// Builder for creating Email instances
pub struct EmailBuilder {
    id: EmailId,
    thread_id: Option<String>,
    from_address: Option<EmailAddress>,
    to_address: Vec<String>,
    cc_address: Vec<String>,
    subject: String,
    snippet: String,
    body_text: Option<String>,
    date: Option<DateTime<Utc>>,
    is_read: bool,
    has_attachment: bool,
}

impl EmailBuilder {
    fn new(id: EmailId) -> Self {
        Self {
            id,
            thread_id: None,
            from_address: None,
            to_address: Vec::new(),
            cc_address: Vec::new(),
            subject: String::new(),
            snippet: String::new(),
            body_text: None,
            date: None,
            is_read: false,
            has_attachment: false,
        }
    }

    pub fn thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn from(mut self, from: EmailAddress) -> Self {
        self.from_address = Some(from);
        self
    }

    pub fn to(mut self, to: Vec<String>) -> Self {
        self.to_address = to;
        self
    }

    pub fn cc(mut self, cc: Vec<String>) -> Self {
        self.cc_address = cc;
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn body_text(mut self, body_text: impl Into<String>) -> Self {
        self.body_text = Some(body_text.into());
        self
    }

    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn is_read(mut self, is_read: bool) -> Self {
        self.is_read = is_read;
        self
    }

    pub fn has_attachment(mut self, has_attachment: bool) -> Self {
        self.has_attachment = has_attachment;
        self
    }

    pub fn build(self) -> Email {
        Email {
            id: self.id,
            thread_id: self.thread_id,
            from_address: self
                .from_address
                .unwrap_or_else(|| EmailAddress::new("unknown@unknown.com")),
            to_address: self.to_address,
            cc_address: self.cc_address,
            subject: self.subject,
            snippet: self.snippet,
            body_text: self.body_text,
            date: self.date.unwrap_or_else(Utc::now),
            is_read: self.is_read,
            has_attachment: self.has_attachment,
        }
    }
}

/// Payload for sending an email through the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
    /// ID of the email being replied to, if any
    pub reply_to_id: Option<EmailId>,
}
