//! Backend abstraction for mail operations

mod client;

pub use client::HttpMailBackend;

use anyhow::Result;

use crate::models::{Email, EmailId, InboxFilters, OutgoingEmail, Page};

/// Error indicating the requested email does not exist on the server
#[derive(Debug, thiserror::Error)]
#[error("Email not found")]
pub struct EmailNotFoundError;

/// Trait for the mail backend service
///
/// This trait abstracts over the network boundary so the store can be
/// exercised against an in-memory double in tests.
pub trait MailBackend: Send + Sync {
    /// Fetch one page of the inbox listing, optionally filtered
    fn fetch_inbox(&self, filters: &InboxFilters, page_token: Option<&str>) -> Result<Page>;

    /// Fetch the sent listing
    fn fetch_sent(&self) -> Result<Page>;

    /// Fetch a single email with full body
    fn fetch_email(&self, id: &EmailId) -> Result<Email>;

    /// Fetch all messages in the thread containing the given email,
    /// ordered chronologically
    fn fetch_thread(&self, id: &EmailId) -> Result<Vec<Email>>;

    /// Count emails under a label ("INBOX" or "SENT")
    fn count(&self, label: &str) -> Result<usize>;

    /// Run a server-side search and return matching emails
    fn search(&self, query: &str) -> Result<Vec<Email>>;

    /// Send an email, returning the ID assigned by the server
    fn send(&self, email: &OutgoingEmail) -> Result<EmailId>;

    /// Set the read flag on an email
    fn set_read(&self, id: &EmailId, is_read: bool) -> Result<()>;

    /// Delete an email
    fn delete(&self, id: &EmailId) -> Result<()>;
}
