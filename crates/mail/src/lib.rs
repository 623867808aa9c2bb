//! Mail crate - Client-side state and API access for email operations
//!
//! This crate provides the mail half of the Vela client:
//! - Domain models (Email, EmailAddress, ComposeDraft, InboxFilters)
//! - REST API client for the Vela backend
//! - The mail state store: mailbox partitions, selection, draft, filters,
//!   pagination, and optimistic mutations with revert on failure
//!
//! This crate has zero UI and zero assistant dependencies; the assistant
//! crate drives it through the same store API the UI uses.

pub mod api;
pub mod models;
pub mod store;

pub use api::{EmailNotFoundError, HttpMailBackend, MailBackend};
pub use models::{
    ComposeDraft, DraftPatch, Email, EmailAddress, EmailBuilder, EmailId, FilterPatch,
    InboxFilters, OutgoingEmail, Page, View,
};
pub use store::MailStore;
