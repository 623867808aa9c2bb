//! Domain models for mail entities

mod email;
mod state;

pub use email::{Email, EmailAddress, EmailBuilder, EmailId, OutgoingEmail};
pub use state::{ComposeDraft, DraftPatch, FilterPatch, InboxFilters, Page, View};
