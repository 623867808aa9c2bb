//! Integration tests for the mail crate
//!
//! These tests drive full flows through the store against an in-memory
//! backend: pagination, search round trips, and optimistic mutations.

use anyhow::Result;
use chrono::Utc;
use mail::{
    Email, EmailAddress, EmailId, InboxFilters, MailBackend, MailStore, OutgoingEmail, Page, View,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Paged in-memory backend
struct PagedBackend {
    pages: Vec<Vec<Email>>,
    fail_mutations: AtomicBool,
    read_flags: Mutex<Vec<(String, bool)>>,
}

impl PagedBackend {
    fn new(pages: Vec<Vec<Email>>) -> Self {
        Self {
            pages,
            fail_mutations: AtomicBool::new(false),
            read_flags: Mutex::new(Vec::new()),
        }
    }
}

impl MailBackend for PagedBackend {
    fn fetch_inbox(&self, _filters: &InboxFilters, page_token: Option<&str>) -> Result<Page> {
        let index: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let emails = self.pages.get(index).cloned().unwrap_or_default();
        let next = (index + 1 < self.pages.len()).then(|| (index + 1).to_string());
        Ok(Page {
            emails,
            next_page_token: next,
            total: self.pages.iter().map(Vec::len).sum(),
        })
    }

    fn fetch_sent(&self) -> Result<Page> {
        Ok(Page::default())
    }

    fn fetch_email(&self, id: &EmailId) -> Result<Email> {
        self.pages
            .iter()
            .flatten()
            .find(|e| &e.id == id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("not found"))
    }

    fn fetch_thread(&self, id: &EmailId) -> Result<Vec<Email>> {
        Ok(vec![self.fetch_email(id)?])
    }

    fn count(&self, _label: &str) -> Result<usize> {
        Ok(self.pages.iter().map(Vec::len).sum())
    }

    fn search(&self, query: &str) -> Result<Vec<Email>> {
        let needle = query.to_lowercase();
        Ok(self
            .pages
            .iter()
            .flatten()
            .filter(|e| e.subject.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    fn send(&self, _email: &OutgoingEmail) -> Result<EmailId> {
        Ok(EmailId::new("sent-1"))
    }

    fn set_read(&self, id: &EmailId, is_read: bool) -> Result<()> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            anyhow::bail!("backend unavailable");
        }
        self.read_flags
            .lock()
            .unwrap()
            .push((id.as_str().to_string(), is_read));
        Ok(())
    }

    fn delete(&self, _id: &EmailId) -> Result<()> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            anyhow::bail!("backend unavailable");
        }
        Ok(())
    }
}

/// Helper to create test emails
fn make_email(id: &str, subject: &str, age_hours: i64) -> Email {
    Email::builder(EmailId::new(id))
        .from(EmailAddress::with_name("Test User", "test@example.com"))
        .subject(subject)
        .snippet(format!("Snippet for {}", id))
        .date(Utc::now() - chrono::Duration::hours(age_hours))
        .build()
}

fn paged_store() -> (Arc<PagedBackend>, MailStore) {
    let backend = Arc::new(PagedBackend::new(vec![
        vec![make_email("m1", "Alpha", 1), make_email("m2", "Beta", 2)],
        vec![make_email("m3", "Gamma", 3), make_email("m4", "Delta", 4)],
        vec![make_email("m5", "Alpha again", 5)],
    ]));
    let store = MailStore::new(backend.clone());
    store.fetch_inbox().unwrap();
    (backend, store)
}

#[test]
fn test_pagination_forward_and_back() {
    let (_backend, store) = paged_store();
    assert_eq!(store.current_page(), 1);
    assert_eq!(store.inbox()[0].id.as_str(), "m1");

    store.next_page().unwrap();
    assert_eq!(store.current_page(), 2);
    assert_eq!(store.inbox()[0].id.as_str(), "m3");

    store.next_page().unwrap();
    assert_eq!(store.current_page(), 3);
    assert_eq!(store.inbox()[0].id.as_str(), "m5");
    // Last page has no next token
    assert!(store.next_page_token().is_none());

    store.prev_page().unwrap();
    assert_eq!(store.current_page(), 2);
    assert_eq!(store.inbox()[0].id.as_str(), "m3");

    store.prev_page().unwrap();
    assert_eq!(store.current_page(), 1);
    assert_eq!(store.inbox()[0].id.as_str(), "m1");
}

#[test]
fn test_refetch_resets_pagination() {
    let (_backend, store) = paged_store();
    store.next_page().unwrap();
    assert_eq!(store.current_page(), 2);

    store.fetch_inbox().unwrap();
    assert_eq!(store.current_page(), 1);
    assert_eq!(store.inbox()[0].id.as_str(), "m1");
}

#[test]
fn test_search_round_trip_restores_inbox() {
    let (_backend, store) = paged_store();
    store.search("alpha").unwrap();

    assert!(store.is_search_active());
    assert_eq!(store.current_search_query(), "alpha");
    // Results are mirrored into the inbox partition
    let results = store.inbox();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|e| e.subject.to_lowercase().contains("alpha")));

    store.exit_search().unwrap();
    assert!(!store.is_search_active());
    assert!(store.current_search_query().is_empty());
    assert_eq!(store.inbox().len(), 2);
    assert_eq!(store.inbox()[0].id.as_str(), "m1");
}

#[test]
fn test_open_then_thread_flow() {
    let (_backend, store) = paged_store();
    let email = store.fetch_email(&EmailId::new("m2")).unwrap();
    assert_eq!(email.subject, "Beta");
    assert_eq!(store.current_email().unwrap().id.as_str(), "m2");

    let thread = store.fetch_thread(&EmailId::new("m2")).unwrap();
    assert_eq!(thread.len(), 1);
    // The open email tracks the latest message in the thread
    assert_eq!(store.current_email().unwrap().id.as_str(), "m2");
}

#[test]
fn test_set_read_reverts_to_prior_value_on_failure() {
    let (backend, store) = paged_store();

    // Mark read while healthy so the local flag is true
    store.set_read(&EmailId::new("m1"), true).unwrap();
    assert!(store.inbox()[0].is_read);

    // Now flip to unread against a failing backend
    backend.fail_mutations.store(true, Ordering::SeqCst);
    assert!(store.set_read(&EmailId::new("m1"), false).is_err());

    // The flag reverted to the value it had before this call, not to a
    // blind toggle of the requested one
    assert!(store.inbox()[0].is_read);
    assert_eq!(backend.read_flags.lock().unwrap().as_slice(), &[("m1".to_string(), true)]);
}

#[test]
fn test_delete_restores_row_in_place_on_failure() {
    let (backend, store) = paged_store();
    backend.fail_mutations.store(true, Ordering::SeqCst);

    assert!(store.delete(&EmailId::new("m2")).is_err());

    let inbox = store.inbox();
    assert_eq!(inbox.len(), 2);
    assert_eq!(inbox[1].id.as_str(), "m2");
    assert!(store.last_error().is_some());
}

#[test]
fn test_send_flow_clears_draft() {
    let (_backend, store) = paged_store();
    store.set_current_view(View::Compose);
    store.merge_draft(mail::DraftPatch {
        to: Some(vec!["a@example.com".to_string()]),
        subject: Some("Hello".to_string()),
        body: Some("Hi there".to_string()),
        ..Default::default()
    });

    let id = store.send_email().unwrap();
    assert_eq!(id.as_str(), "sent-1");
    assert!(store.compose_draft().to.is_empty());
    assert!(store.compose_draft().subject.is_empty());
}

#[test]
fn test_prepend_new_dedups_and_leads() {
    let (_backend, store) = paged_store();
    store.prepend_new(vec![make_email("m9", "Fresh", 0), make_email("m1", "Alpha", 1)]);

    let inbox = store.inbox();
    assert_eq!(inbox.len(), 3);
    assert_eq!(inbox[0].id.as_str(), "m9");
    // m1 was already present and is not duplicated
    assert_eq!(inbox.iter().filter(|e| e.id.as_str() == "m1").count(), 1);
}

#[test]
fn test_visible_emails_follow_view_and_search() {
    let (_backend, store) = paged_store();
    store.set_current_view(View::Sent);
    assert!(store.visible_emails().is_empty());

    store.set_current_view(View::Inbox);
    assert_eq!(store.visible_emails().len(), 2);

    store.search("alpha").unwrap();
    // Search results win regardless of view
    assert_eq!(store.visible_emails().len(), 2);
    assert!(store.visible_emails().iter().all(|e| e.subject.to_lowercase().contains("alpha")));
}
