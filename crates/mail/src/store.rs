//! Mail state store
//!
//! Single source of truth for mailbox contents, current selection, compose
//! draft, and filters. Holds pure state plus API-calling actions; it has no
//! knowledge of the assistant.
//!
//! List-replacing fetches REPLACE the partition wholesale, never merge. The
//! one exception is [`MailStore::prepend_new`], the real-time new-mail entry
//! point, which prepends only ids not already present.
//!
//! Mutations that update the UI before the server acknowledges (read flag,
//! delete) are optimistic: the transform is applied locally, the backend is
//! called, and on failure the captured pre-change state is restored by the
//! same operation.

use anyhow::Result;
use log::{info, warn};
use std::sync::{Arc, Mutex};

use crate::api::MailBackend;
use crate::models::{
    ComposeDraft, DraftPatch, Email, EmailId, FilterPatch, InboxFilters, OutgoingEmail, View,
};

/// The three id-keyed, list-ordered mailbox partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Partition {
    Inbox,
    Sent,
    SearchResults,
}

const ALL_PARTITIONS: [Partition; 3] = [
    Partition::Inbox,
    Partition::Sent,
    Partition::SearchResults,
];

/// Mutable state behind the store lock
struct MailState {
    inbox: Vec<Email>,
    sent: Vec<Email>,
    search_results: Vec<Email>,

    current_email: Option<Email>,
    current_thread: Option<Vec<Email>>,
    current_view: View,
    last_list_view: View,

    compose_draft: ComposeDraft,
    filters: InboxFilters,

    // Pagination
    next_page_token: Option<String>,
    page_tokens: Vec<String>,
    current_page: usize,
    total_emails: usize,
    total_sent: usize,

    // Search mode, distinct from filter state
    is_search_active: bool,
    current_search_query: String,
    search_results_count: usize,

    is_loading: bool,
    last_error: Option<String>,
}

impl Default for MailState {
    fn default() -> Self {
        Self {
            inbox: Vec::new(),
            sent: Vec::new(),
            search_results: Vec::new(),
            current_email: None,
            current_thread: None,
            current_view: View::Inbox,
            last_list_view: View::Inbox,
            compose_draft: ComposeDraft::default(),
            filters: InboxFilters::default(),
            next_page_token: None,
            page_tokens: Vec::new(),
            current_page: 1,
            total_emails: 0,
            total_sent: 0,
            is_search_active: false,
            current_search_query: String::new(),
            search_results_count: 0,
            is_loading: false,
            last_error: None,
        }
    }
}

impl MailState {
    fn partition(&self, partition: Partition) -> &Vec<Email> {
        match partition {
            Partition::Inbox => &self.inbox,
            Partition::Sent => &self.sent,
            Partition::SearchResults => &self.search_results,
        }
    }

    fn partition_mut(&mut self, partition: Partition) -> &mut Vec<Email> {
        match partition {
            Partition::Inbox => &mut self.inbox,
            Partition::Sent => &mut self.sent,
            Partition::SearchResults => &mut self.search_results,
        }
    }

    /// Apply a read-flag value to every copy of the email. The inverse is
    /// the same transform with the captured pre-change value.
    fn apply_read_flag(&mut self, id: &EmailId, is_read: bool) {
        for partition in ALL_PARTITIONS {
            for email in self.partition_mut(partition) {
                if &email.id == id {
                    email.is_read = is_read;
                }
            }
        }
        if let Some(current) = &mut self.current_email
            && &current.id == id
        {
            current.is_read = is_read;
        }
    }

    /// Current read flag for an email, looked up across partitions
    fn read_flag(&self, id: &EmailId) -> Option<bool> {
        for partition in ALL_PARTITIONS {
            if let Some(email) = self.partition(partition).iter().find(|e| &e.id == id) {
                return Some(email.is_read);
            }
        }
        self.current_email
            .as_ref()
            .filter(|e| &e.id == id)
            .map(|e| e.is_read)
    }
}

/// Rows captured by an optimistic delete so a failed backend call can
/// restore them at their original positions
struct DeletedRows {
    rows: Vec<(Partition, usize, Email)>,
    current_email: Option<Email>,
}

/// The mail state store
///
/// Interior-mutable: all operations take `&self` so the store can be shared
/// behind an `Arc` between the UI and the assistant dispatcher.
pub struct MailStore {
    backend: Arc<dyn MailBackend>,
    state: Mutex<MailState>,
}

impl MailStore {
    /// Create a new store over the given backend
    pub fn new(backend: Arc<dyn MailBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(MailState::default()),
        }
    }

    // === Snapshot accessors ===

    pub fn current_view(&self) -> View {
        self.state.lock().unwrap().current_view
    }

    pub fn last_list_view(&self) -> View {
        self.state.lock().unwrap().last_list_view
    }

    pub fn inbox(&self) -> Vec<Email> {
        self.state.lock().unwrap().inbox.clone()
    }

    pub fn sent(&self) -> Vec<Email> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn search_results(&self) -> Vec<Email> {
        self.state.lock().unwrap().search_results.clone()
    }

    pub fn current_email(&self) -> Option<Email> {
        self.state.lock().unwrap().current_email.clone()
    }

    pub fn current_thread(&self) -> Option<Vec<Email>> {
        self.state.lock().unwrap().current_thread.clone()
    }

    pub fn compose_draft(&self) -> ComposeDraft {
        self.state.lock().unwrap().compose_draft.clone()
    }

    pub fn filters(&self) -> InboxFilters {
        self.state.lock().unwrap().filters.clone()
    }

    pub fn is_search_active(&self) -> bool {
        self.state.lock().unwrap().is_search_active
    }

    pub fn current_search_query(&self) -> String {
        self.state.lock().unwrap().current_search_query.clone()
    }

    pub fn search_results_count(&self) -> usize {
        self.state.lock().unwrap().search_results_count
    }

    pub fn total_emails(&self) -> usize {
        self.state.lock().unwrap().total_emails
    }

    pub fn total_sent(&self) -> usize {
        self.state.lock().unwrap().total_sent
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().unwrap().is_loading
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.lock().unwrap().last_error.clone()
    }

    pub fn current_page(&self) -> usize {
        self.state.lock().unwrap().current_page
    }

    pub fn next_page_token(&self) -> Option<String> {
        self.state.lock().unwrap().next_page_token.clone()
    }

    /// The listing the user is currently looking at: search results while a
    /// search is active, else the list for the current view
    pub fn visible_emails(&self) -> Vec<Email> {
        let state = self.state.lock().unwrap();
        if state.is_search_active {
            state.search_results.clone()
        } else if state.current_view == View::Sent {
            state.sent.clone()
        } else {
            state.inbox.clone()
        }
    }

    // === Pure state mutations ===

    /// Set the current view, tracking the last list view for back navigation
    pub fn set_current_view(&self, view: View) {
        let mut state = self.state.lock().unwrap();
        state.current_view = view;
        if view.is_list_view() {
            state.last_list_view = view;
        }
    }

    /// Merge a partial update into the compose draft
    pub fn merge_draft(&self, patch: DraftPatch) {
        self.state.lock().unwrap().compose_draft.merge(patch);
    }

    /// Reset the compose draft
    pub fn clear_draft(&self) {
        self.state.lock().unwrap().compose_draft.clear();
    }

    /// Merge a partial update into the inbox filters
    pub fn merge_filters(&self, patch: FilterPatch) {
        self.state.lock().unwrap().filters.merge(patch);
    }

    /// Reset the inbox filters
    pub fn clear_filters(&self) {
        self.state.lock().unwrap().filters.clear();
    }

    /// Prepend new emails arriving on the real-time channel
    ///
    /// Only ids not already present are added (dedup by id); the inbox total
    /// is bumped by the number actually inserted.
    pub fn prepend_new(&self, new_emails: Vec<Email>) {
        let mut state = self.state.lock().unwrap();
        let unique: Vec<Email> = new_emails
            .into_iter()
            .filter(|e| !state.inbox.iter().any(|existing| existing.id == e.id))
            .collect();
        if unique.is_empty() {
            return;
        }
        state.total_emails += unique.len();
        let inserted = unique.len();
        state.inbox.splice(0..0, unique);
        info!("Prepended {} new emails to inbox", inserted);
    }

    // === Fetching ===

    /// Fetch the first inbox page using the current filters
    ///
    /// Replaces the inbox wholesale and resets pagination.
    pub fn fetch_inbox(&self) -> Result<()> {
        let filters = {
            let mut state = self.state.lock().unwrap();
            state.is_loading = true;
            state.last_error = None;
            state.page_tokens.clear();
            state.current_page = 1;
            state.filters.clone()
        };
        self.fetch_inbox_page(&filters, None)
    }

    /// Fetch an inbox page with explicit filters and page token
    fn fetch_inbox_page(&self, filters: &InboxFilters, page_token: Option<&str>) -> Result<()> {
        let result = self.backend.fetch_inbox(filters, page_token);
        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok(page) => {
                // Always replace, never append
                state.inbox = page.emails;
                state.next_page_token = page.next_page_token;
                Ok(())
            }
            Err(e) => {
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Fetch the next inbox page, pushing the current token for back
    /// navigation. No-op when there is no next page.
    pub fn next_page(&self) -> Result<()> {
        let (filters, token) = {
            let mut state = self.state.lock().unwrap();
            let Some(token) = state.next_page_token.clone() else {
                return Ok(());
            };
            state.page_tokens.push(token.clone());
            state.current_page += 1;
            state.is_loading = true;
            state.last_error = None;
            (state.filters.clone(), token)
        };
        self.fetch_inbox_page(&filters, Some(&token))
    }

    /// Fetch the previous inbox page. No-op on page 1.
    pub fn prev_page(&self) -> Result<()> {
        let (filters, token) = {
            let mut state = self.state.lock().unwrap();
            if state.current_page <= 1 {
                return Ok(());
            }
            state.page_tokens.pop();
            state.current_page -= 1;
            // The token for page N is the one pushed when leaving page N-1;
            // page 1 has no token.
            let token = if state.current_page > 1 {
                state.page_tokens.get(state.current_page - 2).cloned()
            } else {
                None
            };
            state.is_loading = true;
            state.last_error = None;
            (state.filters.clone(), token)
        };
        self.fetch_inbox_page(&filters, token.as_deref())
    }

    /// Fetch the sent listing, replacing it wholesale
    pub fn fetch_sent(&self) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            state.is_loading = true;
            state.last_error = None;
        }
        let result = self.backend.fetch_sent();
        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok(page) => {
                state.sent = page.emails;
                Ok(())
            }
            Err(e) => {
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Fetch a single email with full body and make it the current selection
    ///
    /// Clears the current thread to avoid stale data.
    pub fn fetch_email(&self, id: &EmailId) -> Result<Email> {
        {
            let mut state = self.state.lock().unwrap();
            state.is_loading = true;
            state.last_error = None;
        }
        let result = self.backend.fetch_email(id);
        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok(email) => {
                state.current_email = Some(email.clone());
                state.current_thread = None;
                Ok(email)
            }
            Err(e) => {
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Fetch the thread containing an email
    ///
    /// The thread messages arrive in chronological order; the latest one
    /// becomes the current selection.
    pub fn fetch_thread(&self, id: &EmailId) -> Result<Vec<Email>> {
        {
            let mut state = self.state.lock().unwrap();
            state.is_loading = true;
            state.last_error = None;
        }
        let result = self.backend.fetch_thread(id);
        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok(messages) => {
                state.current_email = messages.last().cloned();
                state.current_thread = Some(messages.clone());
                Ok(messages)
            }
            Err(e) => {
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Fetch the email count for a label
    ///
    /// Skipped when a count is already cached, unless `force` is set.
    /// Count failures are logged, never surfaced.
    pub fn fetch_count(&self, label: &str, force: bool) {
        {
            let state = self.state.lock().unwrap();
            let cached = if label == "SENT" {
                state.total_sent
            } else {
                state.total_emails
            };
            if cached > 0 && !force {
                return;
            }
        }
        match self.backend.count(label) {
            Ok(count) => {
                let mut state = self.state.lock().unwrap();
                if label == "SENT" {
                    state.total_sent = count;
                } else {
                    state.total_emails = count;
                }
            }
            Err(e) => warn!("Failed to fetch email count for {}: {}", label, e),
        }
    }

    // === Search ===

    /// Run a server-side search
    ///
    /// While a search is active the inbox partition mirrors the search
    /// results, so list views render the result set without special-casing.
    pub fn search(&self, query: &str) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            state.is_loading = true;
            state.last_error = None;
            state.is_search_active = true;
            state.current_search_query = query.to_string();
        }
        let result = self.backend.search(query);
        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok(emails) => {
                state.search_results_count = emails.len();
                state.search_results = emails.clone();
                state.inbox = emails;
                Ok(())
            }
            Err(e) => {
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Leave search mode and restore the unfiltered inbox listing
    ///
    /// The inbox partition held the stale result set while search was
    /// active, so a re-fetch is required, not just a flag flip.
    pub fn exit_search(&self) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            state.is_search_active = false;
            state.current_search_query.clear();
            state.search_results_count = 0;
            state.search_results.clear();
        }
        self.fetch_inbox()
    }

    // === Mutations ===

    /// Send the current compose draft
    ///
    /// The draft is cleared only on success.
    pub fn send_email(&self) -> Result<EmailId> {
        let outgoing = {
            let mut state = self.state.lock().unwrap();
            state.is_loading = true;
            state.last_error = None;
            let draft = &state.compose_draft;
            OutgoingEmail {
                to: draft.to.clone(),
                cc: draft.cc.clone(),
                bcc: draft.bcc.clone(),
                subject: draft.subject.clone(),
                body: draft.body.clone(),
                reply_to_id: draft.reply_to_id.clone(),
            }
        };
        let result = self.backend.send(&outgoing);
        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok(id) => {
                state.compose_draft.clear();
                info!("Sent email {}", id.as_str());
                Ok(id)
            }
            Err(e) => {
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Set the read flag on an email, optimistically
    ///
    /// The flag is applied across all partitions and the current selection
    /// before the backend call; on failure the captured pre-call value is
    /// restored everywhere.
    pub fn set_read(&self, id: &EmailId, is_read: bool) -> Result<()> {
        let previous = {
            let mut state = self.state.lock().unwrap();
            let previous = state.read_flag(id);
            state.apply_read_flag(id, is_read);
            previous
        };

        match self.backend.set_read(id, is_read) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Failed to set read flag on {}: {}", id.as_str(), e);
                if let Some(previous) = previous {
                    self.state.lock().unwrap().apply_read_flag(id, previous);
                }
                Err(e)
            }
        }
    }

    /// Delete an email, optimistically
    ///
    /// The email is removed from every partition immediately; on failure the
    /// captured rows are restored at their original positions.
    pub fn delete(&self, id: &EmailId) -> Result<()> {
        let captured = {
            let mut state = self.state.lock().unwrap();
            let mut rows = Vec::new();
            for partition in ALL_PARTITIONS {
                let list = state.partition_mut(partition);
                if let Some(index) = list.iter().position(|e| &e.id == id) {
                    rows.push((partition, index, list.remove(index)));
                }
            }
            let current_email = state
                .current_email
                .take_if(|e| &e.id == id);
            DeletedRows {
                rows,
                current_email,
            }
        };

        match self.backend.delete(id) {
            Ok(()) => {
                info!("Deleted email {}", id.as_str());
                Ok(())
            }
            Err(e) => {
                warn!("Failed to delete email {}, restoring: {}", id.as_str(), e);
                let mut state = self.state.lock().unwrap();
                for (partition, index, email) in captured.rows {
                    let list = state.partition_mut(partition);
                    let index = index.min(list.len());
                    list.insert(index, email);
                }
                if captured.current_email.is_some() {
                    state.current_email = captured.current_email;
                }
                state.last_error = Some("Failed to delete email".to_string());
                Err(e)
            }
        }
    }
}
