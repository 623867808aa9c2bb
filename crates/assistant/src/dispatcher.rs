//! Tool dispatcher
//!
//! Routes decoded tool actions to mail-state mutations and transcript
//! appends. One exhaustive match covers every action; per-tool resolution
//! logic (query construction, date arithmetic, fuzzy email lookup) lives
//! here. Tool failures become user-visible `error`-typed messages, never
//! panics, and never abort the rest of a batch.

use chrono::{DateTime, Local, Utc};
use log::{info, warn};
use mail::{DraftPatch, Email, EmailId, FilterPatch, MailStore, View};
use std::sync::Arc;

use crate::gate::{ConfirmationGate, PendingAction};
use crate::persistence::PersistenceBridge;
use crate::tools::{OpenArgs, SearchArgs, ToolAction};
use crate::transcript::{ChatMessage, MessageKind, Transcript};

/// Confirmation prompt used when a compose draft is ready to send
const CONFIRM_COMPOSE: &str = "I've filled in the compose form. Please review it. \
    If everything looks good, click on Send Email, or Cancel to stop.";

/// Confirmation prompt used when a reply draft is ready to send
const CONFIRM_REPLY: &str = "Reply draft ready. Please review it. \
    If everything looks good, click on Send Email, or Cancel to stop.";

/// Executes tool actions against the mail store and the transcript
pub struct ToolDispatcher {
    mail: Arc<MailStore>,
    transcript: Arc<Transcript>,
    gate: Arc<ConfirmationGate>,
    bridge: Arc<PersistenceBridge>,
}

impl ToolDispatcher {
    /// Create a new dispatcher
    pub fn new(
        mail: Arc<MailStore>,
        transcript: Arc<Transcript>,
        gate: Arc<ConfirmationGate>,
        bridge: Arc<PersistenceBridge>,
    ) -> Self {
        Self {
            mail,
            transcript,
            gate,
            bridge,
        }
    }

    /// Append a typed assistant status message and replicate it
    fn say(&self, content: &str, kind: MessageKind) {
        let message = ChatMessage::assistant(content).with_kind(kind);
        self.transcript.append(message.clone());
        self.bridge.persist(&message);
    }

    /// Execute one tool action
    ///
    /// Actions in a batch are executed sequentially and awaited one at a
    /// time by the caller; later tools may depend on state mutated here.
    pub fn execute(&self, action: ToolAction) {
        info!("Executing tool: {:?}", action);
        match action {
            ToolAction::ComposeEmail(args) => {
                self.mail.set_current_view(View::Compose);
                self.mail.merge_draft(DraftPatch {
                    to: Some(args.to),
                    cc: Some(args.cc),
                    bcc: Some(args.bcc),
                    subject: Some(args.subject),
                    body: Some(args.body),
                    reply_to_id: None,
                });
                self.gate.arm(PendingAction::SendEmail);
                self.say(CONFIRM_COMPOSE, MessageKind::Confirmation);
            }

            ToolAction::SendEmail => {
                // Draft is already populated; just ask for sign-off
                self.gate.arm(PendingAction::SendEmail);
                self.say(CONFIRM_COMPOSE, MessageKind::Confirmation);
            }

            ToolAction::SearchEmails(args) => {
                let query = build_search_query(&args);
                if query.is_empty() {
                    self.say(
                        "I didn't understand the search criteria. Could you try asking in a different way?",
                        MessageKind::Error,
                    );
                    return;
                }
                match self.mail.search(&query) {
                    Ok(()) => {
                        // Search results render in the inbox view
                        self.mail.set_current_view(View::Inbox);
                        // Count from post-search state, not a stale snapshot
                        let count = self.mail.inbox().len();
                        self.say(
                            &format!("I've found {} emails matching your criteria.", count),
                            MessageKind::Info,
                        );
                    }
                    Err(e) => {
                        warn!("Search failed for query {:?}: {}", query, e);
                        self.say(
                            "Something went wrong while searching your emails.",
                            MessageKind::Error,
                        );
                    }
                }
            }

            ToolAction::FilterEmails(args) => {
                let after_date = args.days_ago.and_then(local_start_of_day);
                self.mail.merge_filters(FilterPatch {
                    from_address: args.from_address,
                    after_date,
                    before_date: None,
                    is_unread: args.is_unread,
                    query: None,
                });
                match self.mail.fetch_inbox() {
                    Ok(()) => {
                        self.mail.set_current_view(View::Inbox);
                        self.say(
                            &format!(
                                "Filtered inbox: showing {} emails.",
                                self.mail.inbox().len()
                            ),
                            MessageKind::Filter,
                        );
                    }
                    Err(e) => {
                        warn!("Filtered inbox fetch failed: {}", e);
                        self.say(
                            "Something went wrong while filtering your inbox.",
                            MessageKind::Error,
                        );
                    }
                }
            }

            ToolAction::OpenEmail(args) => {
                let target = self.resolve_open_target(&args);
                let opened = match target {
                    Some(id) => match self.mail.fetch_email(&id) {
                        Ok(_) => {
                            self.mail.set_current_view(View::Email);
                            true
                        }
                        Err(e) => {
                            warn!("Failed to open email {}: {}", id.as_str(), e);
                            false
                        }
                    },
                    None => false,
                };
                if opened {
                    self.say("Opening the email for you.", MessageKind::Info);
                } else {
                    self.say(
                        "I couldn't find that email in your current view.",
                        MessageKind::Error,
                    );
                }
            }

            ToolAction::Navigate(args) => {
                let Some(view) = args.view.as_deref().and_then(View::parse) else {
                    warn!("Navigate to unknown view: {:?}", args.view);
                    self.say("I don't know that view.", MessageKind::Error);
                    return;
                };
                self.mail.set_current_view(view);
                // Refetch list views so they never render stale data
                let refreshed = match view {
                    View::Inbox => self.mail.fetch_inbox(),
                    View::Sent => self.mail.fetch_sent(),
                    _ => Ok(()),
                };
                if let Err(e) = refreshed {
                    warn!("Refetch after navigate to {} failed: {}", view.as_str(), e);
                }
                self.say(
                    &format!("Navigated to {}.", view.as_str()),
                    MessageKind::Success,
                );
            }

            ToolAction::ReplyToEmail(args) => {
                let email = match self.mail.current_email() {
                    Some(email) => Some(email),
                    None => args.email_id.as_deref().and_then(|id| {
                        self.mail
                            .fetch_email(&EmailId::new(id))
                            .map_err(|e| warn!("Failed to fetch reply target {}: {}", id, e))
                            .ok()
                    }),
                };
                let Some(email) = email else {
                    self.say(
                        "I couldn't find the email to reply to.",
                        MessageKind::Error,
                    );
                    return;
                };

                self.mail.set_current_view(View::Compose);
                let body = args.body.unwrap_or_else(|| quoted_reply_body(&email));
                self.mail.merge_draft(DraftPatch {
                    to: Some(vec![email.from_address.email.clone()]),
                    subject: Some(format!("Re: {}", email.subject)),
                    body: Some(body),
                    reply_to_id: Some(email.id.clone()),
                    ..Default::default()
                });
                self.gate.arm(PendingAction::SendEmail);
                self.say(CONFIRM_REPLY, MessageKind::Confirmation);
            }

            ToolAction::DeleteEmail(args) => {
                let Some(id) = args.email_id else {
                    warn!("delete_email called without email_id");
                    return;
                };
                match self.mail.delete(&EmailId::new(id)) {
                    Ok(()) => self.say("Deleted the email.", MessageKind::Action),
                    Err(_) => self.say(
                        "I couldn't delete that email, so I've restored it.",
                        MessageKind::Error,
                    ),
                }
            }

            ToolAction::MarkAsRead(args) => {
                let Some(id) = args.email_id else {
                    warn!("mark_as_read called without email_id");
                    return;
                };
                let label = if args.is_read { "read" } else { "unread" };
                match self.mail.set_read(&EmailId::new(id), args.is_read) {
                    Ok(()) => self.say(
                        &format!("Marked email as {}.", label),
                        MessageKind::Action,
                    ),
                    Err(_) => self.say(
                        &format!("I couldn't mark that email as {}.", label),
                        MessageKind::Error,
                    ),
                }
            }

            ToolAction::RefreshInbox => match self.mail.fetch_inbox() {
                Ok(()) => self.say("Inbox refreshed.", MessageKind::Action),
                Err(e) => {
                    warn!("Inbox refresh failed: {}", e);
                    self.say("I couldn't refresh your inbox.", MessageKind::Error);
                }
            },
        }
    }

    /// Resolve the target of an `open_email` call
    ///
    /// Resolution order: explicit id, then 1-based list position against the
    /// visible inbox, then case-insensitive substring match on sender and/or
    /// subject. With `is_latest`, candidates are re-sorted newest-first
    /// before the first-match tie-break.
    fn resolve_open_target(&self, args: &OpenArgs) -> Option<EmailId> {
        if let Some(id) = &args.email_id {
            return Some(EmailId::new(id.clone()));
        }

        let emails = self.mail.inbox();

        if let Some(position) = args.list_position {
            // 1-based position into the visible list
            return position
                .checked_sub(1)
                .and_then(|index| emails.get(index))
                .map(|email| email.id.clone());
        }

        let mut candidates: Vec<&Email> = emails.iter().collect();

        if let Some(sender) = &args.sender {
            let sender = sender.to_lowercase();
            candidates.retain(|e| {
                e.from_address.email.to_lowercase().contains(&sender)
                    || e.from_address
                        .name
                        .as_deref()
                        .unwrap_or("")
                        .to_lowercase()
                        .contains(&sender)
            });
        }

        if let Some(subject) = &args.subject {
            let subject = subject.to_lowercase();
            candidates.retain(|e| e.subject.to_lowercase().contains(&subject));
        }

        // Without any criteria there is nothing to match against
        if args.sender.is_none() && args.subject.is_none() {
            return None;
        }

        if args.is_latest.unwrap_or(false) {
            candidates.sort_by_key(|e| std::cmp::Reverse(e.date));
        }

        candidates.first().map(|email| email.id.clone())
    }
}

/// Build the search query string from structured arguments
///
/// Symbolic date ranges are resolved to an absolute `after:` token here,
/// once, at dispatch time.
fn build_search_query(args: &SearchArgs) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(sender) = args.sender.as_deref().filter(|s| !s.is_empty()) {
        parts.push(format!("from:{}", sender));
    }
    if let Some(keywords) = args.subject_keywords.as_deref().filter(|s| !s.is_empty()) {
        parts.push(format!("subject:({})", keywords));
    }
    if let Some(keywords) = args.body_keywords.as_deref().filter(|s| !s.is_empty()) {
        parts.push(keywords.to_string());
    }
    if args.has_attachment.unwrap_or(false) {
        parts.push("has:attachment".to_string());
    }
    if let Some(range) = args.date_range.as_deref() {
        let days_back = match range {
            "today" => Some(0),
            "yesterday" => Some(1),
            _ => None,
        };
        if let Some(token) = days_back.and_then(local_date_token) {
            parts.push(format!("after:{}", token));
        }
    }
    if let Some(query) = args.query.as_deref().filter(|s| !s.is_empty()) {
        parts.push(query.to_string());
    }

    parts.join(" ").trim().to_string()
}

/// Local start of day, `days_back` calendar days before today
///
/// Calendar-date arithmetic, not wall-clock hours: "7 days ago" at 23:50
/// still means midnight seven calendar dates back.
fn local_start_of_day(days_back: u32) -> Option<DateTime<Utc>> {
    let date = Local::now()
        .date_naive()
        .checked_sub_days(chrono::Days::new(days_back as u64))?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    midnight
        .and_local_timezone(Local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Local calendar date `days_back` days ago as a `YYYY/MM/DD` query token
fn local_date_token(days_back: u32) -> Option<String> {
    let date = Local::now()
        .date_naive()
        .checked_sub_days(chrono::Days::new(days_back as u64))?;
    Some(date.format("%Y/%m/%d").to_string())
}

/// Default reply body quoting the original message
fn quoted_reply_body(email: &Email) -> String {
    format!(
        "\n\n---\nOn {}, {} wrote:\n{}",
        email.date.to_rfc2822(),
        email.from_address.email,
        email.body_or_snippet()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{DeleteArgs, FilterArgs, MarkReadArgs, NavigateArgs, ReplyArgs};
    use anyhow::Result;
    use chrono::Duration;
    use mail::{EmailAddress, InboxFilters, MailBackend, OutgoingEmail, Page};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mail backend double that records calls
    struct FakeMail {
        inbox: Vec<Email>,
        search_calls: AtomicUsize,
        last_filters: Mutex<Option<InboxFilters>>,
        fail_mutations: bool,
    }

    impl FakeMail {
        fn new(inbox: Vec<Email>) -> Self {
            Self {
                inbox,
                search_calls: AtomicUsize::new(0),
                last_filters: Mutex::new(None),
                fail_mutations: false,
            }
        }
    }

    impl MailBackend for FakeMail {
        fn fetch_inbox(&self, filters: &InboxFilters, _page_token: Option<&str>) -> Result<Page> {
            *self.last_filters.lock().unwrap() = Some(filters.clone());
            Ok(Page {
                emails: self.inbox.clone(),
                next_page_token: None,
                total: 0,
            })
        }
        fn fetch_sent(&self) -> Result<Page> {
            Ok(Page::default())
        }
        fn fetch_email(&self, id: &EmailId) -> Result<Email> {
            self.inbox
                .iter()
                .find(|e| &e.id == id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("not found"))
        }
        fn fetch_thread(&self, _id: &EmailId) -> Result<Vec<Email>> {
            Ok(Vec::new())
        }
        fn count(&self, _label: &str) -> Result<usize> {
            Ok(self.inbox.len())
        }
        fn search(&self, query: &str) -> Result<Vec<Email>> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            let query = query.to_lowercase();
            Ok(self
                .inbox
                .iter()
                .filter(|e| e.subject.to_lowercase().contains(query.trim_start_matches("subject:(").trim_end_matches(')')))
                .cloned()
                .collect())
        }
        fn send(&self, _email: &OutgoingEmail) -> Result<EmailId> {
            Ok(EmailId::new("sent"))
        }
        fn set_read(&self, _id: &EmailId, _is_read: bool) -> Result<()> {
            if self.fail_mutations {
                anyhow::bail!("backend unavailable");
            }
            Ok(())
        }
        fn delete(&self, _id: &EmailId) -> Result<()> {
            if self.fail_mutations {
                anyhow::bail!("backend unavailable");
            }
            Ok(())
        }
    }

    /// Assistant backend double that discards persisted messages
    struct NullAssistant;

    impl crate::api::AssistantBackend for NullAssistant {
        fn chat_stream(&self, _request: &crate::api::ChatRequest) -> Result<Box<dyn std::io::Read>> {
            Ok(Box::new(std::io::Cursor::new(Vec::new())))
        }
        fn list_conversations(&self) -> Result<Vec<crate::api::ConversationSummary>> {
            Ok(Vec::new())
        }
        fn get_conversation(&self, _id: &str) -> Result<crate::api::Conversation> {
            anyhow::bail!("not found")
        }
        fn add_message(&self, _id: &str, _message: &ChatMessage) -> Result<()> {
            Ok(())
        }
        fn delete_conversation(&self, _id: &str) -> Result<()> {
            Ok(())
        }
    }

    struct Fixture {
        mail: Arc<MailStore>,
        transcript: Arc<Transcript>,
        gate: Arc<ConfirmationGate>,
        dispatcher: ToolDispatcher,
        backend: Arc<FakeMail>,
    }

    fn fixture(inbox: Vec<Email>) -> Fixture {
        let backend = Arc::new(FakeMail::new(inbox));
        let mail = Arc::new(MailStore::new(backend.clone()));
        mail.fetch_inbox().unwrap();
        let transcript = Arc::new(Transcript::new());
        let gate = Arc::new(ConfirmationGate::new());
        let bridge = Arc::new(PersistenceBridge::new(Arc::new(NullAssistant)));
        let dispatcher = ToolDispatcher::new(
            mail.clone(),
            transcript.clone(),
            gate.clone(),
            bridge,
        );
        Fixture {
            mail,
            transcript,
            gate,
            dispatcher,
            backend,
        }
    }

    fn make_email(id: &str, from: &str, subject: &str, age_hours: i64) -> Email {
        Email::builder(EmailId::new(id))
            .from(EmailAddress::with_name("Test User", from))
            .subject(subject)
            .snippet(format!("Snippet for {}", id))
            .date(Utc::now() - Duration::hours(age_hours))
            .build()
    }

    fn three_emails() -> Vec<Email> {
        vec![
            make_email("m1", "alice@example.com", "Project kickoff", 1),
            make_email("m2", "bob@example.com", "Lunch plans", 2),
            make_email("m3", "carol@example.com", "Project retro", 3),
        ]
    }

    #[test]
    fn test_compose_arms_gate_and_fills_draft() {
        let f = fixture(Vec::new());
        f.dispatcher.execute(ToolAction::ComposeEmail(crate::tools::ComposeArgs {
            to: vec!["dave@example.com".to_string()],
            subject: "Status".to_string(),
            body: "All green.".to_string(),
            ..Default::default()
        }));

        assert_eq!(f.mail.current_view(), View::Compose);
        assert_eq!(f.mail.compose_draft().to, vec!["dave@example.com"]);
        assert_eq!(f.gate.pending(), Some(PendingAction::SendEmail));

        let messages = f.transcript.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, Some(MessageKind::Confirmation));
    }

    #[test]
    fn test_search_with_no_criteria_never_searches() {
        let f = fixture(three_emails());
        f.dispatcher
            .execute(ToolAction::SearchEmails(SearchArgs::default()));

        assert_eq!(f.backend.search_calls.load(Ordering::SeqCst), 0);
        let messages = f.transcript.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, Some(MessageKind::Error));
    }

    #[test]
    fn test_search_reports_post_search_count() {
        let f = fixture(three_emails());
        f.dispatcher.execute(ToolAction::SearchEmails(SearchArgs {
            subject_keywords: Some("project".to_string()),
            ..Default::default()
        }));

        assert_eq!(f.backend.search_calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.mail.current_view(), View::Inbox);
        let messages = f.transcript.messages();
        assert_eq!(messages[0].kind, Some(MessageKind::Info));
        assert!(messages[0].content.contains("2 emails"));
    }

    #[test]
    fn test_open_email_by_list_position() {
        let f = fixture(three_emails());
        f.dispatcher.execute(ToolAction::OpenEmail(OpenArgs {
            list_position: Some(2),
            ..Default::default()
        }));

        assert_eq!(f.mail.current_view(), View::Email);
        assert_eq!(f.mail.current_email().unwrap().id.as_str(), "m2");
        assert_eq!(
            f.transcript.messages()[0].kind,
            Some(MessageKind::Info)
        );
    }

    #[test]
    fn test_open_email_position_out_of_range() {
        let f = fixture(three_emails());
        f.dispatcher.execute(ToolAction::OpenEmail(OpenArgs {
            list_position: Some(5),
            ..Default::default()
        }));

        assert!(f.mail.current_email().is_none());
        let messages = f.transcript.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, Some(MessageKind::Error));
    }

    #[test]
    fn test_open_email_by_sender_substring() {
        let f = fixture(three_emails());
        f.dispatcher.execute(ToolAction::OpenEmail(OpenArgs {
            sender: Some("BOB".to_string()),
            ..Default::default()
        }));

        assert_eq!(f.mail.current_email().unwrap().id.as_str(), "m2");
    }

    #[test]
    fn test_open_email_is_latest_resorts_candidates() {
        // m3 is the older "Project" email and sits later in the list; a
        // plain first-match would pick m1, and so does is_latest since m1
        // is newer. Flip the list order to prove the sort happens.
        let emails = vec![
            make_email("m3", "carol@example.com", "Project retro", 3),
            make_email("m1", "alice@example.com", "Project kickoff", 1),
        ];
        let f = fixture(emails);
        f.dispatcher.execute(ToolAction::OpenEmail(OpenArgs {
            subject: Some("project".to_string()),
            is_latest: Some(true),
            ..Default::default()
        }));

        assert_eq!(f.mail.current_email().unwrap().id.as_str(), "m1");
    }

    #[test]
    fn test_open_email_without_criteria_fails() {
        let f = fixture(three_emails());
        f.dispatcher
            .execute(ToolAction::OpenEmail(OpenArgs::default()));
        assert_eq!(
            f.transcript.messages()[0].kind,
            Some(MessageKind::Error)
        );
    }

    #[test]
    fn test_filter_days_ago_is_calendar_start_of_day() {
        let f = fixture(three_emails());
        f.dispatcher.execute(ToolAction::FilterEmails(FilterArgs {
            days_ago: Some(7),
            is_unread: Some(true),
            ..Default::default()
        }));

        let filters = f.backend.last_filters.lock().unwrap().clone().unwrap();
        let after = filters.after_date.unwrap().with_timezone(&Local);
        let expected_date =
            Local::now().date_naive() - chrono::Days::new(7);
        assert_eq!(after.date_naive(), expected_date);
        assert_eq!(after.time(), chrono::NaiveTime::MIN);
        assert_eq!(filters.is_unread, Some(true));

        let messages = f.transcript.messages();
        assert_eq!(messages[0].kind, Some(MessageKind::Filter));
    }

    #[test]
    fn test_navigate_refetches_list_view() {
        let f = fixture(three_emails());
        f.mail.set_current_view(View::Compose);
        f.dispatcher.execute(ToolAction::Navigate(NavigateArgs {
            view: Some("inbox".to_string()),
        }));

        assert_eq!(f.mail.current_view(), View::Inbox);
        let messages = f.transcript.messages();
        assert_eq!(messages[0].kind, Some(MessageKind::Success));
        assert!(messages[0].content.contains("inbox"));
    }

    #[test]
    fn test_navigate_unknown_view_reports_error() {
        let f = fixture(Vec::new());
        f.dispatcher.execute(ToolAction::Navigate(NavigateArgs {
            view: Some("settings".to_string()),
        }));
        assert_eq!(
            f.transcript.messages()[0].kind,
            Some(MessageKind::Error)
        );
    }

    #[test]
    fn test_reply_uses_open_email_and_quotes_body() {
        let f = fixture(three_emails());
        f.mail.fetch_email(&EmailId::new("m1")).unwrap();

        f.dispatcher
            .execute(ToolAction::ReplyToEmail(ReplyArgs::default()));

        let draft = f.mail.compose_draft();
        assert_eq!(draft.to, vec!["alice@example.com"]);
        assert_eq!(draft.subject, "Re: Project kickoff");
        assert!(draft.body.contains("alice@example.com wrote:"));
        assert_eq!(draft.reply_to_id.as_ref().unwrap().as_str(), "m1");
        assert_eq!(f.gate.pending(), Some(PendingAction::SendEmail));
    }

    #[test]
    fn test_reply_body_override() {
        let f = fixture(three_emails());
        f.mail.fetch_email(&EmailId::new("m1")).unwrap();

        f.dispatcher.execute(ToolAction::ReplyToEmail(ReplyArgs {
            body: Some("Thanks, looks good.".to_string()),
            ..Default::default()
        }));

        assert_eq!(f.mail.compose_draft().body, "Thanks, looks good.");
    }

    #[test]
    fn test_reply_without_target_reports_error() {
        let f = fixture(Vec::new());
        f.dispatcher
            .execute(ToolAction::ReplyToEmail(ReplyArgs::default()));
        assert_eq!(
            f.transcript.messages()[0].kind,
            Some(MessageKind::Error)
        );
        assert!(f.gate.pending().is_none());
    }

    #[test]
    fn test_delete_and_mark_emit_action_messages() {
        let f = fixture(three_emails());
        f.dispatcher.execute(ToolAction::DeleteEmail(DeleteArgs {
            email_id: Some("m1".to_string()),
        }));
        f.dispatcher.execute(ToolAction::MarkAsRead(MarkReadArgs {
            email_id: Some("m2".to_string()),
            is_read: true,
        }));

        let messages = f.transcript.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].kind, Some(MessageKind::Action));
        assert_eq!(messages[0].content, "Deleted the email.");
        assert_eq!(messages[1].kind, Some(MessageKind::Action));
        assert!(messages[1].content.contains("read"));
        assert_eq!(f.mail.inbox().len(), 2);
    }

    #[test]
    fn test_delete_without_id_is_silent_noop() {
        let f = fixture(three_emails());
        f.dispatcher
            .execute(ToolAction::DeleteEmail(DeleteArgs::default()));
        assert!(f.transcript.is_empty());
        assert_eq!(f.mail.inbox().len(), 3);
    }

    #[test]
    fn test_refresh_inbox() {
        let f = fixture(three_emails());
        f.dispatcher.execute(ToolAction::RefreshInbox);
        let messages = f.transcript.messages();
        assert_eq!(messages[0].content, "Inbox refreshed.");
        assert_eq!(messages[0].kind, Some(MessageKind::Action));
    }

    #[test]
    fn test_build_search_query_tokens() {
        let query = build_search_query(&SearchArgs {
            sender: Some("alice@example.com".to_string()),
            subject_keywords: Some("quarterly report".to_string()),
            body_keywords: Some("budget".to_string()),
            has_attachment: Some(true),
            ..Default::default()
        });
        assert_eq!(
            query,
            "from:alice@example.com subject:(quarterly report) budget has:attachment"
        );
    }

    #[test]
    fn test_build_search_query_resolves_yesterday() {
        let query = build_search_query(&SearchArgs {
            date_range: Some("yesterday".to_string()),
            ..Default::default()
        });
        let expected = (Local::now().date_naive() - chrono::Days::new(1))
            .format("%Y/%m/%d")
            .to_string();
        assert_eq!(query, format!("after:{}", expected));
    }

    #[test]
    fn test_build_search_query_unknown_range_ignored() {
        let query = build_search_query(&SearchArgs {
            date_range: Some("last_century".to_string()),
            query: Some("raw fallback".to_string()),
            ..Default::default()
        });
        assert_eq!(query, "raw fallback");
    }
}
