//! Interactive shell
//!
//! A line-based loop over stdin. Plain input goes to the assistant;
//! slash commands drive the mailbox and conversation management directly.
//! After each action, transcript messages appended since the last prompt
//! are printed, so streamed replies and tool status lines show up in order.

use anyhow::Result;
use assistant::{AssistantSession, ChatMessage, MessageKind, Role};
use chrono::Local;
use mail::{MailStore, View};
use std::io::{BufRead, Write};
use std::sync::Arc;

const HELP: &str = "\
Commands:
  /inbox            refresh and list the inbox
  /sent             list sent mail
  /open <n>         open email at list position n
  /next, /prev      page through the inbox
  /search <query>   search mail
  /exit-search      leave search results
  /confirm          confirm the pending action
  /cancel           cancel the pending action
  /new              start a new conversation
  /conversations    list stored conversations
  /load <id>        load a stored conversation
  /delete-conv <id> delete a stored conversation
  /help             show this help
  /quit             exit
Anything else is sent to the assistant.";

pub fn run(mail: &Arc<MailStore>, session: &AssistantSession) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut printed = session.transcript().len();

    println!("Vela. Type /help for commands.");
    list_emails(mail);

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_command(line) {
            Command::Quit => break,
            Command::Help => println!("{}", HELP),
            Command::Inbox => {
                report(mail.fetch_inbox());
                mail.set_current_view(View::Inbox);
                list_emails(mail);
            }
            Command::Sent => {
                report(mail.fetch_sent());
                mail.set_current_view(View::Sent);
                list_emails(mail);
            }
            Command::Open(position) => open_at(mail, position),
            Command::NextPage => {
                report(mail.next_page());
                list_emails(mail);
            }
            Command::PrevPage => {
                report(mail.prev_page());
                list_emails(mail);
            }
            Command::Search(query) => {
                report(mail.search(&query));
                list_emails(mail);
            }
            Command::ExitSearch => {
                report(mail.exit_search());
                list_emails(mail);
            }
            Command::Confirm => session.confirm_action(),
            Command::Cancel => session.cancel_action(),
            Command::NewConversation => {
                session.start_new_conversation();
                printed = 0;
                println!("Started a new conversation.");
            }
            Command::Conversations => list_conversations(session),
            Command::LoadConversation(id) => match session.load_conversation(&id) {
                Ok(()) => {
                    printed = 0;
                    println!("Loaded conversation {}.", id);
                }
                Err(e) => println!("Could not load conversation: {:#}", e),
            },
            Command::DeleteConversation(id) => match session.delete_conversation(&id) {
                Ok(()) => println!("Deleted conversation {}.", id),
                Err(e) => println!("Could not delete conversation: {:#}", e),
            },
            Command::Chat(text) => session.send_message(&text),
        }

        printed = print_new_messages(session, printed);
    }

    Ok(())
}

enum Command {
    Chat(String),
    Inbox,
    Sent,
    Open(usize),
    NextPage,
    PrevPage,
    Search(String),
    ExitSearch,
    Confirm,
    Cancel,
    NewConversation,
    Conversations,
    LoadConversation(String),
    DeleteConversation(String),
    Help,
    Quit,
}

fn parse_command(line: &str) -> Command {
    if !line.starts_with('/') {
        return Command::Chat(line.to_string());
    }
    let (name, rest) = match line.split_once(' ') {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };
    match name {
        "/inbox" => Command::Inbox,
        "/sent" => Command::Sent,
        "/open" => rest
            .parse()
            .map(Command::Open)
            .unwrap_or(Command::Help),
        "/next" => Command::NextPage,
        "/prev" => Command::PrevPage,
        "/search" if !rest.is_empty() => Command::Search(rest.to_string()),
        "/exit-search" => Command::ExitSearch,
        "/confirm" => Command::Confirm,
        "/cancel" => Command::Cancel,
        "/new" => Command::NewConversation,
        "/conversations" => Command::Conversations,
        "/load" if !rest.is_empty() => Command::LoadConversation(rest.to_string()),
        "/delete-conv" if !rest.is_empty() => Command::DeleteConversation(rest.to_string()),
        "/quit" | "/exit" => Command::Quit,
        _ => Command::Help,
    }
}

fn report(result: Result<()>) {
    if let Err(e) = result {
        println!("Error: {:#}", e);
    }
}

fn open_at(mail: &Arc<MailStore>, position: usize) {
    let emails = mail.visible_emails();
    let Some(email) = position.checked_sub(1).and_then(|i| emails.get(i)) else {
        println!("No email at position {}.", position);
        return;
    };
    match mail.fetch_email(&email.id) {
        Ok(email) => {
            mail.set_current_view(View::Email);
            println!("From: {}", email.from_address.display());
            println!("Subject: {}", email.subject);
            println!(
                "Date: {}",
                email.date.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            );
            println!();
            println!("{}", email.body_or_snippet());
        }
        Err(e) => println!("Could not open email: {:#}", e),
    }
}

fn list_emails(mail: &Arc<MailStore>) {
    let emails = mail.visible_emails();
    if emails.is_empty() {
        println!("(no emails)");
        return;
    }
    if mail.is_search_active() {
        println!(
            "Search results for {:?} ({} found):",
            mail.current_search_query(),
            mail.search_results_count()
        );
    }
    for (i, email) in emails.iter().enumerate() {
        let marker = if email.is_read { ' ' } else { '*' };
        println!(
            "{:>3}. {}{} | {} | {}",
            i + 1,
            marker,
            email.date.with_timezone(&Local).format("%m-%d %H:%M"),
            email.from_address.display(),
            email.subject
        );
    }
}

fn list_conversations(session: &AssistantSession) {
    if let Err(e) = session.load_conversations() {
        println!("Could not load conversations: {:#}", e);
        return;
    }
    let conversations = session.conversations();
    if conversations.is_empty() {
        println!("(no stored conversations)");
        return;
    }
    for summary in conversations {
        let when = summary
            .last_message_at
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!("{} | {} | {}", summary.id, when, summary.title);
    }
}

/// Print transcript messages appended since the last prompt
fn print_new_messages(session: &AssistantSession, printed: usize) -> usize {
    let messages = session.transcript().messages();
    for message in messages.iter().skip(printed) {
        print_message(message);
    }
    messages.len()
}

fn print_message(message: &ChatMessage) {
    let prefix = match message.role {
        Role::User => "you",
        Role::Assistant => "vela",
    };
    match message.kind {
        Some(MessageKind::Error) => println!("[{}] (error) {}", prefix, message.content),
        Some(MessageKind::Confirmation) => {
            println!("[{}] {}", prefix, message.content);
            println!("      (/confirm to proceed, /cancel to stop)");
        }
        _ => println!("[{}] {}", prefix, message.content),
    }
}
