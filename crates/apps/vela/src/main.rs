//! Vela - An assistant-driven mail client
//!
//! This is the main entry point for the Vela terminal shell.

use config::ApiConfig;
use log::{error, info};
use std::sync::Arc;

mod shell;

use assistant::{AssistantSession, HttpAssistantBackend};
use mail::{HttpMailBackend, MailStore};

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let api_config = ApiConfig::load();
    info!("Using backend at {}", api_config.base_url);

    let mail = Arc::new(MailStore::new(Arc::new(HttpMailBackend::new(
        api_config.clone(),
    ))));
    let session = AssistantSession::new(
        mail.clone(),
        Arc::new(HttpAssistantBackend::new(api_config)),
    );

    if let Err(e) = mail.fetch_inbox() {
        error!("Initial inbox fetch failed: {:#}", e);
    }
    if let Err(e) = session.load_conversations() {
        error!("Failed to load conversations: {:#}", e);
    }

    if let Err(e) = shell::run(&mail, &session) {
        error!("Shell exited with error: {:#}", e);
        std::process::exit(1);
    }
}
