//! HTTP client for the Vela mail REST API
//!
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use anyhow::{Context, Result};
use config::ApiConfig;
use serde::Deserialize;

use super::{EmailNotFoundError, MailBackend};
use crate::models::{Email, EmailId, InboxFilters, OutgoingEmail, Page};

/// Page size requested from list endpoints
const MAX_RESULTS: usize = 50;

/// Response from the count endpoint
#[derive(Deserialize)]
struct CountResponse {
    count: usize,
}

/// Response from the search endpoint
#[derive(Deserialize)]
struct SearchResponse {
    emails: Vec<Email>,
}

/// Response from the send endpoint
#[derive(Deserialize)]
struct SendResponse {
    id: EmailId,
}

/// Mail REST API client
pub struct HttpMailBackend {
    config: ApiConfig,
}

impl HttpMailBackend {
    /// Create a new mail client from API config
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.config.auth_token.as_deref().unwrap_or(""))
    }
}

impl MailBackend for HttpMailBackend {
    fn fetch_inbox(&self, filters: &InboxFilters, page_token: Option<&str>) -> Result<Page> {
        let mut url = format!("{}?max_results={}", self.url("/mail/inbox"), MAX_RESULTS);

        if let Some(token) = page_token {
            url.push_str(&format!("&page_token={}", urlencoding::encode(token)));
        }
        if let Some(from) = &filters.from_address {
            url.push_str(&format!("&from_address={}", urlencoding::encode(from)));
        }
        if let Some(after) = &filters.after_date {
            url.push_str(&format!("&after_date={}", after.to_rfc3339()));
        }
        if let Some(before) = &filters.before_date {
            url.push_str(&format!("&before_date={}", before.to_rfc3339()));
        }
        if let Some(is_unread) = filters.is_unread {
            url.push_str(&format!("&is_unread={}", is_unread));
        }
        if let Some(query) = &filters.query {
            url.push_str(&format!("&query={}", urlencoding::encode(query)));
        }

        let mut response = ureq::get(&url)
            .header("Authorization", &self.bearer())
            .call()
            .context("Failed to send inbox request")?;

        let page: Page = response
            .body_mut()
            .read_json()
            .context("Failed to parse inbox response")?;

        Ok(page)
    }

    fn fetch_sent(&self) -> Result<Page> {
        let url = format!("{}?max_results={}", self.url("/mail/sent"), MAX_RESULTS);

        let mut response = ureq::get(&url)
            .header("Authorization", &self.bearer())
            .call()
            .context("Failed to send sent-listing request")?;

        let page: Page = response
            .body_mut()
            .read_json()
            .context("Failed to parse sent-listing response")?;

        Ok(page)
    }

    fn fetch_email(&self, id: &EmailId) -> Result<Email> {
        let url = self.url(&format!("/mail/{}", id.as_str()));

        let response = ureq::get(&url)
            .header("Authorization", &self.bearer())
            .call();

        match response {
            Ok(mut resp) => {
                let email: Email = resp
                    .body_mut()
                    .read_json()
                    .context("Failed to parse email response")?;
                Ok(email)
            }
            Err(ureq::Error::StatusCode(404)) => Err(EmailNotFoundError.into()),
            Err(e) => Err(anyhow::anyhow!("Failed to fetch email: {}", e)),
        }
    }

    fn fetch_thread(&self, id: &EmailId) -> Result<Vec<Email>> {
        let url = self.url(&format!("/mail/thread/{}", id.as_str()));

        let mut response = ureq::get(&url)
            .header("Authorization", &self.bearer())
            .call()
            .context("Failed to send thread request")?;

        let messages: Vec<Email> = response
            .body_mut()
            .read_json()
            .context("Failed to parse thread response")?;

        Ok(messages)
    }

    fn count(&self, label: &str) -> Result<usize> {
        let url = format!("{}?label={}", self.url("/mail/count"), urlencoding::encode(label));

        let mut response = ureq::get(&url)
            .header("Authorization", &self.bearer())
            .call()
            .context("Failed to send count request")?;

        let count: CountResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse count response")?;

        Ok(count.count)
    }

    fn search(&self, query: &str) -> Result<Vec<Email>> {
        let url = format!("{}?q={}", self.url("/mail/search"), urlencoding::encode(query));

        let mut response = ureq::get(&url)
            .header("Authorization", &self.bearer())
            .call()
            .context("Failed to send search request")?;

        let results: SearchResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse search response")?;

        Ok(results.emails)
    }

    fn send(&self, email: &OutgoingEmail) -> Result<EmailId> {
        let url = self.url("/mail/send");

        let mut response = ureq::post(&url)
            .header("Authorization", &self.bearer())
            .send_json(email)
            .context("Failed to send email")?;

        let sent: SendResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse send response")?;

        Ok(sent.id)
    }

    fn set_read(&self, id: &EmailId, is_read: bool) -> Result<()> {
        let action = if is_read { "read" } else { "unread" };
        let url = self.url(&format!("/mail/{}/{}", id.as_str(), action));

        ureq::post(&url)
            .header("Authorization", &self.bearer())
            .send_empty()
            .with_context(|| format!("Failed to mark email as {}", action))?;

        Ok(())
    }

    fn delete(&self, id: &EmailId) -> Result<()> {
        let url = self.url(&format!("/mail/{}", id.as_str()));

        ureq::delete(&url)
            .header("Authorization", &self.bearer())
            .call()
            .context("Failed to delete email")?;

        Ok(())
    }
}
