//! `SendGrid` v3 client for run notifications.

use std::fmt::Write as _;
use std::time::Duration;

use pricewatch_core::EmailConfig;
use pricewatch_pipeline::RunSummary;
use reqwest::{Client, Url};
use serde::Serialize;

use crate::error::PublishError;
use crate::retry::retry_with_backoff;

pub const SUCCESS_SUBJECT: &str = "Scraping Completed Successfully";
pub const FAILURE_SUBJECT: &str = "Scraper Failed";

/// A plain-text notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
}

/// Notification sent after a successful run.
#[must_use]
pub fn success_message(summary: &RunSummary, sheet_url: Option<&str>) -> EmailMessage {
    let mut body = format!(
        "Scraping completed successfully.\n\nTotal products scraped: {}\nTotal products kept: {}\n",
        summary.total_raw(),
        summary.total_cleaned()
    );
    for s in &summary.sources {
        let _ = writeln!(
            body,
            "  {}: {} of {} raw listings kept",
            s.source, s.cleaned, s.raw
        );
    }
    let _ = writeln!(
        body,
        "\nDropped: {} malformed records, {} unparseable prices",
        summary.dropped.malformed_records, summary.dropped.unparseable_prices
    );
    if let Some(url) = sheet_url {
        let _ = writeln!(body, "\nView the data: {url}");
    }
    EmailMessage {
        subject: SUCCESS_SUBJECT.to_string(),
        body,
    }
}

/// Notification sent when a run aborts.
#[must_use]
pub fn failure_message(error: &str) -> EmailMessage {
    EmailMessage {
        subject: FAILURE_SUBJECT.to_string(),
        body: format!("Error: {error}"),
    }
}

#[derive(Debug, Serialize)]
struct MailSend<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
}

pub struct EmailClient {
    client: Client,
    send_url: Url,
    api_key: String,
    from_email: String,
    to_email: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl EmailClient {
    /// # Errors
    ///
    /// Returns [`PublishError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`PublishError::InvalidBaseUrl`] if the API base does not parse.
    pub fn new(
        config: &EmailConfig,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let send_url = Url::parse(&format!("{}/", config.api_base.trim_end_matches('/')))
            .and_then(|base| base.join("v3/mail/send"))
            .map_err(|e| PublishError::InvalidBaseUrl {
                base: config.api_base.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            send_url,
            api_key: config.api_key.clone(),
            from_email: config.from_email.clone(),
            to_email: config.to_email.clone(),
            max_retries,
            backoff_base_ms,
        })
    }

    /// Sends `message` to the configured recipient.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::UnexpectedStatus`] if `SendGrid` answers with a
    /// non-2xx status after retrying, or [`PublishError::Http`] on network
    /// failure.
    pub async fn send(&self, message: &EmailMessage) -> Result<(), PublishError> {
        let payload = MailSend {
            personalizations: [Personalization {
                to: [Address {
                    email: &self.to_email,
                }],
            }],
            from: Address {
                email: &self.from_email,
            },
            subject: &message.subject,
            content: [Content {
                kind: "text/plain",
                value: &message.body,
            }],
        };

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let request = self
                .client
                .post(self.send_url.clone())
                .bearer_auth(&self.api_key)
                .json(&payload);
            async move {
                let response = request.send().await?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(PublishError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: self.send_url.to_string(),
                        body,
                    });
                }
                Ok(())
            }
        })
        .await?;

        tracing::info!(to = %self.to_email, subject = %message.subject, "notification sent");
        Ok(())
    }
}
