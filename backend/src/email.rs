//! Outbound mail
//!
//! `HttpMailer` posts messages to a transactional mail HTTP API.
//! `LogMailer` writes them to the log, for development without a provider.

use crate::config::EmailConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// A rendered message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Build the password-reset message for `reset_url`
pub fn password_reset_email(to: &str, reset_url: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "Password Reset Request".to_string(),
        html_body: format!(
            "<p>You requested a password reset. Click the link below to reset your password:</p>\
             <p><a href=\"{url}\">{url}</a></p>\
             <p>If you did not request this, please ignore this email.</p>",
            url = reset_url
        ),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
}

/// Mailer backed by an HTTP mail API
pub struct HttpMailer {
    http_client: reqwest::Client,
    base_url: String,
    sender: String,
    api_token: Secret<String>,
}

impl HttpMailer {
    pub fn new(
        base_url: String,
        sender: String,
        api_token: Secret<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build mail HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            sender,
            api_token,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let url = format!("{}/email", self.base_url);
        let request = SendEmailRequest {
            from: &self.sender,
            to: &message.to,
            subject: &message.subject,
            html_body: &message.html_body,
        };

        self.http_client
            .post(&url)
            .header("X-Mail-Api-Token", self.api_token.expose_secret())
            .json(&request)
            .send()
            .await
            .context("Failed to send email")?
            .error_for_status()
            .context("Mail service returned an error")?;

        Ok(())
    }
}

/// Mailer that only logs
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.html_body,
            "Email delivery disabled; message logged instead"
        );
        Ok(())
    }
}

/// Pick the mailer the configuration asks for
pub fn mailer_from_config(config: &EmailConfig) -> Result<Arc<dyn Mailer>> {
    if config.enabled {
        Ok(Arc::new(HttpMailer::new(
            config.api_base_url.clone(),
            config.sender.clone(),
            config.api_token.clone(),
            Duration::from_millis(config.timeout_ms),
        )?))
    } else {
        Ok(Arc::new(LogMailer))
    }
}
