//! Mail transport trait and SMTP implementation.

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::response::Response;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Email, MailError};

// Trailing "[STATUS=new MSGID=...]" block Ethereal appends to its final 250 reply.
static STATUS_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\s*$").expect("valid status block regex"));

/// Async mail sending trait.
///
/// Implement this to provide alternative backends; tests use an in-memory fake.
#[async_trait]
pub trait MailTransport: Send + Sync + 'static {
    /// Send one email. A single attempt, no retries.
    async fn send(&self, email: &Email) -> Result<SendResult, MailError>;

    /// Link where a sandbox provider lets you view the sent message, if any.
    fn preview_url(&self, _result: &SendResult) -> Option<String> {
        None
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct SmtpAuth {
    pub user: String,
    pub pass: String,
}

impl fmt::Debug for SmtpAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpAuth")
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .finish()
    }
}

/// Connection parameters for one transport lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub host: String,
    pub port: u16,
    /// Implicit TLS from the first byte. When false, STARTTLS is used if credentials are sent.
    pub secure: bool,
    pub auth: Option<SmtpAuth>,
    /// Web UI base of a sandbox provider, used for preview links.
    pub web_url: Option<String>,
}

impl TransportConfig {
    pub fn postfix() -> Self {
        TransportConfig {
            host: "postfix".to_string(),
            port: 25,
            secure: false,
            auth: None,
            web_url: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendEnvelope {
    pub from: Option<String>,
    pub to: Vec<String>,
}

/// Outcome of a successful send, passed through to the HTTP response as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    pub message_id: Option<String>,
    pub envelope: SendEnvelope,
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
    pub pending: Vec<String>,
    /// Last SMTP reply, e.g. `250 2.0.0 Ok: queued as 4F1B2`.
    pub response: String,
}

impl SendResult {
    fn from_reply(message: &Message, reply: &Response) -> Self {
        let envelope = message.envelope();
        let to: Vec<String> = envelope.to().iter().map(ToString::to_string).collect();
        let lines: Vec<String> = reply.message().map(ToString::to_string).collect();

        SendResult {
            message_id: message
                .headers()
                .get_raw("Message-ID")
                .map(|id| id.trim().to_string()),
            envelope: SendEnvelope {
                from: envelope.from().map(ToString::to_string),
                to: to.clone(),
            },
            // lettre fails the whole send if any RCPT is refused
            accepted: to,
            rejected: Vec::new(),
            pending: Vec::new(),
            response: format!("{} {}", reply.code(), lines.join(" ")),
        }
    }

    /// Build a preview link from the `MSGID` in a sandbox reply, e.g.
    /// `250 Accepted [STATUS=new MSGID=abc]` with `https://ethereal.email`
    /// gives `https://ethereal.email/message/abc`.
    pub fn preview_url(&self, web_url: &str) -> Option<String> {
        let block = STATUS_BLOCK.captures(&self.response)?.get(1)?.as_str();
        let msgid = block
            .split_whitespace()
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "MSGID")
            .map(|(_, value)| value)?;

        Some(format!("{}/message/{}", web_url.trim_end_matches('/'), msgid))
    }
}

/// SMTP-based transport using lettre.
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    web_url: Option<String>,
}

impl SmtpTransport {
    pub fn from_config(config: &TransportConfig, timeout: Duration) -> Result<Self, MailError> {
        let mut builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| MailError::Smtp(e.to_string()))?
        } else if config.auth.is_some() {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| MailError::Smtp(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        builder = builder.port(config.port).timeout(Some(timeout));

        if let Some(auth) = &config.auth {
            builder = builder.credentials(Credentials::new(auth.user.clone(), auth.pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            web_url: config.web_url.clone(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, email: &Email) -> Result<SendResult, MailError> {
        let message = email.to_message()?;

        let reply = self
            .transport
            .send(message.clone())
            .await
            .map_err(|e| MailError::Smtp(e.to_string()))?;

        Ok(SendResult::from_reply(&message, &reply))
    }

    fn preview_url(&self, result: &SendResult) -> Option<String> {
        result.preview_url(self.web_url.as_deref()?)
    }
}
