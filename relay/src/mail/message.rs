//! Outgoing email type and builder.

use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::Message;

use super::MailError;

/// The body content of an email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailBody {
    /// Plain text only.
    Text(String),
    /// HTML only.
    Html(String),
    /// Both plain text and HTML (multipart/alternative).
    Multipart { text: String, html: String },
}

/// A composed email with parsed sender and recipient.
#[derive(Debug, Clone)]
pub struct Email {
    pub from: Mailbox,
    pub to: Mailbox,
    pub subject: String,
    pub body: EmailBody,
}

impl Email {
    pub fn builder() -> EmailBuilder {
        EmailBuilder::default()
    }

    /// Render into a lettre [`Message`] with a freshly generated `Message-ID`.
    pub fn to_message(&self) -> Result<Message, MailError> {
        let builder = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(&self.subject)
            .message_id(None);

        let message = match &self.body {
            EmailBody::Text(text) => builder.singlepart(SinglePart::plain(text.clone())),
            EmailBody::Html(html) => builder.singlepart(SinglePart::html(html.clone())),
            EmailBody::Multipart { text, html } => builder.multipart(
                MultiPart::alternative_plain_html(text.clone(), html.clone()),
            ),
        };

        message.map_err(|e| MailError::Build(e.to_string()))
    }
}

/// Builder for [`Email`]. Addresses are parsed when [`EmailBuilder::build`] runs.
#[derive(Debug, Default)]
pub struct EmailBuilder {
    from: Option<String>,
    to: Option<String>,
    subject: Option<String>,
    text: Option<String>,
    html: Option<String>,
}

impl EmailBuilder {
    pub fn from(mut self, address: impl Into<String>) -> Self {
        self.from = Some(address.into());
        self
    }

    pub fn to(mut self, address: impl Into<String>) -> Self {
        self.to = Some(address.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn build(self) -> Result<Email, MailError> {
        let from = parse_mailbox(self.from, "from address required")?;
        let to = parse_mailbox(self.to, "recipient required")?;

        let subject = self
            .subject
            .ok_or_else(|| MailError::Build("subject required".into()))?;

        let body = match (self.text, self.html) {
            (Some(text), Some(html)) => EmailBody::Multipart { text, html },
            (Some(text), None) => EmailBody::Text(text),
            (None, Some(html)) => EmailBody::Html(html),
            (None, None) => return Err(MailError::Build("body required (text or html)".into())),
        };

        Ok(Email {
            from,
            to,
            subject,
            body,
        })
    }
}

fn parse_mailbox(address: Option<String>, missing: &str) -> Result<Mailbox, MailError> {
    let address = address.ok_or_else(|| MailError::Build(missing.into()))?;
    address
        .trim()
        .parse()
        .map_err(|_| MailError::InvalidAddress(address))
}
