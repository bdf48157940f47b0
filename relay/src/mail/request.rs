use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::{Email, MailError};

// Loose sanity check only: catches obviously wrong addresses, not a full RFC 5322 parse.
static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9_.%+-]+@[A-Za-z0-9_.-]+\.[A-Za-z0-9_]+").expect("valid email regex")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Must provide valid email address in the request.")]
    Recipient,
    #[error("Must provide subject for the email in the request.")]
    Subject,
    #[error("Must provide either a text or html body in the request.")]
    Body,
}

/// JSON body of `POST /sendmail`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MailRequest {
    pub to_address: Option<String>,
    pub subject: Option<String>,
    pub text_body: Option<String>,
    pub html_body: Option<String>,
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

impl MailRequest {
    /// Parse a raw request body. A blank body is treated as an empty request.
    pub fn from_body(body: &[u8]) -> Result<Self, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
    }

    /// Checks recipient, subject and body in that order, stopping at the first failure.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match non_empty(&self.to_address) {
            Some(address) if EMAIL_SHAPE.is_match(address) => {}
            _ => return Err(ValidationError::Recipient),
        }
        if non_empty(&self.subject).is_none() {
            return Err(ValidationError::Subject);
        }
        if non_empty(&self.text_body).is_none() && non_empty(&self.html_body).is_none() {
            return Err(ValidationError::Body);
        }
        Ok(())
    }

    pub fn recipient(&self) -> &str {
        self.to_address.as_deref().unwrap_or_default()
    }

    /// Build the outgoing email sent from `from`.
    pub fn compose(&self, from: &str) -> Result<Email, MailError> {
        let mut builder = Email::builder()
            .from(from)
            .to(self.recipient())
            .subject(self.subject.as_deref().unwrap_or_default());

        if let Some(text) = non_empty(&self.text_body) {
            builder = builder.text(text);
        }
        if let Some(html) = non_empty(&self.html_body) {
            builder = builder.html(html);
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::EmailBody;

    fn request(to: &str, subject: &str, text: &str, html: &str) -> MailRequest {
        MailRequest {
            to_address: Some(to.into()),
            subject: Some(subject.into()),
            text_body: Some(text.into()),
            html_body: Some(html.into()),
        }
    }

    #[test]
    fn accepts_complete_request() {
        let req = request("user@example.com", "Hi", "text", "<p>html</p>");
        assert_eq!(req.validate(), Ok(()));
    }

    #[test]
    fn rejects_missing_recipient() {
        let req = MailRequest {
            to_address: None,
            ..request("", "Hi", "text", "")
        };
        assert_eq!(req.validate(), Err(ValidationError::Recipient));
    }

    #[test]
    fn rejects_malformed_recipients() {
        for to in ["", "user", "user@", "@example.com", "user@example", "user at example.com"] {
            let req = request(to, "Hi", "text", "");
            assert_eq!(req.validate(), Err(ValidationError::Recipient), "{to}");
        }
    }

    #[test]
    fn recipient_check_is_a_substring_match() {
        let req = request("<user@example.com>", "Hi", "text", "");
        assert_eq!(req.validate(), Ok(()));
    }

    #[test]
    fn recipient_is_checked_before_subject() {
        let req = request("nope", "", "", "");
        assert_eq!(req.validate(), Err(ValidationError::Recipient));
    }

    #[test]
    fn rejects_empty_subject() {
        let req = request("user@example.com", "", "text", "html");
        let err = req.validate().unwrap_err();
        assert_eq!(err, ValidationError::Subject);
        assert!(err.to_string().contains("subject"));
    }

    #[test]
    fn rejects_missing_both_bodies() {
        let req = request("user@example.com", "Hi", "", "");
        let err = req.validate().unwrap_err();
        assert_eq!(err, ValidationError::Body);
        assert!(err.to_string().contains("body"));
    }

    #[test]
    fn accepts_either_body() {
        assert_eq!(request("user@example.com", "Hi", "text", "").validate(), Ok(()));
        assert_eq!(request("user@example.com", "Hi", "", "<b>hi</b>").validate(), Ok(()));
    }

    #[test]
    fn parses_camel_case_body() {
        let body = br#"{"toAddress":"a@b.com","subject":"s","textBody":"t","htmlBody":"h"}"#;
        let req = MailRequest::from_body(body).unwrap();
        assert_eq!(req, request("a@b.com", "s", "t", "h"));
    }

    #[test]
    fn blank_body_is_an_empty_request() {
        assert_eq!(MailRequest::from_body(b"").unwrap(), MailRequest::default());
        assert_eq!(MailRequest::from_body(b" \n").unwrap(), MailRequest::default());
    }

    #[test]
    fn malformed_body_fails_to_parse() {
        assert!(MailRequest::from_body(b"{toAddress:").is_err());
        assert!(MailRequest::from_body(b"[1, 2]").is_err());
    }

    #[test]
    fn compose_skips_empty_bodies() {
        let email = request("user@example.com", "Hi", "", "<p>x</p>")
            .compose("relay@example.com")
            .unwrap();
        assert!(matches!(email.body, EmailBody::Html(ref h) if h == "<p>x</p>"));
        assert_eq!(email.to.email.to_string(), "user@example.com");
    }
}
