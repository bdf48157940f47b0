use axum::extract::rejection::BytesRejection;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::mail::{MailError, ValidationError};

/// Every failure a request can end in. Each maps to exactly one response.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("request did not validate. {0}")]
    Validation(#[from] ValidationError),

    #[error("malformed request body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("could not read request body: {}", .0.body_text())]
    Unreadable(#[from] BytesRejection),

    #[error("request could not be composed into an email: {0}")]
    Compose(#[source] MailError),

    #[error("unexpected sendmail error: {0}")]
    Transport(#[source] MailError),

    #[error("unexpected application error: {0}")]
    Internal(String),

    #[error("Resource not found")]
    NotFound,
}

impl RelayError {
    pub fn http_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::MalformedBody(_) | Self::Compose(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unreadable(rejection) => rejection.status(),
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Transport(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal errors are not described to the client.
    pub fn http_message(&self) -> String {
        match self {
            Self::Internal(_) => "an internal server error occurred".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        if self.http_code().is_server_error() {
            tracing::error!("Error Status {}: {}", self.http_code(), self);
        } else {
            tracing::debug!("Error Status {}: {}", self.http_code(), self);
        }

        (self.http_code(), JsonLine(Envelope::Error(self.http_message()))).into_response()
    }
}

/// Response body shape: `{"success": "..."}` or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Envelope {
    Success(String),
    Error(String),
}

/// JSON response with a trailing newline.
#[derive(Debug, Clone)]
pub struct JsonLine<T>(pub T);

impl<T: Serialize> IntoResponse for JsonLine<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(mut body) => {
                body.push(b'\n');
                (
                    [(
                        header::CONTENT_TYPE,
                        HeaderValue::from_static("application/json"),
                    )],
                    body,
                )
                    .into_response()
            }
            Err(err) => {
                tracing::error!("failed to serialize response: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_is_single_keyed_object() {
        let json = serde_json::to_string(&Envelope::Success("ok".into())).unwrap();
        assert_eq!(json, r#"{"success":"ok"}"#);
        let json = serde_json::to_string(&Envelope::Error("bad".into())).unwrap();
        assert_eq!(json, r#"{"error":"bad"}"#);
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            RelayError::from(ValidationError::Subject).http_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(RelayError::NotFound.http_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            RelayError::Transport(MailError::Smtp("refused".into())).http_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn transport_message_includes_cause() {
        let err = RelayError::Transport(MailError::Smtp("connection refused".into()));
        assert!(err.http_message().contains("connection refused"));
    }

    #[test]
    fn internal_message_is_generic() {
        let err = RelayError::Internal("serializer exploded".into());
        assert_eq!(err.http_message(), "an internal server error occurred");
    }
}
