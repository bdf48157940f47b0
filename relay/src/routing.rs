use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::config::RelayConfig;
use crate::error::{Envelope, JsonLine, RelayError};
use crate::mail::{
    ConfigResolver, Dispatcher, MailError, MailRequest, SmtpTransportFactory, TransportCache,
    TransportFactory,
};

type Result<T> = std::result::Result<T, RelayError>;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct Context {
    pub config: Arc<RelayConfig>,
    pub dispatcher: Dispatcher,
    banner: Arc<str>,
}

impl Context {
    /// State backed by a real SMTP transport for the configured host type.
    pub fn new(config: Arc<RelayConfig>) -> Self {
        let factory = SmtpTransportFactory::new(
            ConfigResolver::from_config(&config),
            config.send_timeout(),
        );
        Self::with_factory(config, factory)
    }

    pub fn with_factory(config: Arc<RelayConfig>, factory: impl TransportFactory) -> Self {
        let dispatcher = Dispatcher::new(TransportCache::new(factory), config.send_timeout());
        Self {
            banner: config.banner().into(),
            config,
            dispatcher,
        }
    }
}

/// `GET /`, `POST /sendmail`; everything else, wrong methods included, is 404.
pub fn router(ctx: Context) -> Router {
    Router::new()
        .route("/", get(banner).fallback(not_found))
        .route("/sendmail", post(send_mail).fallback(not_found))
        .fallback(not_found)
        .with_state(ctx)
}

async fn banner(State(ctx): State<Context>) -> JsonLine<String> {
    JsonLine(ctx.banner.to_string())
}

async fn not_found(method: Method, uri: Uri) -> RelayError {
    tracing::debug!(%method, %uri, "no route");
    RelayError::NotFound
}

fn success(message: String) -> Response {
    (StatusCode::OK, JsonLine(Envelope::Success(message))).into_response()
}

async fn send_mail(
    State(ctx): State<Context>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Response> {
    let request = MailRequest::from_body(&body?)?;
    tracing::debug!(?request, "sendmail request");

    request.validate()?;

    if !ctx.config.enable_send {
        tracing::debug!("sending email is disabled");
        return Ok(success(format!(
            "sendmail-relay success. Send email disabled but have this email address: {}",
            request.recipient()
        )));
    }

    let email = request
        .compose(&ctx.config.mail_from)
        .map_err(RelayError::Compose)?;

    match ctx.dispatcher.send(&email).await {
        Ok(result) => {
            let summary =
                serde_json::to_string(&result).map_err(|e| RelayError::Internal(e.to_string()))?;
            Ok(success(format!("Success send {summary}")))
        }
        // The message itself could not be rendered; the transport is fine.
        Err(err @ MailError::Build(_)) => Err(RelayError::Compose(err)),
        Err(err) => {
            // Most likely a refused connection; rebuild the transport on the next request.
            ctx.dispatcher.reset_transport().await;
            Err(RelayError::Transport(err))
        }
    }
}
