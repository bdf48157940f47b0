//! Outbound mail: request validation, message composition and SMTP delivery.
//!
//! This module is a thin layer over [lettre](https://lettre.rs). A single
//! transport is built lazily from the configured host type and shared by all
//! requests until a send fails, at which point it is discarded and rebuilt on
//! the next request.
//!
//! ```ignore
//! let resolver = ConfigResolver::from_config(&config);
//! let cache = TransportCache::new(SmtpTransportFactory::new(resolver, config.send_timeout()));
//! let dispatcher = Dispatcher::new(cache, config.send_timeout());
//!
//! let email = request.compose(&config.mail_from)?;
//! let result = dispatcher.send(&email).await?;
//! ```

mod cache;
mod dispatch;
mod message;
mod request;
mod resolver;
mod transport;

pub use cache::{SmtpTransportFactory, TransportCache, TransportFactory};
pub use dispatch::Dispatcher;
pub use message::{Email, EmailBody, EmailBuilder};
pub use request::{MailRequest, ValidationError};
pub use resolver::ConfigResolver;
pub use transport::{
    MailTransport, SendEnvelope, SendResult, SmtpAuth, SmtpTransport, TransportConfig,
};

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("failed to provision test account: {0}")]
    Provision(String),

    #[error("SMTP error: {0}")]
    Smtp(String),

    #[error("send timed out after {0:?}")]
    Timeout(Duration),
}
