//! HTTP-to-SMTP mail relay.
//!
//! `POST /sendmail` takes `{toAddress, subject, textBody, htmlBody}`,
//! validates it and hands it to a lazily built SMTP transport.

pub mod config;
pub mod error;
pub mod logging;
pub mod mail;
pub mod routing;
mod serve;

pub use crate::config::{EnvConfig, RelayConfig};
pub use crate::error::RelayError;
pub use crate::routing::{router, Context};
pub use crate::serve::{serve, shutdown_signal};
