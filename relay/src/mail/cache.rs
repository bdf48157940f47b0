use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{ConfigResolver, MailError, MailTransport, SmtpTransport};

/// Builds a fresh transport. Called by [`TransportCache`] on a miss.
#[async_trait]
pub trait TransportFactory: Send + Sync + 'static {
    async fn create(&self) -> Result<Arc<dyn MailTransport>, MailError>;
}

/// Resolves config for the host type, then connects lettre to it.
pub struct SmtpTransportFactory {
    resolver: ConfigResolver,
    timeout: Duration,
}

impl SmtpTransportFactory {
    pub fn new(resolver: ConfigResolver, timeout: Duration) -> Self {
        Self { resolver, timeout }
    }
}

#[async_trait]
impl TransportFactory for SmtpTransportFactory {
    async fn create(&self) -> Result<Arc<dyn MailTransport>, MailError> {
        let config = self.resolver.resolve().await?;
        tracing::debug!(host = %config.host, port = config.port, secure = config.secure, "creating transport");
        Ok(Arc::new(SmtpTransport::from_config(&config, self.timeout)?))
    }
}

/// Holds at most one live transport.
///
/// The slot lock is held while a transport is built, so concurrent callers
/// that miss together wait for a single build instead of racing. A failed
/// build leaves the slot empty.
pub struct TransportCache {
    factory: Box<dyn TransportFactory>,
    slot: Mutex<Option<Arc<dyn MailTransport>>>,
}

impl TransportCache {
    pub fn new(factory: impl TransportFactory) -> Self {
        Self {
            factory: Box::new(factory),
            slot: Mutex::new(None),
        }
    }

    /// Return the cached transport, building it first if the slot is empty.
    pub async fn get(&self) -> Result<Arc<dyn MailTransport>, MailError> {
        let mut slot = self.slot.lock().await;
        if let Some(transport) = slot.as_ref() {
            return Ok(Arc::clone(transport));
        }

        let transport = self.factory.create().await?;
        *slot = Some(Arc::clone(&transport));
        Ok(transport)
    }

    /// Drop the cached transport so the next [`TransportCache::get`] rebuilds it.
    pub async fn reset(&self) {
        if self.slot.lock().await.take().is_some() {
            tracing::debug!("transport reset");
        }
    }

    pub async fn is_empty(&self) -> bool {
        self.slot.lock().await.is_none()
    }
}
