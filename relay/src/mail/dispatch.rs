use std::sync::Arc;
use std::time::Duration;

use super::{Email, MailError, SendResult, TransportCache};

/// Sends one email through the shared transport, bounded by a timeout.
///
/// A failed send is returned as-is; callers decide whether to
/// [`Dispatcher::reset_transport`]. There are no retries.
#[derive(Clone)]
pub struct Dispatcher {
    cache: Arc<TransportCache>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(cache: TransportCache, timeout: Duration) -> Self {
        Self {
            cache: Arc::new(cache),
            timeout,
        }
    }

    pub async fn send(&self, email: &Email) -> Result<SendResult, MailError> {
        let transport = self.cache.get().await?;

        let result = tokio::time::timeout(self.timeout, transport.send(email))
            .await
            .map_err(|_| MailError::Timeout(self.timeout))??;

        tracing::debug!(?result, "mail sent");
        if let Some(url) = transport.preview_url(&result) {
            tracing::info!(%url, "preview sent message");
        }

        Ok(result)
    }

    pub async fn reset_transport(&self) {
        self.cache.reset().await;
    }

    pub fn transports(&self) -> &TransportCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::mail::{MailTransport, TransportFactory};

    struct StalledTransport;

    #[async_trait]
    impl MailTransport for StalledTransport {
        async fn send(&self, _email: &Email) -> Result<SendResult, MailError> {
            std::future::pending().await
        }
    }

    struct StalledFactory;

    #[async_trait]
    impl TransportFactory for StalledFactory {
        async fn create(&self) -> Result<Arc<dyn MailTransport>, MailError> {
            Ok(Arc::new(StalledTransport))
        }
    }

    #[tokio::test]
    async fn send_times_out() {
        let timeout = Duration::from_millis(20);
        let dispatcher = Dispatcher::new(TransportCache::new(StalledFactory), timeout);
        let email = Email::builder()
            .from("a@b.com")
            .to("c@d.com")
            .subject("Hi")
            .text("Body")
            .build()
            .unwrap();

        let err = dispatcher.send(&email).await.unwrap_err();
        assert!(matches!(err, MailError::Timeout(d) if d == timeout));
        assert!(!dispatcher.transports().is_empty().await);
    }
}
