use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{MailError, SmtpAuth, TransportConfig};
use crate::config::{HostType, RelayConfig};

const ETHEREAL_SMTP_HOST: &str = "smtp.ethereal.email";
const ETHEREAL_SMTP_PORT: u16 = 587;

#[derive(Serialize)]
struct AccountRequest<'a> {
    requestor: &'a str,
    version: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TestAccount {
    status: String,
    error: Option<String>,
    user: String,
    pass: String,
    smtp: Option<SmtpEndpoint>,
    web: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SmtpEndpoint {
    host: String,
    port: u16,
    #[serde(default)]
    secure: bool,
}

/// Produces a [`TransportConfig`] for the configured host type.
///
/// `postfix` needs no I/O. `ethereal` provisions a throwaway account from the
/// test-account API each time it is resolved.
#[derive(Clone)]
pub struct ConfigResolver {
    host_type: HostType,
    account_api: String,
    timeout: Duration,
    http_client: reqwest::Client,
}

impl ConfigResolver {
    pub fn new(host_type: HostType, account_api: impl Into<String>, timeout: Duration) -> Self {
        Self {
            host_type,
            account_api: account_api.into(),
            timeout,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(
            config.mail_host_type,
            config.ethereal_api_url.clone(),
            config.send_timeout(),
        )
    }

    pub async fn resolve(&self) -> Result<TransportConfig, MailError> {
        tracing::debug!(host_type = ?self.host_type, "resolving transport config");
        match self.host_type {
            HostType::Postfix => Ok(TransportConfig::postfix()),
            HostType::Ethereal => self.provision_test_account().await,
        }
    }

    async fn provision_test_account(&self) -> Result<TransportConfig, MailError> {
        let account = self
            .http_client
            .post(&self.account_api)
            .timeout(self.timeout)
            .json(&AccountRequest {
                requestor: env!("CARGO_PKG_NAME"),
                version: env!("CARGO_PKG_VERSION"),
            })
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| MailError::Provision(e.to_string()))?
            .json::<TestAccount>()
            .await
            .map_err(|e| MailError::Provision(e.to_string()))?;

        if account.status != "success" {
            let reason = account
                .error
                .unwrap_or_else(|| format!("unexpected status {:?}", account.status));
            return Err(MailError::Provision(reason));
        }

        tracing::debug!(user = %account.user, web = ?account.web, "provisioned test account");

        let (host, port, secure) = match account.smtp {
            Some(smtp) => (smtp.host, smtp.port, smtp.secure),
            None => (ETHEREAL_SMTP_HOST.to_string(), ETHEREAL_SMTP_PORT, false),
        };

        Ok(TransportConfig {
            host,
            port,
            secure,
            auth: Some(SmtpAuth {
                user: account.user,
                pass: account.pass,
            }),
            web_url: account.web,
        })
    }
}
