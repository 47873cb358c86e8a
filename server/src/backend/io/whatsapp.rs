//! HTTP client for the local WhatsApp automation process.
//!
//! The process exposes two endpoints:
//!
//! - `GET  {base}/whatsapp/status` returns `{"ready": bool, "status": "..."}`
//! - `POST {base}/whatsapp/send` takes `{"number": "...", "message": "..."}`

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use shared::WhatsAppStatus;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::backend::config::WhatsAppConfig;
use crate::backend::domain::{MessagingError, WhatsAppGateway};

#[derive(Debug, Serialize)]
struct SendBody<'a> {
    number: &'a str,
    message: &'a str,
}

/// Client for the WhatsApp automation process.
#[derive(Clone)]
pub struct WhatsAppClient {
    http: Client,
    base_url: String,
    poll_interval: Duration,
    ready_timeout: Duration,
}

impl WhatsAppClient {
    pub fn new(base_url: &str, config: &WhatsAppConfig) -> Result<Self, MessagingError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(MessagingError::Http)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            poll_interval: config.poll_interval(),
            ready_timeout: config.ready_timeout(),
        })
    }

    /// Client for the configured automation URL, if any.
    pub fn from_config(config: &WhatsAppConfig) -> Result<Option<Self>, MessagingError> {
        config
            .automation_url
            .as_deref()
            .map(|url| Self::new(url, config))
            .transpose()
    }

    pub fn status_url(&self) -> String {
        format!("{}/whatsapp/status", self.base_url)
    }

    pub fn send_url(&self) -> String {
        format!("{}/whatsapp/send", self.base_url)
    }
}

#[async_trait]
impl WhatsAppGateway for WhatsAppClient {
    async fn status(&self) -> Result<WhatsAppStatus, MessagingError> {
        let response = self.http.get(self.status_url()).send().await?;
        if !response.status().is_success() {
            return Ok(WhatsAppStatus {
                ready: false,
                status: Some(format!("http {}", response.status().as_u16())),
            });
        }
        Ok(response.json::<WhatsAppStatus>().await?)
    }

    async fn wait_until_ready(&self) -> Result<(), MessagingError> {
        let start = Instant::now();

        loop {
            if start.elapsed() > self.ready_timeout {
                return Err(MessagingError::NotReady(self.ready_timeout));
            }

            match self.status().await {
                Ok(status) if status.ready => {
                    debug!("WhatsApp automation ready after {:?}", start.elapsed());
                    return Ok(());
                }
                Ok(status) => debug!("WhatsApp automation not ready yet: {:?}", status.status),
                // unreachable: callers fall back to the deep link
                Err(e) => return Err(e),
            }

            sleep(self.poll_interval).await;
        }
    }

    async fn send(&self, number: &str, message: &str) -> Result<(), MessagingError> {
        let response = self
            .http
            .post(self.send_url())
            .json(&SendBody { number, message })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MessagingError::SendFailed(format!("{}: {}", status, body)));
        }

        info!("Automation accepted message for {}", number);
        Ok(())
    }
}
