//! Confirmation email dispatch.
//!
//! The email service is an external collaborator reached over a JSON webhook.
//! `AppState` holds an `Arc<dyn ConfirmationDispatcher>`, chosen at startup from
//! config. Dispatch is best-effort: callers go through [`dispatch_confirmation`],
//! which logs failures instead of returning them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;

const MAX_ATTEMPTS: u32 = 2;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("confirmation emails are disabled")]
    Disabled,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("dispatcher returned status {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// Payload posted to the email service.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmationEmail {
    pub template: &'static str,
    pub application_id: Uuid,
    pub to: String,
    pub recipient_name: String,
    pub language: String,
    pub opportunity_title: String,
    pub link: String,
    pub submitted_at: DateTime<Utc>,
}

#[async_trait]
pub trait ConfirmationDispatcher: Send + Sync {
    async fn send(&self, email: &ConfirmationEmail) -> Result<(), DispatchError>;
}

/// Used when no email service is configured. Every send fails with `Disabled`.
pub struct DisabledDispatcher;

#[async_trait]
impl ConfirmationDispatcher for DisabledDispatcher {
    async fn send(&self, _email: &ConfirmationEmail) -> Result<(), DispatchError> {
        Err(DispatchError::Disabled)
    }
}

/// Posts confirmation emails as JSON to an HTTP endpoint.
/// Retries once on 429 and 5xx responses.
pub struct WebhookDispatcher {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl WebhookDispatcher {
    pub fn new(endpoint: String, token: Option<String>) -> Result<Self, DispatchError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            endpoint,
            token,
        })
    }
}

#[async_trait]
impl ConfirmationDispatcher for WebhookDispatcher {
    async fn send(&self, email: &ConfirmationEmail) -> Result<(), DispatchError> {
        let mut last_error: Option<DispatchError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let delay = Duration::from_millis(250 * (1 << (attempt - 1)));
                warn!(
                    "Confirmation dispatch attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let mut request = self.client.post(&self.endpoint).json(email);
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(DispatchError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                debug!(
                    "Confirmation email for application {} accepted ({})",
                    email.application_id, status
                );
                return Ok(());
            }

            let message = response.text().await.unwrap_or_default();
            let error = DispatchError::Rejected {
                status: status.as_u16(),
                message,
            };
            if status.as_u16() == 429 || status.is_server_error() {
                last_error = Some(error);
                continue;
            }
            return Err(error);
        }

        Err(last_error.unwrap_or(DispatchError::Disabled))
    }
}

/// Picks the dispatcher for this deployment.
pub fn dispatcher_from_config(
    config: &Config,
) -> Result<Arc<dyn ConfirmationDispatcher>, DispatchError> {
    match &config.confirmation_webhook_url {
        Some(url) => {
            info!("Confirmation emails go to {url}");
            Ok(Arc::new(WebhookDispatcher::new(
                url.clone(),
                config.confirmation_webhook_token.clone(),
            )?))
        }
        None => {
            warn!("CONFIRMATION_WEBHOOK_URL not set; confirmation emails are disabled");
            Ok(Arc::new(DisabledDispatcher))
        }
    }
}

/// Sends `email`, swallowing any failure. Returns whether it was delivered.
pub async fn dispatch_confirmation(
    dispatcher: &dyn ConfirmationDispatcher,
    email: &ConfirmationEmail,
) -> bool {
    match dispatcher.send(email).await {
        Ok(()) => true,
        Err(DispatchError::Disabled) => {
            debug!(
                "Skipping confirmation email for application {}: dispatch disabled",
                email.application_id
            );
            false
        }
        Err(e) => {
            warn!(
                "Confirmation email for application {} failed: {e}",
                email.application_id
            );
            false
        }
    }
}
