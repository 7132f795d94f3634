use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::notifications::dispatcher::ConfirmationDispatcher;

/// Shared application state injected into all route handlers via Axum extractors.
/// The caller's identity is not here; it is extracted per request.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Confirmation email backend. Webhook when configured, otherwise disabled.
    pub dispatcher: Arc<dyn ConfirmationDispatcher>,
}
