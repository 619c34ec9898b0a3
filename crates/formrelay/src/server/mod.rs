//! HTTP surface for formrelay.
//!
//! This module wires the axum router, the shared application state, and the
//! serve loop. Endpoint behavior lives in [`handlers`].

pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::mailer::{Mailer, SmtpMailer};
use crate::storage::SubmissionLog;

/// Maximum accepted JSON body size (10 MB).
const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Shared state injected into every handler.
///
/// The mailer and the submission log are constructed once at startup and
/// handed to the router; nothing here is global.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,
    /// Outbound mail client.
    pub mailer: Arc<dyn Mailer>,
    /// File-backed submission log.
    pub log: Arc<SubmissionLog>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("log", &self.log)
            .finish_non_exhaustive()
    }
}

/// Build the application router.
///
/// CORS is permissive and the JSON body limit is 10 MB, matching the
/// deployment this service fronts.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/test-smtp", get(handlers::verify_smtp))
        .route("/test", get(handlers::send_test))
        .route("/send-with-reply", post(handlers::submit))
        .route("/send", post(handlers::send_simple))
        .route("/save-submission", post(handlers::save_raw))
        .route("/submissions/view", get(handlers::view_submissions))
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}

/// Run the HTTP server until shutdown.
///
/// Builds the SMTP mailer and the submission log from configuration,
/// verifies the SMTP connection once (logging the outcome without failing
/// startup), binds the listener, and serves.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the bind address does not
/// parse, or the listener cannot be bound.
pub async fn serve(config: Config, bind_override: Option<String>) -> Result<()> {
    config.validate()?;

    let bind = bind_override.unwrap_or_else(|| config.server.bind.clone());
    let addr: SocketAddr = bind
        .parse()
        .map_err(|_| Error::config_validation(format!("invalid bind address '{bind}'")))?;

    let mailer = Arc::new(SmtpMailer::from_config(&config)?);
    let log = Arc::new(SubmissionLog::open(config.submissions_path())?);

    // One connection check at startup; a failure is worth knowing about but
    // must not keep the intake endpoint down.
    match mailer.verify().await {
        Ok(true) => info!(
            "SMTP connection verified ({}:{})",
            config.smtp.host, config.smtp.port
        ),
        Ok(false) => warn!(
            "SMTP connection check failed ({}:{})",
            config.smtp.host, config.smtp.port
        ),
        Err(err) => warn!("SMTP connection check failed: {err}"),
    }

    let state = AppState {
        config: Arc::new(config),
        mailer,
        log,
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_builds() {
        let (_dir, _mailer, state) = test_support::state();
        let _app: Router = router(state);
    }

    #[test]
    fn test_state_is_cloneable() {
        let (_dir, _mailer, state) = test_support::state();
        let cloned = state.clone();
        assert_eq!(
            cloned.config.mail.from_address,
            state.config.mail.from_address
        );
    }

    #[tokio::test]
    async fn test_serve_rejects_invalid_config() {
        let config = Config::default(); // no SMTP host, no from address
        let result = serve(config, None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_serve_rejects_bad_bind_address() {
        let mut config = Config::default();
        config.smtp.host = "smtp.example.com".to_string();
        config.mail.from_address = "relay@example.com".to_string();
        config.server.bind = "not-an-address".to_string();

        let result = serve(config, None).await;
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }
}
