//! HTTP API for Switchbook.
//!
//! Handlers are thin: they resolve the caller from the session cookie, run a
//! `switchbook-moderation` workflow or a `switchbook-db` query on the shared
//! connection, and send any resulting emails once the connection lock is
//! released.

pub mod auth;
pub mod config;
pub mod error;
pub mod mailer;
pub mod middleware;
mod routes;
pub mod state;

use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use axum::Router;
use switchbook_db::{open_database, purge_expired_sessions};
use tower_http::cors::{AllowOrigin, CorsLayer};

pub use auth::{hash_password, verify_password};
pub use config::{ConfigEntry, ConfigSource, ServerConfig};
pub use error::{AppError, ServeError};
pub use mailer::Mailer;
pub use state::AppState;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest("/api", routes::api())
        .layer(axum::middleware::from_fn(middleware::log_requests))
        .layer(cors_layer(&state.config.public_url))
        .with_state(state)
}

/// Browsers may call the API with cookies from the configured site origin only.
fn cors_layer(public_url: &str) -> CorsLayer {
    let origin = match HeaderValue::from_str(public_url) {
        Ok(value) => AllowOrigin::exact(value),
        Err(_) => {
            log::warn!("Public URL '{}' is not a valid origin; CORS disabled", public_url);
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

fn purge_sessions(state: &AppState) -> Result<usize, AppError> {
    let conn = state.db()?;
    Ok(purge_expired_sessions(&conn)?)
}

fn spawn_session_purge(state: AppState) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            match purge_sessions(&state) {
                Ok(0) => {}
                Ok(n) => log::info!("Purged {} expired session(s)", n),
                Err(e) => log::warn!("Session purge failed: {}", e),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}

/// Open the database, bind, and serve until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<(), ServeError> {
    let conn = open_database(&config.database)?;
    log::info!("Using database {}", config.database.display());
    let mailer =
        Mailer::from_config(config.smtp.as_ref()).map_err(|e| ServeError::Mailer(e.to_string()))?;

    let bind = config.bind.clone();
    let state = AppState::new(conn, config, mailer);
    spawn_session_purge(state.clone());

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .map_err(|source| ServeError::Bind {
            addr: bind.clone(),
            source,
        })?;
    log::info!("Listening on http://{}", bind);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
