use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use switchbook_moderation::EmailMessage;

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::mailer::Mailer;

/// Shared handler state.
///
/// The connection guard returned by [`AppState::db`] must be dropped before
/// any `.await`; handlers do their database work in a block and await the
/// mailer afterwards.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    pub config: Arc<ServerConfig>,
    pub mailer: Arc<Mailer>,
}

impl AppState {
    pub fn new(conn: Connection, config: ServerConfig, mailer: Mailer) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            config: Arc::new(config),
            mailer: Arc::new(mailer),
        }
    }

    pub fn db(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.db
            .lock()
            .map_err(|_| AppError::Internal("database lock poisoned".to_string()))
    }

    /// Absolute URL for a site path, for use in emails.
    pub fn link(&self, path: &str) -> String {
        format!("{}{}", self.config.public_url, path)
    }

    /// Send transition emails, turning bare site paths in the body into
    /// absolute links.
    pub async fn deliver(&self, emails: Vec<EmailMessage>) {
        let emails = emails
            .into_iter()
            .map(|mut email| {
                email.body = email
                    .body
                    .lines()
                    .map(|line| {
                        if line.starts_with('/') {
                            self.link(line)
                        } else {
                            line.to_string()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                email
            })
            .collect();
        self.mailer.send_all(emails).await;
    }
}
