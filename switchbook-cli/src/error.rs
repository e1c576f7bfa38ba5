use thiserror::Error;

/// Errors that can occur during CLI command execution.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Database could not be opened or queried
    #[error("Database error: {0}")]
    Database(String),

    /// A migration or moderation workflow failed
    #[error("{0}")]
    Moderation(#[from] switchbook_moderation::ModerationError),

    /// Seed data could not be read
    #[error("Seed error: {0}")]
    Seed(#[from] switchbook_catalog::YamlError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] switchbook_server::config::ConfigError),

    /// Server failed to start or stopped with an error
    #[error("Server error: {0}")]
    Serve(#[from] switchbook_server::ServeError),

    /// Runtime creation or async error
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Catch-all for other errors
    #[error("{0}")]
    Other(String),
}

impl CliError {
    pub(crate) fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub(crate) fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    pub(crate) fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

impl From<switchbook_db::SchemaError> for CliError {
    fn from(e: switchbook_db::SchemaError) -> Self {
        Self::database(e.to_string())
    }
}

impl From<switchbook_db::OperationError> for CliError {
    fn from(e: switchbook_db::OperationError) -> Self {
        Self::database(e.to_string())
    }
}
