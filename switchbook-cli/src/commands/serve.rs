use std::path::PathBuf;

use crate::CliError;

use super::load_config;

/// Run the HTTP server until Ctrl-C.
pub(crate) fn run_serve(db: Option<PathBuf>, bind: Option<String>) -> Result<(), CliError> {
    let config = load_config(db)?.with_overrides(None, bind);
    if config.smtp.is_none() {
        log::warn!("SMTP is not configured; outgoing email will only be logged");
    }

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::runtime(format!("Failed to start async runtime: {}", e)))?;
    rt.block_on(switchbook_server::serve(config))?;
    Ok(())
}
