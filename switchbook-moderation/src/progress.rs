//! Progress reporting for long-running data migrations.

/// Trait for receiving migration progress updates.
pub trait MigrationProgress {
    /// Called after each record is processed.
    fn on_item(&self, current: usize, total: usize, name: &str);

    /// Called when a phase starts (e.g., "Linking 312 switches").
    fn on_phase(&self, message: &str);

    /// Called when the migration is complete.
    fn on_complete(&self, message: &str);
}

/// A no-op progress reporter that discards all updates.
pub struct SilentProgress;

impl MigrationProgress for SilentProgress {
    fn on_item(&self, _current: usize, _total: usize, _name: &str) {}
    fn on_phase(&self, _message: &str) {}
    fn on_complete(&self, _message: &str) {}
}

/// A progress reporter that logs to the `log` crate.
pub struct LogProgress;

impl MigrationProgress for LogProgress {
    fn on_item(&self, current: usize, total: usize, name: &str) {
        if current.is_multiple_of(100) || current == total {
            log::info!("  [{}/{}] {}", current, total, name);
        }
    }

    fn on_phase(&self, message: &str) {
        log::info!("{}", message);
    }

    fn on_complete(&self, message: &str) {
        log::info!("{}", message);
    }
}
