//! Terminal progress bar for data migrations.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use switchbook_moderation::MigrationProgress;

/// Draws a progress bar on stderr while a migration runs.
///
/// When `quiet` is true the bar is hidden and only warnings reach the log.
pub(crate) struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub(crate) fn new(quiet: bool) -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
        if quiet {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        let style = ProgressStyle::with_template("  {bar:30.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        Self { bar }
    }
}

impl MigrationProgress for BarProgress {
    fn on_item(&self, current: usize, total: usize, name: &str) {
        self.bar.set_length(total as u64);
        self.bar.set_position(current as u64);
        self.bar.set_message(name.to_string());
    }

    fn on_phase(&self, message: &str) {
        self.bar.suspend(|| log::info!("{}", message));
    }

    fn on_complete(&self, message: &str) {
        self.bar.finish_and_clear();
        log::info!("{}", message);
    }
}
