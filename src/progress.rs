//! Console progress for okpanel.
//!
//! Step lines go to the terminal and to the log file, so a run can be
//! reconstructed from the log alone.

use sitekit::ProgressCallback;

use crate::ui;

pub struct ConsoleProgress {
    quiet: bool,
}

impl ConsoleProgress {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl ProgressCallback for ConsoleProgress {
    fn step(&self, message: &str) {
        log::info!("{message}");
        if !self.quiet {
            ui::info(message);
        }
    }

    fn success(&self, message: &str) {
        log::info!("{message}");
        if !self.quiet {
            ui::success(message);
        }
    }

    // Warnings are shown even with --quiet.
    fn warn(&self, message: &str) {
        log::warn!("{message}");
        ui::warn(message);
    }
}
