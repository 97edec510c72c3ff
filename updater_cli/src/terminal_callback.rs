use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use updater_core::session::callback::UpdateCallback;
use updater_core::types::types::DownloadError;

/// How the last session ended, as seen from the terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Busy,
    Finished(PathBuf),
    Failed(String),
    Cancelled,
}

/// Renders an update session as a single indicatif bar.
pub struct TerminalCallback {
    bar: Mutex<Option<ProgressBar>>,
    outcome: Mutex<Option<Outcome>>,
}

impl TerminalCallback {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
            outcome: Mutex::new(None),
        }
    }

    /// Takes the outcome of the session that just ended.
    pub fn take_outcome(&self) -> Option<Outcome> {
        self.outcome.lock().unwrap().take()
    }

    fn set_outcome(&self, outcome: Outcome) {
        *self.outcome.lock().unwrap() = Some(outcome);
    }

    fn take_bar(&self) -> Option<ProgressBar> {
        self.bar.lock().unwrap().take()
    }
}

#[async_trait]
impl UpdateCallback for TerminalCallback {
    async fn on_downloading(&self, already_active: bool) {
        if already_active {
            self.set_outcome(Outcome::Busy);
        }
    }

    async fn on_start(&self, url: &str) {
        let style = ProgressStyle::with_template(
            "[{bar:40.cyan/blue}] {bytes}/{total_bytes} ({binary_bytes_per_sec}) ETA {eta} {msg}",
        )
        .unwrap()
        .progress_chars("=>-");

        let pb = ProgressBar::new(0);
        pb.set_style(style);
        pb.set_message(url.to_string());
        *self.bar.lock().unwrap() = Some(pb);
    }

    async fn on_progress(&self, bytes_done: u64, bytes_total: u64, _changed: bool) {
        if let Some(pb) = self.bar.lock().unwrap().as_ref() {
            pb.set_length(bytes_total.max(bytes_done));
            pb.set_position(bytes_done);
        }
    }

    async fn on_finish(&self, file: &Path) {
        if let Some(pb) = self.take_bar() {
            pb.finish_with_message("done");
        }
        self.set_outcome(Outcome::Finished(file.to_path_buf()));
    }

    async fn on_error(&self, error: &DownloadError) {
        if let Some(pb) = self.take_bar() {
            pb.abandon_with_message(format!("Error: {}", error));
        }
        self.set_outcome(Outcome::Failed(error.to_string()));
    }

    async fn on_cancel(&self) {
        if let Some(pb) = self.take_bar() {
            pb.abandon_with_message("cancelled");
        }
        self.set_outcome(Outcome::Cancelled);
    }
}
