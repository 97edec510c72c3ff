use std::path::Path;

pub const START_TITLE: &str = "Preparing update";
pub const START_CONTENT: &str = "Connecting to the download server...";
pub const PROGRESS_TITLE: &str = "Downloading update";
pub const PROGRESS_CONTENT: &str = "Downloaded ";
pub const FINISH_TITLE: &str = "Download complete";
pub const FINISH_CONTENT: &str = "Tap to install";
pub const ERROR_TITLE: &str = "Download failed";
pub const ERROR_CONTENT: &str = "The update could not be downloaded";
pub const ERROR_CONTENT_RE_DOWNLOAD: &str = "Download failed, tap to download again";

/// Notification channel, only present on platforms that have channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub name: String,
}

/// Fields shared by every notification of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTarget {
    pub id: i32,
    pub channel: Option<Channel>,
    pub icon: i32,
    pub cancelable: bool,
}

/// Side-effect sink for download notifications. Nothing it returns is
/// consumed by the service.
pub trait Notifier: Send + Sync {
    fn show_start(&self, target: &NotificationTarget, title: &str, content: &str, vibrate: bool, sound: bool);

    fn show_progress(&self, target: &NotificationTarget, title: &str, content: &str, progress: u8, max: u8);

    fn show_finish(&self, target: &NotificationTarget, title: &str, content: &str, file: &Path, authority: &str);

    /// `re_download` marks the notification as tappable to retry.
    fn show_error(&self, target: &NotificationTarget, title: &str, content: &str, re_download: bool);

    fn cancel(&self, id: i32);
}

/// Writes notifications to the `log` facade. Used where no system
/// notification surface exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show_start(&self, target: &NotificationTarget, title: &str, content: &str, _vibrate: bool, _sound: bool) {
        log::info!("[LogNotifier] #{} {}: {}", target.id, title, content);
    }

    fn show_progress(&self, target: &NotificationTarget, title: &str, content: &str, progress: u8, max: u8) {
        log::debug!("[LogNotifier] #{} {}: {} ({}/{})", target.id, title, content, progress, max);
    }

    fn show_finish(&self, target: &NotificationTarget, title: &str, content: &str, file: &Path, _authority: &str) {
        log::info!("[LogNotifier] #{} {}: {} ({})", target.id, title, content, file.display());
    }

    fn show_error(&self, target: &NotificationTarget, title: &str, content: &str, re_download: bool) {
        log::warn!("[LogNotifier] #{} {}: {} (re-download={})", target.id, title, content, re_download);
    }

    fn cancel(&self, id: i32) {
        log::debug!("[LogNotifier] #{} cancelled", id);
    }
}
