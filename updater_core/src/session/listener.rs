use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::config::UpdateConfig;
use crate::installer::Installer;
use crate::notification::{self, Channel, NotificationTarget, Notifier};
use crate::platform::AppContext;
use crate::session::callback::UpdateCallback;
use crate::session::state::SessionState;
use crate::types::types::{DownloadError, TransferEvent};

/// Per-attempt context: a snapshot of the notification and retry settings
/// taken when the attempt starts, plus the caller's callback.
///
/// Consumes the attempt's `TransferEvent`s in order, applies each one to
/// the shared `SessionState`, and fans out to the notifier and callback.
pub struct AttemptListener {
    state: Arc<Mutex<SessionState>>,
    notifier: Arc<dyn Notifier>,
    installer: Arc<dyn Installer>,
    callback: Option<Arc<dyn UpdateCallback>>,

    target: NotificationTarget,
    show_notification: bool,
    show_percentage: bool,
    vibrate: bool,
    sound: bool,
    install_apk: bool,
    authority: String,
    re_download: bool,
    re_downloads: u32,
    delete_cancel_file: bool,
}

impl AttemptListener {
    pub fn new(
        config: &UpdateConfig,
        context: &dyn AppContext,
        state: Arc<Mutex<SessionState>>,
        notifier: Arc<dyn Notifier>,
        installer: Arc<dyn Installer>,
        callback: Option<Arc<dyn UpdateCallback>>,
    ) -> Self {
        let channel = context.supports_notification_channels().then(|| Channel {
            id: config.resolve_channel_id(),
            name: config.resolve_channel_name(),
        });
        let icon = if config.notification_icon <= 0 {
            context.app_icon()
        } else {
            config.notification_icon
        };

        Self {
            state,
            notifier,
            installer,
            callback,
            target: NotificationTarget {
                id: config.notification_id,
                channel,
                icon,
                cancelable: config.cancel_download,
            },
            show_notification: config.show_notification,
            show_percentage: config.show_percentage,
            vibrate: config.vibrate,
            sound: config.sound,
            install_apk: config.install_apk,
            authority: config.resolve_authority(&context.package_name()),
            re_download: config.re_download,
            re_downloads: config.re_downloads,
            delete_cancel_file: config.delete_cancel_file,
        }
    }

    /// Drains events until a terminal one arrives. A channel that closes
    /// first ends the attempt as `DownloadError::Interrupted`.
    pub async fn run(self, mut events: mpsc::Receiver<TransferEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                TransferEvent::Started { url } => self.on_start(&url).await,
                TransferEvent::Progress {
                    bytes_done,
                    bytes_total,
                } => self.on_progress(bytes_done, bytes_total).await,
                TransferEvent::Finished { file } => return self.on_finish(&file).await,
                TransferEvent::Errored(error) => return self.on_error(&error).await,
                TransferEvent::Cancelled => return self.on_cancel().await,
            }
        }
        log::warn!("[AttemptListener] transport closed without a terminal event");
        self.on_error(&DownloadError::Interrupted).await;
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    pub async fn on_start(&self, url: &str) {
        log::debug!("[AttemptListener] onStart: {}", url);
        self.with_state(|s| s.begin_transfer());
        if self.show_notification {
            self.notifier.show_start(
                &self.target,
                notification::START_TITLE,
                notification::START_CONTENT,
                self.vibrate,
                self.sound,
            );
        }
        if let Some(callback) = &self.callback {
            callback.on_start(url).await;
        }
    }

    pub async fn on_progress(&self, bytes_done: u64, bytes_total: u64) {
        self.on_progress_at(bytes_done, bytes_total, Instant::now()).await;
    }

    /// `on_progress` with an explicit clock reading.
    pub async fn on_progress_at(&self, bytes_done: u64, bytes_total: u64, now: Instant) {
        let surfaced = self.with_state(|s| s.record_progress(bytes_done, bytes_total, now));

        if let Some(progress) = surfaced {
            if self.show_notification {
                let mut content = notification::PROGRESS_CONTENT.to_string();
                if self.show_percentage {
                    content.push_str(&format!("{}%", progress));
                }
                self.notifier.show_progress(
                    &self.target,
                    notification::PROGRESS_TITLE,
                    &content,
                    progress,
                    100,
                );
            }
        }

        if let Some(callback) = &self.callback {
            callback
                .on_progress(bytes_done, bytes_total, surfaced.is_some())
                .await;
        }
    }

    pub async fn on_finish(&self, file: &Path) {
        log::debug!("[AttemptListener] onFinish: {}", file.display());
        self.with_state(|s| s.finish());
        self.notifier.show_finish(
            &self.target,
            notification::FINISH_TITLE,
            notification::FINISH_CONTENT,
            file,
            &self.authority,
        );
        if self.install_apk {
            if let Err(e) = self.installer.install_apk(file, &self.authority) {
                log::warn!("[AttemptListener] install of {} failed: {}", file.display(), e);
            }
        }
        if let Some(callback) = &self.callback {
            callback.on_finish(file).await;
        }
    }

    pub async fn on_error(&self, error: &DownloadError) {
        log::warn!("[AttemptListener] onError: {}", error);
        let retry_eligible = self.with_state(|s| {
            let eligible = s.retry_eligible(self.re_download, self.re_downloads);
            s.fail(eligible);
            eligible
        });

        if self.show_notification {
            let content = if retry_eligible {
                notification::ERROR_CONTENT_RE_DOWNLOAD
            } else {
                notification::ERROR_CONTENT
            };
            self.notifier
                .show_error(&self.target, notification::ERROR_TITLE, content, retry_eligible);
        }
        if let Some(callback) = &self.callback {
            callback.on_error(error).await;
        }
    }

    pub async fn on_cancel(&self) {
        log::debug!("[AttemptListener] onCancel");
        let file = self.with_state(|s| s.cancel());
        self.notifier.cancel(self.target.id);
        if let Some(callback) = &self.callback {
            callback.on_cancel().await;
        }
        if self.delete_cancel_file {
            if let Some(file) = file {
                remove_partial(&file).await;
            }
        }
    }
}

async fn remove_partial(file: &Path) {
    match tokio::fs::remove_file(file).await {
        Ok(()) => log::debug!("[AttemptListener] removed {}", file.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("[AttemptListener] could not remove {}: {}", file.display(), e),
    }
}
