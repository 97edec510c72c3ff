#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};

use updater_core::downloader::transport::Transport;
use updater_core::installer::Installer;
use updater_core::notification::{NotificationTarget, Notifier};
use updater_core::platform::AppContext;
use updater_core::session::callback::UpdateCallback;
use updater_core::types::types::{DownloadError, TransferEvent, TransferRequest};

pub const PACKAGE: &str = "com.example.demo";
pub const APP_ICON: i32 = 7;

// ---------------------------------------------------------------
// AppContext
// ---------------------------------------------------------------

pub struct FakeContext {
    pub dirs: Vec<PathBuf>,
    pub primary: Option<PathBuf>,
    pub channels: bool,
}

impl FakeContext {
    pub fn new(dir: &Path) -> Self {
        Self {
            dirs: vec![dir.to_path_buf()],
            primary: None,
            channels: true,
        }
    }
}

impl AppContext for FakeContext {
    fn external_files_dirs(&self, kind: &str) -> Vec<PathBuf> {
        self.dirs.iter().map(|d| d.join(kind)).collect()
    }

    fn primary_external_files_dir(&self, kind: &str) -> Option<PathBuf> {
        self.primary.as_ref().map(|d| d.join(kind))
    }

    fn app_name(&self) -> String {
        "Demo App".to_string()
    }

    fn package_name(&self) -> String {
        PACKAGE.to_string()
    }

    fn app_icon(&self) -> i32 {
        APP_ICON
    }

    fn supports_notification_channels(&self) -> bool {
        self.channels
    }
}

// ---------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------

#[derive(Default)]
pub struct RecordingNotifier {
    pub shown: Mutex<Vec<String>>,
    pub targets: Mutex<Vec<NotificationTarget>>,
}

impl RecordingNotifier {
    pub fn shown(&self) -> Vec<String> {
        self.shown.lock().unwrap().clone()
    }

    fn push(&self, target: Option<&NotificationTarget>, entry: String) {
        self.shown.lock().unwrap().push(entry);
        if let Some(target) = target {
            self.targets.lock().unwrap().push(target.clone());
        }
    }
}

impl Notifier for RecordingNotifier {
    fn show_start(&self, target: &NotificationTarget, _title: &str, _content: &str, _vibrate: bool, _sound: bool) {
        self.push(Some(target), "start".to_string());
    }

    fn show_progress(&self, target: &NotificationTarget, _title: &str, content: &str, progress: u8, _max: u8) {
        self.push(Some(target), format!("progress:{}:{}", progress, content));
    }

    fn show_finish(&self, target: &NotificationTarget, _title: &str, _content: &str, _file: &Path, authority: &str) {
        self.push(Some(target), format!("finish:{}", authority));
    }

    fn show_error(&self, target: &NotificationTarget, _title: &str, _content: &str, re_download: bool) {
        self.push(Some(target), format!("error:{}", re_download));
    }

    fn cancel(&self, id: i32) {
        self.push(None, format!("cancel:{}", id));
    }
}

// ---------------------------------------------------------------
// Installer
// ---------------------------------------------------------------

/// Accepts exactly one checksum value and reports a fixed version probe.
pub struct FakeInstaller {
    pub accepted_checksum: Option<String>,
    pub version_probe: Result<bool, String>,
    pub installs: Mutex<Vec<(PathBuf, String)>>,
}

impl FakeInstaller {
    pub fn accepting(checksum: &str) -> Self {
        Self {
            accepted_checksum: Some(checksum.to_string()),
            version_probe: Ok(false),
            installs: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            accepted_checksum: None,
            version_probe: Ok(false),
            installs: Mutex::new(Vec::new()),
        }
    }

    pub fn with_version_probe(mut self, probe: Result<bool, String>) -> Self {
        self.version_probe = probe;
        self
    }

    pub fn installs(&self) -> Vec<(PathBuf, String)> {
        self.installs.lock().unwrap().clone()
    }
}

impl Installer for FakeInstaller {
    fn install_apk(&self, file: &Path, authority: &str) -> Result<(), DownloadError> {
        self.installs
            .lock()
            .unwrap()
            .push((file.to_path_buf(), authority.to_string()));
        Ok(())
    }

    fn apk_version_matches(&self, _version_code: i64, _file: &Path) -> Result<bool, DownloadError> {
        self.version_probe.clone().map_err(DownloadError::Install)
    }

    fn check_file_checksum(&self, _file: &Path, expected: &str) -> bool {
        self.accepted_checksum.as_deref() == Some(expected)
    }
}

// ---------------------------------------------------------------
// Transport
// ---------------------------------------------------------------

#[derive(Clone)]
pub enum Behavior {
    /// Reports two progress steps, writes `body`, then finishes.
    Succeed(Vec<u8>),
    /// Starts, then fails with HTTP 500.
    Fail,
    /// Writes `partial` and parks until `cancel()` is called.
    BlockUntilCancelled(Vec<u8>),
    /// Starts and returns without a terminal event.
    Silent,
}

pub struct ScriptedTransport {
    behavior: Behavior,
    pub calls: Mutex<Vec<TransferRequest>>,
    /// Whether the target file existed when `download` was entered.
    pub existed_on_entry: Mutex<Vec<bool>>,
    cancelled: Notify,
}

impl ScriptedTransport {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
            existed_on_entry: Mutex::new(Vec::new()),
            cancelled: Notify::new(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn download(&self, request: TransferRequest, events: mpsc::Sender<TransferEvent>) {
        let target = request.target_file();
        self.existed_on_entry.lock().unwrap().push(target.exists());
        self.calls.lock().unwrap().push(request.clone());

        let _ = events
            .send(TransferEvent::Started {
                url: request.url.clone(),
            })
            .await;

        match &self.behavior {
            Behavior::Succeed(body) => {
                let total = body.len() as u64;
                for done in [total / 2, total] {
                    let _ = events
                        .send(TransferEvent::Progress {
                            bytes_done: done,
                            bytes_total: total,
                        })
                        .await;
                }
                tokio::fs::write(&target, body).await.unwrap();
                let _ = events.send(TransferEvent::Finished { file: target }).await;
            }
            Behavior::Fail => {
                let _ = events
                    .send(TransferEvent::Errored(DownloadError::HttpStatus(500)))
                    .await;
            }
            Behavior::BlockUntilCancelled(partial) => {
                tokio::fs::write(&target, partial).await.unwrap();
                self.cancelled.notified().await;
                let _ = events.send(TransferEvent::Cancelled).await;
            }
            Behavior::Silent => {}
        }
    }

    fn cancel(&self) {
        self.cancelled.notify_one();
    }
}

// ---------------------------------------------------------------
// Callback
// ---------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Downloading(bool),
    Start(String),
    Progress(u64, u64, bool),
    Finish(PathBuf),
    Error(String),
    Cancel,
}

#[derive(Default)]
pub struct RecordingCallback {
    pub events: Mutex<Vec<Recorded>>,
}

impl RecordingCallback {
    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: Recorded) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl UpdateCallback for RecordingCallback {
    async fn on_downloading(&self, already_active: bool) {
        self.push(Recorded::Downloading(already_active));
    }

    async fn on_start(&self, url: &str) {
        self.push(Recorded::Start(url.to_string()));
    }

    async fn on_progress(&self, bytes_done: u64, bytes_total: u64, changed: bool) {
        self.push(Recorded::Progress(bytes_done, bytes_total, changed));
    }

    async fn on_finish(&self, file: &Path) {
        self.push(Recorded::Finish(file.to_path_buf()));
    }

    async fn on_error(&self, error: &DownloadError) {
        self.push(Recorded::Error(error.to_string()));
    }

    async fn on_cancel(&self) {
        self.push(Recorded::Cancel);
    }
}
