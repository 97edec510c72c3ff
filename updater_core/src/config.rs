use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::types::DownloadError;

/// Sub-directory of the app-scoped storage used when no path is configured.
pub const DEFAULT_DIR: &str = "apk";
pub const DEFAULT_NOTIFICATION_ID: i32 = 102;
pub const DEFAULT_NOTIFICATION_CHANNEL_ID: &str = "95279527";
pub const DEFAULT_NOTIFICATION_CHANNEL_NAME: &str = "AppUpdater";
/// Appended to the package name when no install authority is configured.
pub const DEFAULT_FILE_PROVIDER: &str = ".fileProvider";
pub const DEFAULT_RE_DOWNLOADS: u32 = 3;

/// Describes one update download. Built by the caller before each session
/// and never mutated by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    pub url: String,
    pub path: Option<PathBuf>,
    pub filename: Option<String>,
    pub version_code: Option<i64>,
    /// Expected digest of the artifact (MD5 or SHA-256, hex).
    pub checksum: Option<String>,
    pub request_properties: HashMap<String, String>,

    pub show_notification: bool,
    pub show_percentage: bool,
    pub vibrate: bool,
    pub sound: bool,
    pub notification_id: i32,
    pub notification_icon: i32,
    pub channel_id: Option<String>,
    pub channel_name: Option<String>,
    /// Lets the user cancel from the progress notification.
    pub cancel_download: bool,

    pub re_download: bool,
    pub re_downloads: u32,

    pub install_apk: bool,
    pub authority: Option<String>,
    pub delete_cancel_file: bool,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            path: None,
            filename: None,
            version_code: None,
            checksum: None,
            request_properties: HashMap::new(),
            show_notification: true,
            show_percentage: true,
            vibrate: false,
            sound: false,
            notification_id: DEFAULT_NOTIFICATION_ID,
            notification_icon: 0,
            channel_id: None,
            channel_name: None,
            cancel_download: false,
            re_download: true,
            re_downloads: DEFAULT_RE_DOWNLOADS,
            install_apk: true,
            authority: None,
            delete_cancel_file: true,
        }
    }
}

impl UpdateConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, DownloadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, DownloadError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_version_code(mut self, version_code: i64) -> Self {
        self.version_code = Some(version_code);
        self
    }

    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    pub fn add_header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.request_properties.insert(key.into(), value.into());
        self
    }

    pub fn with_notification(mut self, show: bool) -> Self {
        self.show_notification = show;
        self
    }

    pub fn with_show_percentage(mut self, show: bool) -> Self {
        self.show_percentage = show;
        self
    }

    pub fn with_vibrate(mut self, vibrate: bool) -> Self {
        self.vibrate = vibrate;
        self
    }

    pub fn with_sound(mut self, sound: bool) -> Self {
        self.sound = sound;
        self
    }

    pub fn with_notification_id(mut self, id: i32) -> Self {
        self.notification_id = id;
        self
    }

    pub fn with_notification_icon(mut self, icon: i32) -> Self {
        self.notification_icon = icon;
        self
    }

    pub fn with_channel(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.channel_id = Some(id.into());
        self.channel_name = Some(name.into());
        self
    }

    pub fn with_cancel_download(mut self, cancelable: bool) -> Self {
        self.cancel_download = cancelable;
        self
    }

    pub fn with_re_download(mut self, enabled: bool, max_retries: u32) -> Self {
        self.re_download = enabled;
        self.re_downloads = max_retries;
        self
    }

    pub fn with_install_apk(mut self, install: bool) -> Self {
        self.install_apk = install;
        self
    }

    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = Some(authority.into());
        self
    }

    pub fn with_delete_cancel_file(mut self, delete: bool) -> Self {
        self.delete_cancel_file = delete;
        self
    }

    /// Configured directory, ignoring an empty path.
    pub fn explicit_path(&self) -> Option<&Path> {
        self.path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    pub fn explicit_filename(&self) -> Option<&str> {
        non_blank(&self.filename)
    }

    pub fn explicit_checksum(&self) -> Option<&str> {
        non_blank(&self.checksum)
    }

    /// Install authority, defaulting to `<package>.fileProvider`.
    pub fn resolve_authority(&self, package_name: &str) -> String {
        match non_blank(&self.authority) {
            Some(authority) => authority.to_string(),
            None => format!("{}{}", package_name, DEFAULT_FILE_PROVIDER),
        }
    }

    pub fn resolve_channel_id(&self) -> String {
        non_blank(&self.channel_id)
            .unwrap_or(DEFAULT_NOTIFICATION_CHANNEL_ID)
            .to_string()
    }

    pub fn resolve_channel_name(&self) -> String {
        non_blank(&self.channel_name)
            .unwrap_or(DEFAULT_NOTIFICATION_CHANNEL_NAME)
            .to_string()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
