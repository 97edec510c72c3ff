use std::path::PathBuf;

use crate::config::DEFAULT_DIR;
use crate::types::types::DownloadError;

/// Host facts the service needs but cannot derive itself: app-scoped
/// storage, identity, and notification capabilities.
pub trait AppContext: Send + Sync {
    /// App-scoped external directories for `kind`, most preferred first.
    fn external_files_dirs(&self, kind: &str) -> Vec<PathBuf>;

    /// The primary external directory for `kind`, if storage is mounted.
    fn primary_external_files_dir(&self, kind: &str) -> Option<PathBuf>;

    /// Display name, used to name downloads when the URL gives no filename.
    fn app_name(&self) -> String;

    fn package_name(&self) -> String;

    /// Icon resource used when the config carries none.
    fn app_icon(&self) -> i32;

    fn supports_notification_channels(&self) -> bool;
}

/// First enumerated storage directory, else the primary one.
pub fn default_download_dir(context: &dyn AppContext) -> Result<PathBuf, DownloadError> {
    if let Some(dir) = context.external_files_dirs(DEFAULT_DIR).into_iter().next() {
        return Ok(dir);
    }
    context
        .primary_external_files_dir(DEFAULT_DIR)
        .ok_or_else(|| DownloadError::Unsupported("no external storage directory".to_string()))
}
