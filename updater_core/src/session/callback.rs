use std::path::Path;

use async_trait::async_trait;

use crate::types::types::DownloadError;

/// Caller-facing view of an update session.
///
/// Every method has an empty default so callers only implement what they
/// display. Methods for one attempt are called in order from a single task.
#[async_trait]
pub trait UpdateCallback: Send + Sync + 'static {
    /// First call of every `start`. `already_active` is `true` when the
    /// request was rejected because another session is running.
    async fn on_downloading(&self, _already_active: bool) {}

    async fn on_start(&self, _url: &str) {}

    /// Called for every transport progress event. `changed` is `true` only
    /// for updates that passed the rate limit.
    async fn on_progress(&self, _bytes_done: u64, _bytes_total: u64, _changed: bool) {}

    async fn on_finish(&self, _file: &Path) {}

    async fn on_error(&self, _error: &DownloadError) {}

    async fn on_cancel(&self) {}
}
