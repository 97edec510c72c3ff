use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

/// Minimum spacing between two progress recomputations.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

/// Sentinel for "no progress reported yet".
const UNSET_PROGRESS: i32 = -1;

/// Session bookkeeping owned by one `UpdateService`. Every mutation goes
/// through one of the transition methods below.
#[derive(Debug)]
pub struct SessionState {
    is_downloading: bool,
    last_progress: i32,
    last_progress_at: Option<Instant>,
    retry_count: u32,
    retry_offered: bool,
    target_file: Option<PathBuf>,
}

/// Read-only copy of `SessionState` for callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub is_downloading: bool,
    pub last_progress: i32,
    pub retry_count: u32,
    /// Whether the last failure offered a re-download.
    pub retry_offered: bool,
    pub target_file: Option<PathBuf>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            is_downloading: false,
            last_progress: UNSET_PROGRESS,
            last_progress_at: None,
            retry_count: 0,
            retry_offered: false,
            target_file: None,
        }
    }

    pub fn is_downloading(&self) -> bool {
        self.is_downloading
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn target_file(&self) -> Option<&PathBuf> {
        self.target_file.as_ref()
    }

    /// Takes the single session slot. Returns `false` when a session is
    /// already running; nothing changes in that case. An accepted claim
    /// clears the previous attempt's progress tracking, and an accepted
    /// explicit re-download bumps the retry counter.
    pub fn try_claim(&mut self, redownload: bool) -> bool {
        if self.is_downloading {
            return false;
        }
        self.is_downloading = true;
        self.retry_offered = false;
        self.last_progress = UNSET_PROGRESS;
        self.last_progress_at = None;
        if redownload {
            self.retry_count += 1;
        }
        true
    }

    pub fn set_target(&mut self, file: PathBuf) {
        self.target_file = Some(file);
    }

    /// Transport reported `Started`.
    pub fn begin_transfer(&mut self) {
        self.is_downloading = true;
        self.last_progress = 0;
        self.last_progress_at = None;
    }

    /// Applies the progress rate limit. Returns the new percentage when the
    /// update should be surfaced, `None` when it is suppressed.
    ///
    /// An update qualifies only if `PROGRESS_INTERVAL` has passed since the
    /// last qualifying check and the rounded percentage moved.
    pub fn record_progress(&mut self, bytes_done: u64, bytes_total: u64, now: Instant) -> Option<u8> {
        if let Some(last) = self.last_progress_at {
            if now.saturating_duration_since(last) < PROGRESS_INTERVAL {
                return None;
            }
        }
        self.last_progress_at = Some(now);

        let current = percentage(bytes_done, bytes_total);
        if i32::from(current) == self.last_progress {
            return None;
        }
        self.last_progress = i32::from(current);
        Some(current)
    }

    /// Download completed, or a valid cached artifact was found.
    pub fn finish(&mut self) {
        self.is_downloading = false;
        self.retry_count = 0;
    }

    /// Transfer failed. The retry counter survives only while a re-download
    /// is still allowed.
    pub fn fail(&mut self, retry_eligible: bool) {
        self.is_downloading = false;
        self.retry_offered = retry_eligible;
        if !retry_eligible {
            self.retry_count = 0;
        }
    }

    /// Transfer cancelled. Returns the file the session was writing.
    pub fn cancel(&mut self) -> Option<PathBuf> {
        self.is_downloading = false;
        self.retry_count = 0;
        self.target_file.clone()
    }

    /// Service teardown.
    pub fn release(&mut self) {
        self.is_downloading = false;
    }

    pub fn retry_eligible(&self, re_download: bool, max_retries: u32) -> bool {
        re_download && self.retry_count < max_retries
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            is_downloading: self.is_downloading,
            last_progress: self.last_progress,
            retry_count: self.retry_count,
            retry_offered: self.retry_offered,
            target_file: self.target_file.clone(),
        }
    }
}

/// Rounded completion percentage; an unknown (zero) total counts as 0%.
pub fn percentage(bytes_done: u64, bytes_total: u64) -> u8 {
    if bytes_total == 0 {
        return 0;
    }
    let pct = (bytes_done as f64 / bytes_total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}
