use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Disk error: {0}")]
    Disk(#[from] std::io::Error),

    #[error("Server responded with HTTP {0}")]
    HttpStatus(u16),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Download cancelled")]
    Cancelled,

    #[error("Transport ended without reporting a result")]
    Interrupted,

    #[error("Install failed: {0}")]
    Install(String),

    #[error("Unsupported on this platform: {0}")]
    Unsupported(String),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Everything a transport needs to fetch one artifact.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub url: String,
    pub directory: PathBuf,
    pub filename: String,
    pub headers: HashMap<String, String>,
}

impl TransferRequest {
    pub fn target_file(&self) -> PathBuf {
        self.directory.join(&self.filename)
    }
}

/// Lifecycle events a transport reports for a single attempt.
///
/// `Finished`, `Errored` and `Cancelled` are terminal; exactly one of them
/// ends an attempt.
#[derive(Debug)]
pub enum TransferEvent {
    Started { url: String },
    Progress { bytes_done: u64, bytes_total: u64 },
    Finished { file: PathBuf },
    Errored(DownloadError),
    Cancelled,
}

impl TransferEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferEvent::Finished { .. } | TransferEvent::Errored(_) | TransferEvent::Cancelled
        )
    }
}
