use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::downloader::transport::Transport;
use crate::types::types::{DownloadError, TransferEvent, TransferRequest};

/// reqwest-backed transport that streams the response body straight into
/// the target file.
pub struct HttpTransport {
    client: Client,
    cancel_token: Mutex<CancellationToken>,
}

enum Outcome {
    Done,
    Cancelled,
}

impl HttpTransport {
    pub fn new() -> Result<Self, DownloadError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .tcp_nodelay(true)
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            cancel_token: Mutex::new(CancellationToken::new()),
        }
    }

    /// Handle to the token of the current attempt.
    fn current_token(&self) -> CancellationToken {
        self.cancel_token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn transfer(
        &self,
        request: &TransferRequest,
        cancel_token: &CancellationToken,
        events: &mpsc::Sender<TransferEvent>,
    ) -> Result<Outcome, DownloadError> {
        let builder = apply_headers(self.client.get(&request.url), &request.headers);

        let response = tokio::select! {
            _ = cancel_token.cancelled() => return Ok(Outcome::Cancelled),
            response = builder.send() => response?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus(status.as_u16()));
        }
        let bytes_total = response.content_length().unwrap_or(0);
        log::info!(
            "[HttpTransport] {}: status={}, content_length={}",
            request.url, status, bytes_total
        );

        tokio::fs::create_dir_all(&request.directory).await?;
        let file = tokio::fs::File::create(request.target_file()).await?;
        let mut writer = tokio::io::BufWriter::with_capacity(256 * 1024, file);

        let mut stream = response.bytes_stream();
        let mut bytes_done: u64 = 0;

        loop {
            let next = tokio::select! {
                _ = cancel_token.cancelled() => {
                    let _ = writer.flush().await;
                    return Ok(Outcome::Cancelled);
                }
                next = stream.next() => next,
            };

            let Some(chunk) = next else { break };
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            bytes_done += chunk.len() as u64;

            let _ = events
                .send(TransferEvent::Progress {
                    bytes_done,
                    bytes_total,
                })
                .await;
        }

        writer.flush().await?;
        log::debug!("[HttpTransport] {}: wrote {} bytes", request.url, bytes_done);
        Ok(Outcome::Done)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn download(&self, request: TransferRequest, events: mpsc::Sender<TransferEvent>) {
        let cancel_token = self.current_token();

        let _ = events
            .send(TransferEvent::Started {
                url: request.url.clone(),
            })
            .await;

        let terminal = match self.transfer(&request, &cancel_token, &events).await {
            Ok(Outcome::Done) => TransferEvent::Finished {
                file: request.target_file(),
            },
            Ok(Outcome::Cancelled) => TransferEvent::Cancelled,
            Err(e) => {
                log::warn!("[HttpTransport] {}: {}", request.url, e);
                TransferEvent::Errored(e)
            }
        };

        let _ = events.send(terminal).await;
    }

    fn prepare(&self) {
        let mut guard = self
            .cancel_token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = CancellationToken::new();
    }

    fn cancel(&self) {
        self.cancel_token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .cancel();
    }
}

/// Applies caller-supplied request properties to a request builder.
fn apply_headers(
    mut builder: reqwest::RequestBuilder,
    headers: &HashMap<String, String>,
) -> reqwest::RequestBuilder {
    for (key, value) in headers {
        builder = builder.header(key, value);
    }
    builder
}
