use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::UpdateConfig;
use crate::downloader::naming::app_full_name;
use crate::downloader::transport::Transport;
use crate::installer::Installer;
use crate::notification::Notifier;
use crate::platform::{default_download_dir, AppContext};
use crate::session::callback::UpdateCallback;
use crate::session::listener::AttemptListener;
use crate::session::state::{SessionSnapshot, SessionState};
use crate::types::types::{DownloadError, TransferRequest};

/// Requests delivered to the service from outside (e.g. a notification tap).
#[derive(Debug, Clone)]
pub enum ServiceCommand {
    Start {
        config: Option<UpdateConfig>,
        /// Set when the user asked to retry after a failed download.
        redownload: bool,
    },
    Stop,
}

/// What `start` decided to do after inspecting the target file.
enum Plan {
    Cached(PathBuf),
    Transfer(TransferRequest),
}

/// Single-slot update download controller.
///
/// Accepts at most one session at a time. A session resolves its target
/// file, short-circuits on a valid cached artifact, and otherwise hands the
/// transfer to a `Transport` whose events are applied by an
/// `AttemptListener`. Results reach the caller only through
/// `UpdateCallback`.
pub struct UpdateService {
    context: Arc<dyn AppContext>,
    notifier: Arc<dyn Notifier>,
    installer: Arc<dyn Installer>,
    default_transport: Arc<dyn Transport>,
    state: Arc<Mutex<SessionState>>,
    active_transport: Mutex<Option<Arc<dyn Transport>>>,
    session_task: Mutex<Option<JoinHandle<()>>>,
}

impl UpdateService {
    pub fn new(
        context: Arc<dyn AppContext>,
        notifier: Arc<dyn Notifier>,
        installer: Arc<dyn Installer>,
        default_transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            context,
            notifier,
            installer,
            default_transport,
            state: Arc::new(Mutex::new(SessionState::new())),
            active_transport: Mutex::new(None),
            session_task: Mutex::new(None),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.with_state(|s| s.snapshot())
    }

    pub fn is_downloading(&self) -> bool {
        self.with_state(|s| s.is_downloading())
    }

    /// Whether a failure right now would still offer a re-download.
    pub fn retry_eligible(&self, config: &UpdateConfig) -> bool {
        self.with_state(|s| s.retry_eligible(config.re_download, config.re_downloads))
    }

    /// Begin a download session. `transport` defaults to the service's own.
    ///
    /// Rejected (with `on_downloading(true)`) while another session runs.
    pub async fn start(
        &self,
        config: &UpdateConfig,
        transport: Option<Arc<dyn Transport>>,
        callback: Option<Arc<dyn UpdateCallback>>,
    ) {
        self.start_session(config, transport, callback, false).await;
    }

    /// Explicit user retry after a failed session. Counts toward
    /// `config.re_downloads` when accepted.
    pub async fn redownload(
        &self,
        config: &UpdateConfig,
        transport: Option<Arc<dyn Transport>>,
        callback: Option<Arc<dyn UpdateCallback>>,
    ) {
        self.start_session(config, transport, callback, true).await;
    }

    pub async fn handle_command(&self, command: ServiceCommand) {
        match command {
            ServiceCommand::Stop => self.stop(),
            ServiceCommand::Start { config, redownload } => match config {
                Some(config) => self.start_session(&config, None, None, redownload).await,
                None => log::debug!("[UpdateService] start command without config ignored"),
            },
        }
    }

    /// Request cancellation of the running transfer. Does not wait; the
    /// transport reports `Cancelled` once it stops.
    pub fn stop(&self) {
        let guard = self
            .active_transport
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(transport) = guard.as_ref() {
            transport.cancel();
        }
    }

    /// Waits for the currently spawned session, if any, to terminate.
    pub async fn wait_idle(&self) {
        let handle = self
            .session_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                log::error!("[UpdateService] session task failed: {}", e);
            }
        }
    }

    /// Service teardown: cancels the running transfer, waits for its
    /// listener to finish, then frees the slot and drops the transport
    /// handle. Blocks for as long as the transport takes to honor `cancel`.
    pub async fn shutdown(&self) {
        self.stop();
        self.wait_idle().await;
        self.with_state(|s| s.release());
        let mut guard = self
            .active_transport
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = None;
    }

    async fn start_session(
        &self,
        config: &UpdateConfig,
        transport: Option<Arc<dyn Transport>>,
        callback: Option<Arc<dyn UpdateCallback>>,
        redownload: bool,
    ) {
        let claimed = self.with_state(|s| s.try_claim(redownload));
        if let Some(callback) = &callback {
            callback.on_downloading(!claimed).await;
        }
        if !claimed {
            log::warn!("[UpdateService] a download is already running, ignoring start");
            return;
        }

        match self.plan(config).await {
            Ok(Plan::Cached(file)) => {
                log::debug!("[UpdateService] cached artifact: {}", file.display());
                if config.install_apk {
                    let authority = config.resolve_authority(&self.context.package_name());
                    if let Err(e) = self.installer.install_apk(&file, &authority) {
                        log::warn!("[UpdateService] install of {} failed: {}", file.display(), e);
                    }
                }
                if let Some(callback) = &callback {
                    callback.on_finish(&file).await;
                }
                self.with_state(|s| s.finish());
            }
            Ok(Plan::Transfer(request)) => {
                log::debug!("[UpdateService] file: {}", request.target_file().display());
                self.spawn_transfer(config, request, transport, callback);
            }
            Err(e) => {
                log::error!("[UpdateService] could not prepare download: {}", e);
                self.with_state(|s| s.fail(false));
                if let Some(callback) = &callback {
                    callback.on_error(&e).await;
                }
            }
        }
    }

    /// Resolves the target file and decides between the cached artifact and
    /// a fresh transfer. Deletes a stale cached file.
    async fn plan(&self, config: &UpdateConfig) -> Result<Plan, DownloadError> {
        let directory = match config.explicit_path() {
            Some(path) => path.to_path_buf(),
            None => default_download_dir(self.context.as_ref())?,
        };
        tokio::fs::create_dir_all(&directory).await?;

        let filename = match config.explicit_filename() {
            Some(name) => name.to_string(),
            None => app_full_name(&config.url, &self.context.app_name())?,
        };

        let file = directory.join(&filename);
        self.with_state(|s| s.set_target(file.clone()));

        if tokio::fs::try_exists(&file).await.unwrap_or(false) {
            if self.cached_artifact_valid(config, &file).await {
                return Ok(Plan::Cached(file));
            }
            if let Err(e) = tokio::fs::remove_file(&file).await {
                log::warn!("[UpdateService] could not remove stale {}: {}", file.display(), e);
            }
        }

        Ok(Plan::Transfer(TransferRequest {
            url: config.url.clone(),
            directory,
            filename,
            headers: config.request_properties.clone(),
        }))
    }

    /// Checksum wins when configured; otherwise the version code is probed.
    /// Probe failures count as "not valid".
    async fn cached_artifact_valid(&self, config: &UpdateConfig, file: &Path) -> bool {
        let installer = Arc::clone(&self.installer);
        let checksum = config.explicit_checksum().map(str::to_string);
        let version_code = config.version_code;
        let file = file.to_path_buf();

        let probe = tokio::task::spawn_blocking(move || {
            if let Some(expected) = checksum {
                log::debug!("[UpdateService] checksum: {}", expected);
                return installer.check_file_checksum(&file, &expected);
            }
            if let Some(version_code) = version_code {
                log::debug!("[UpdateService] version code: {}", version_code);
                return match installer.apk_version_matches(version_code, &file) {
                    Ok(matches) => matches,
                    Err(e) => {
                        log::warn!("[UpdateService] version probe failed: {}", e);
                        false
                    }
                };
            }
            false
        })
        .await;

        probe.unwrap_or_else(|e| {
            log::warn!("[UpdateService] validation task failed: {}", e);
            false
        })
    }

    fn spawn_transfer(
        &self,
        config: &UpdateConfig,
        request: TransferRequest,
        transport: Option<Arc<dyn Transport>>,
        callback: Option<Arc<dyn UpdateCallback>>,
    ) {
        let transport = transport.unwrap_or_else(|| Arc::clone(&self.default_transport));
        transport.prepare();
        {
            let mut guard = self
                .active_transport
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *guard = Some(Arc::clone(&transport));
        }

        let listener = AttemptListener::new(
            config,
            self.context.as_ref(),
            Arc::clone(&self.state),
            Arc::clone(&self.notifier),
            Arc::clone(&self.installer),
            callback,
        );

        let handle = tokio::spawn(async move {
            let (events_tx, events_rx) = mpsc::channel(256);
            // The transport owns the only sender, so the listener sees the
            // channel close once the transfer returns.
            tokio::join!(transport.download(request, events_tx), listener.run(events_rx));
        });

        let mut guard = self
            .session_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(handle);
    }
}
