//! Update orchestration
//!
//! [`UpdateController`] runs the whole update on one worker task:
//!
//! 1. Fetch the remote version for display (failure is only logged)
//! 2. Resolve the shortcut name once and remove the stale shortcut
//! 3. Wipe the destination, keeping the protected directory
//! 4. Download the archive into the destination (cancellable)
//! 5. Validate and extract the archive
//! 6. Fetch the version again and write the version marker
//! 7. Create the new shortcut (failure is only logged)
//!
//! Progress leaves the worker only as [`UpdateEvent`]s on a single queue,
//! which the caller drains through the returned [`UpdateHandle`].
//!
//! # Example
//!
//! ```no_run
//! use appupdater::{UpdateController, UpdateEvent, UpdateJob};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let job = UpdateJob::builder()
//!         .source_url("https://example.com/app.zip")
//!         .destination("/opt/app")
//!         .main_executable("app")
//!         .version_url("https://example.com/version.txt")
//!         .shortcut_name_url("https://example.com/name.txt")
//!         .build()?;
//!
//!     let mut handle = UpdateController::from_default_config(job)?.start();
//!     while let Some(event) = handle.next_event().await {
//!         if let UpdateEvent::StatusChanged(status) = event {
//!             println!("{}", status);
//!         }
//!     }
//!
//!     let report = handle.join().await?;
//!     println!("Finished: {}", report.state);
//!     Ok(())
//! }
//! ```

use appupdater_core::{HierarchicalConfigLoader, RuntimeConfig, UpdateJob};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::download::{DownloadOutcome, Downloader};
use crate::error::{Result, ShortcutError, UpdateError};
use crate::events::{InstallationState, UpdateEvent};
use crate::install::InstallationManager;
use crate::shortcut::ShortcutManager;
use crate::version::VersionClient;

const STATUS_IN_PROGRESS: &str = "Update in progress...";
const STATUS_DOWNLOADING: &str = "Downloading update...";
const STATUS_EXTRACTING: &str = "Installing update...";
const STATUS_CANCELLED: &str = "Update cancelled.";
const STATUS_COMPLETED: &str = "Update complete.";

/// Orchestrates one update run
pub struct UpdateController {
    job: Arc<UpdateJob>,
    versions: VersionClient,
    downloader: Downloader,
    installer: InstallationManager,
    shortcuts: ShortcutManager,
}

impl UpdateController {
    /// Create a controller from explicit runtime settings
    pub fn new(job: UpdateJob, config: &RuntimeConfig) -> Result<Self> {
        Ok(Self {
            job: Arc::new(job),
            versions: VersionClient::new(&config.network)?,
            downloader: Downloader::new(&config.network)?,
            installer: InstallationManager::new(config.install.clone()),
            shortcuts: ShortcutManager::new(),
        })
    }

    /// Create a controller with settings from [`HierarchicalConfigLoader`]
    pub fn from_default_config(job: UpdateJob) -> Result<Self> {
        let config = HierarchicalConfigLoader::new()?.load_runtime_config()?;
        Self::new(job, &config)
    }

    /// Replace the shortcut manager
    pub fn with_shortcut_manager(mut self, shortcuts: ShortcutManager) -> Self {
        self.shortcuts = shortcuts;
        self
    }

    /// Replace the downloader
    pub fn with_downloader(mut self, downloader: Downloader) -> Self {
        self.downloader = downloader;
        self
    }

    pub fn job(&self) -> &UpdateJob {
        &self.job
    }

    /// Spawn the worker task
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(self) -> UpdateHandle {
        let (events, receiver) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let gate = Arc::new(CancelGate::default());

        let worker = Worker {
            controller: self,
            events,
            cancel: cancel.clone(),
            gate: Arc::clone(&gate),
            state: InstallationState::Idle,
        };

        UpdateHandle {
            cancel,
            gate,
            events: receiver,
            worker: tokio::spawn(worker.run()),
        }
    }
}

/// Caller-side handle to a running update
pub struct UpdateHandle {
    cancel: CancellationToken,
    gate: Arc<CancelGate>,
    events: UnboundedReceiver<UpdateEvent>,
    worker: JoinHandle<UpdateReport>,
}

impl UpdateHandle {
    /// Request cancellation
    ///
    /// Requests are accepted until the download ends; an accepted request ends
    /// the run as cancelled unless it fails first. Afterwards this returns
    /// false and does nothing.
    pub fn cancel(&self) -> bool {
        if !self.gate.request() {
            debug!("Cancellation ignored: download already over");
            return false;
        }
        info!("Cancellation requested");
        self.cancel.cancel();
        true
    }

    /// Whether a cancellation request would still be accepted
    pub fn is_cancellable(&self) -> bool {
        self.gate.is_accepting()
    }

    /// Wait for the next event; `None` once the worker is done and the queue
    /// is drained
    pub async fn next_event(&mut self) -> Option<UpdateEvent> {
        self.events.recv().await
    }

    /// Take an event if one is queued
    pub fn try_next_event(&mut self) -> Option<UpdateEvent> {
        self.events.try_recv().ok()
    }

    /// Wait for the worker to finish
    pub async fn join(self) -> Result<UpdateReport> {
        self.worker
            .await
            .map_err(|e| UpdateError::Unexpected(format!("Update worker stopped: {}", e)))
    }
}

/// Final outcome of an update run
#[derive(Debug)]
pub struct UpdateReport {
    /// Terminal state: Completed, Cancelled, or Failed
    pub state: InstallationState,

    /// Version written to the marker
    pub version: Option<String>,

    /// Shortcut created for the new installation
    pub shortcut: Option<PathBuf>,

    /// Error that failed the run
    pub error: Option<UpdateError>,
}

impl UpdateReport {
    fn new(state: InstallationState) -> Self {
        Self {
            state,
            version: None,
            shortcut: None,
            error: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state == InstallationState::Completed
    }
}

const GATE_OPEN: u8 = 0;
const GATE_REQUESTED: u8 = 1;
const GATE_CLOSED: u8 = 2;

/// Whether cancellation requests are still accepted
///
/// The handle records requests and the worker closes the gate when the
/// download ends. Both sides go through one atomic, so a request that was
/// accepted is always seen by `close`.
#[derive(Debug, Default)]
struct CancelGate(AtomicU8);

impl CancelGate {
    /// Record a request; false once the gate is closed
    fn request(&self) -> bool {
        match self
            .0
            .compare_exchange(GATE_OPEN, GATE_REQUESTED, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => true,
            Err(current) => current == GATE_REQUESTED,
        }
    }

    /// Stop accepting requests; returns whether one was accepted before
    fn close(&self) -> bool {
        self.0.swap(GATE_CLOSED, Ordering::SeqCst) == GATE_REQUESTED
    }

    fn is_accepting(&self) -> bool {
        self.0.load(Ordering::SeqCst) != GATE_CLOSED
    }
}

struct Worker {
    controller: UpdateController,
    events: UnboundedSender<UpdateEvent>,
    cancel: CancellationToken,
    gate: Arc<CancelGate>,
    state: InstallationState,
}

impl Worker {
    async fn run(mut self) -> UpdateReport {
        match self.execute().await {
            Ok(report) => report,
            Err(err) => {
                self.gate.close();
                error!("Update failed: {} ({:?})", err, err);

                let failed = InstallationState::Failed(err.to_string());
                self.transition(failed.clone());
                self.status(err.status_message());

                UpdateReport {
                    error: Some(err),
                    ..UpdateReport::new(failed)
                }
            }
        }
    }

    async fn execute(&mut self) -> Result<UpdateReport> {
        let job = Arc::clone(&self.controller.job);
        let dest = job.destination().to_path_buf();

        self.transition(InstallationState::Preparing);
        self.status(STATUS_IN_PROGRESS);

        match self.controller.versions.fetch_version(job.version_url()).await {
            Ok(version) => self.emit(UpdateEvent::VersionResolved(version)),
            Err(e) => warn!("Version lookup failed: {}", e),
        }

        let shortcut_name = self.resolve_shortcut_name(job.shortcut_name_url()).await;
        if let Some(name) = &shortcut_name {
            if let Err(e) = self.controller.shortcuts.delete_shortcut(name) {
                warn!("Failed to delete shortcut: {}", e);
            }
        }

        let installer = self.controller.installer.clone();
        let prepare_dest = dest.clone();
        run_blocking(move || installer.prepare_destination(&prepare_dest)).await?;

        self.transition(InstallationState::Downloading);
        self.status(STATUS_DOWNLOADING);

        let archive = self.controller.installer.archive_path(&dest);
        let events = self.events.clone();
        let outcome = self
            .controller
            .downloader
            .download(
                job.source_url(),
                &archive,
                |progress| {
                    let _ = events.send(UpdateEvent::ProgressUpdated(progress));
                },
                &self.cancel,
            )
            .await?;

        // Past this point cancellation requests are refused
        let requested = self.gate.close();
        match outcome {
            DownloadOutcome::Cancelled { .. } => return Ok(self.cancelled()),
            DownloadOutcome::Completed { .. } if requested => {
                // Accepted after the last chunk was checked
                info!("Cancellation accepted after download, removing {}", dest.display());
                let dir = dest.clone();
                run_blocking(move || {
                    fs::remove_dir_all(&dir).map_err(|e| {
                        UpdateError::io(format!("Failed to remove {}", dir.display()), e)
                    })
                })
                .await?;
                return Ok(self.cancelled());
            }
            DownloadOutcome::Completed { .. } => {}
        }

        self.transition(InstallationState::Extracting);
        self.status(STATUS_EXTRACTING);

        let installer = self.controller.installer.clone();
        let extract_dest = dest.clone();
        run_blocking(move || {
            installer.validate_archive(&archive)?;
            installer.extract_archive(&archive, &extract_dest)
        })
        .await?;

        self.transition(InstallationState::WritingVersion);
        let version = self.controller.versions.fetch_version(job.version_url()).await?;
        let installer = self.controller.installer.clone();
        let marker_dest = dest.clone();
        let marker_version = version.clone();
        run_blocking(move || installer.write_version_marker(&marker_dest, &marker_version))
            .await?;

        self.transition(InstallationState::CreatingShortcut);
        let shortcut = shortcut_name.and_then(|name| {
            self.controller
                .shortcuts
                .create_shortcut(&name, &job.executable_path(), &dest)
                .map_err(|e| warn!("Failed to create shortcut: {}", e))
                .ok()
        });

        self.transition(InstallationState::Completed);
        self.status(STATUS_COMPLETED);

        Ok(UpdateReport {
            version: Some(version),
            shortcut,
            ..UpdateReport::new(InstallationState::Completed)
        })
    }

    fn cancelled(&mut self) -> UpdateReport {
        self.transition(InstallationState::Cancelled);
        self.status(STATUS_CANCELLED);
        UpdateReport::new(InstallationState::Cancelled)
    }

    /// Fetch the shortcut name once for both deletion and creation
    async fn resolve_shortcut_name(&self, url: &str) -> Option<String> {
        match self.controller.versions.fetch_shortcut_name(url).await {
            Ok(name) => Some(name),
            Err(e) => {
                let err = ShortcutError::Network(Box::new(e));
                warn!("Shortcut steps skipped: {}", err);
                None
            }
        }
    }

    fn transition(&mut self, next: InstallationState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        info!("Update step: {} -> {}", self.state, next);
        self.state = next.clone();
        self.emit(UpdateEvent::StepTransitioned(next));
    }

    fn status(&self, message: impl Into<String>) {
        self.emit(UpdateEvent::StatusChanged(message.into()));
    }

    fn emit(&self, event: UpdateEvent) {
        // The presentation side may have gone away; the run continues regardless
        let _ = self.events.send(event);
    }
}

/// Run a blocking, uninterruptible filesystem step off the async workers
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| UpdateError::Unexpected(format!("Blocking task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_completion() {
        assert!(UpdateReport::new(InstallationState::Completed).is_completed());
        assert!(!UpdateReport::new(InstallationState::Cancelled).is_completed());
    }

    #[test]
    fn test_cancel_gate_request_then_close() {
        let gate = CancelGate::default();
        assert!(gate.is_accepting());
        assert!(gate.request());
        assert!(gate.request());
        assert!(gate.is_accepting());

        assert!(gate.close());
        assert!(!gate.is_accepting());
        assert!(!gate.request());
    }

    #[test]
    fn test_cancel_gate_refuses_after_close() {
        let gate = CancelGate::default();
        assert!(!gate.close());
        assert!(!gate.request());
        assert!(!gate.is_accepting());
        assert!(!gate.close());
    }

    #[tokio::test]
    async fn test_run_blocking_propagates_errors() {
        let result: Result<()> =
            run_blocking(|| Err(UpdateError::Unexpected("boom".to_string()))).await;
        assert!(matches!(result, Err(UpdateError::Unexpected(ref m)) if m == "boom"));
    }
}
