//! Helpers for driving the update controller in tests

use appupdater::{
    InstallationState, RuntimeConfig, ShortcutManager, UpdateController, UpdateEvent,
    UpdateHandle, UpdateJob,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use wiremock::MockServer;

use appupdater::shortcut::DesktopEntryWriter;

use super::constants::*;
use super::mock_server::url_for;

/// Upper bound for any single wait in the controller tests
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Job pointing every URL at `server`
pub fn job_for(server: &MockServer, dest: &Path) -> UpdateJob {
    job_with_source(server, &url_for(server, ARCHIVE_PATH), dest)
}

/// Job with a custom archive URL and metadata on `server`
pub fn job_with_source(server: &MockServer, source_url: &str, dest: &Path) -> UpdateJob {
    UpdateJob::builder()
        .source_url(source_url)
        .destination(dest)
        .main_executable(MAIN_EXECUTABLE)
        .version_url(url_for(server, VERSION_PATH))
        .shortcut_name_url(url_for(server, SHORTCUT_NAME_PATH))
        .build()
        .unwrap()
}

/// Shortcut manager writing `.desktop` entries into `desktop`
pub fn test_shortcuts(desktop: &Path) -> ShortcutManager {
    ShortcutManager::new()
        .with_desktop_dir(desktop)
        .with_writer(Arc::new(DesktopEntryWriter))
}

/// Controller with default settings and a sandboxed desktop
pub fn test_controller(job: UpdateJob, desktop: &Path) -> UpdateController {
    UpdateController::new(job, &RuntimeConfig::default())
        .unwrap()
        .with_shortcut_manager(test_shortcuts(desktop))
}

/// Drain every event until the worker closes the queue
pub async fn collect_events(handle: &mut UpdateHandle) -> Vec<UpdateEvent> {
    let mut events = Vec::new();
    loop {
        match tokio::time::timeout(EVENT_TIMEOUT, handle.next_event()).await {
            Ok(Some(event)) => events.push(event),
            Ok(None) => break,
            Err(_) => panic!("timed out waiting for update events"),
        }
    }
    events
}

/// States from the step transitions, in order
pub fn steps(events: &[UpdateEvent]) -> Vec<InstallationState> {
    events
        .iter()
        .filter_map(|e| match e {
            UpdateEvent::StepTransitioned(state) => Some(state.clone()),
            _ => None,
        })
        .collect()
}

/// Status messages, in order
pub fn statuses(events: &[UpdateEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            UpdateEvent::StatusChanged(message) => Some(message.clone()),
            _ => None,
        })
        .collect()
}

/// Completed fractions from the progress events, in order
pub fn fractions(events: &[UpdateEvent]) -> Vec<f64> {
    events
        .iter()
        .filter_map(|e| match e {
            UpdateEvent::ProgressUpdated(progress) => progress.fraction(),
            _ => None,
        })
        .collect()
}
