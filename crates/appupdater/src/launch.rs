//! Launching the freshly installed application

use appupdater_core::UpdateJob;
use std::io;
use std::process::{Command, Stdio};
use tracing::{info, warn};

use crate::controller::UpdateReport;
use crate::error::{Result, UpdateError};

/// What to do once an update has completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchChoice {
    /// Start the installed main executable
    Launch,

    /// End the run without launching
    Exit,
}

/// Apply the caller's choice after a run
///
/// Returns the process id when the application was launched. Nothing is
/// launched for runs that did not complete.
pub fn finish(report: &UpdateReport, job: &UpdateJob, choice: LaunchChoice) -> Result<Option<u32>> {
    if !report.is_completed() {
        warn!("Not launching: update ended as {}", report.state);
        return Ok(None);
    }

    match choice {
        LaunchChoice::Launch => launch_application(job).map(Some),
        LaunchChoice::Exit => {
            info!("Update finished without launching the application");
            Ok(None)
        }
    }
}

/// Spawn the main executable as an independent process
///
/// No arguments are passed and the exit code is never observed; the working
/// directory is the installation directory.
pub fn launch_application(job: &UpdateJob) -> Result<u32> {
    let path = job.executable_path();
    if !path.is_file() {
        return Err(UpdateError::MissingExecutable { path });
    }

    let mut command = Command::new(&path);
    command
        .current_dir(job.destination())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        command.creation_flags(DETACHED_PROCESS);
    }

    let child = command.spawn().map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => UpdateError::MissingExecutable { path: path.clone() },
        _ => UpdateError::io(format!("Failed to launch {}", path.display()), e),
    })?;

    info!("Launched {} (pid {})", path.display(), child.id());
    Ok(child.id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::InstallationState;
    use tempfile::TempDir;

    fn job_in(dest: &std::path::Path, executable: &str) -> UpdateJob {
        UpdateJob::builder()
            .source_url("http://localhost/app.zip")
            .destination(dest)
            .main_executable(executable)
            .version_url("http://localhost/version.txt")
            .shortcut_name_url("http://localhost/name.txt")
            .build()
            .unwrap()
    }

    fn completed() -> UpdateReport {
        UpdateReport {
            state: InstallationState::Completed,
            version: Some("1.0.0".to_string()),
            shortcut: None,
            error: None,
        }
    }

    #[test]
    fn test_launch_missing_executable() {
        let temp = TempDir::new().unwrap();
        let job = job_in(temp.path(), "app.exe");

        let err = launch_application(&job).unwrap_err();
        assert!(matches!(err, UpdateError::MissingExecutable { .. }));
        assert_eq!(err.status_message(), format!("Not found: {}", job.executable_path().display()));
    }

    #[test]
    fn test_finish_exit_does_not_launch() {
        let temp = TempDir::new().unwrap();
        let job = job_in(temp.path(), "app.exe");

        assert_eq!(finish(&completed(), &job, LaunchChoice::Exit).unwrap(), None);
    }

    #[test]
    fn test_finish_skips_incomplete_runs() {
        let temp = TempDir::new().unwrap();
        let job = job_in(temp.path(), "app.exe");
        let report = UpdateReport {
            state: InstallationState::Cancelled,
            version: None,
            shortcut: None,
            error: None,
        };

        assert_eq!(finish(&report, &job, LaunchChoice::Launch).unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_launch_spawns_process() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let script = temp.path().join("app.sh");
        fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let job = job_in(temp.path(), "app.sh");
        let pid = finish(&completed(), &job, LaunchChoice::Launch).unwrap();
        assert!(pid.is_some_and(|pid| pid > 0));
    }
}
