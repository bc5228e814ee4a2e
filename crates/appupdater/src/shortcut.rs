//! Desktop shortcut management
//!
//! Shortcuts live directly on the user's desktop and are named after a
//! display name fetched from the update server. The link format depends on
//! the platform:
//! - Linux and other Unix desktops: XDG `.desktop` entry
//! - macOS: executable `.command` script
//! - Windows: `.url` internet shortcut pointing at the executable; a `.lnk`
//!   with the same name is removed on deletion
//!
//! Every operation returns a [`ShortcutResult`]; callers treat failures as
//! non-fatal.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{ShortcutError, ShortcutResult};

/// Everything needed to write one shortcut
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutDescriptor {
    /// Name shown on the desktop (without extension)
    pub display_name: String,

    /// Executable the shortcut launches
    pub target: PathBuf,

    /// Working directory for the launched process
    pub working_dir: PathBuf,

    /// Location of the link file
    pub link_path: PathBuf,
}

/// Renders a [`ShortcutDescriptor`] into a platform link file
pub trait LinkWriter: fmt::Debug + Send + Sync {
    /// File extension of the link, without the dot
    fn extension(&self) -> &'static str;

    /// File content for the link
    fn render(&self, descriptor: &ShortcutDescriptor) -> String;

    /// Whether the link file needs the executable bit
    fn executable(&self) -> bool {
        false
    }

    /// Other link extensions that may name the same shortcut
    ///
    /// Links with these extensions are removed along with the current one so
    /// that a single shortcut per name survives an update.
    fn legacy_extensions(&self) -> &'static [&'static str] {
        &[]
    }
}

/// XDG desktop entry (`.desktop`)
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopEntryWriter;

impl LinkWriter for DesktopEntryWriter {
    fn extension(&self) -> &'static str {
        "desktop"
    }

    fn render(&self, descriptor: &ShortcutDescriptor) -> String {
        format!(
            "[Desktop Entry]\n\
             Type=Application\n\
             Version=1.0\n\
             Name={}\n\
             Exec={}\n\
             Path={}\n\
             Terminal=false\n",
            descriptor.display_name,
            quote(&descriptor.target),
            descriptor.working_dir.display()
        )
    }

    // GNOME refuses to launch desktop entries that are not executable
    fn executable(&self) -> bool {
        true
    }
}

/// macOS double-clickable shell script (`.command`)
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandScriptWriter;

impl LinkWriter for CommandScriptWriter {
    fn extension(&self) -> &'static str {
        "command"
    }

    fn render(&self, descriptor: &ShortcutDescriptor) -> String {
        format!(
            "#!/bin/sh\ncd {} && exec {}\n",
            quote(&descriptor.working_dir),
            quote(&descriptor.target)
        )
    }

    fn executable(&self) -> bool {
        true
    }
}

/// Windows internet shortcut (`.url`)
#[derive(Debug, Default, Clone, Copy)]
pub struct InternetShortcutWriter;

impl LinkWriter for InternetShortcutWriter {
    fn extension(&self) -> &'static str {
        "url"
    }

    fn render(&self, descriptor: &ShortcutDescriptor) -> String {
        format!(
            "[InternetShortcut]\r\nURL={}\r\nWorkingDirectory={}\r\n",
            file_url(&descriptor.target),
            descriptor.working_dir.display()
        )
    }

    // Shell links written by earlier installers
    fn legacy_extensions(&self) -> &'static [&'static str] {
        &["lnk"]
    }
}

/// Link writer for the platform this binary was built for
pub fn platform_writer() -> Arc<dyn LinkWriter> {
    if cfg!(windows) {
        Arc::new(InternetShortcutWriter)
    } else if cfg!(target_os = "macos") {
        Arc::new(CommandScriptWriter)
    } else {
        Arc::new(DesktopEntryWriter)
    }
}

/// Deletes and creates the application's desktop shortcut
#[derive(Debug, Clone)]
pub struct ShortcutManager {
    desktop_dir: Option<PathBuf>,
    writer: Arc<dyn LinkWriter>,
}

impl ShortcutManager {
    /// Use the current user's desktop and the platform link format
    pub fn new() -> Self {
        Self {
            desktop_dir: resolve_desktop_dir(),
            writer: platform_writer(),
        }
    }

    /// Override the desktop directory
    pub fn with_desktop_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.desktop_dir = Some(dir.into());
        self
    }

    /// Override the link format
    pub fn with_writer(mut self, writer: Arc<dyn LinkWriter>) -> Self {
        self.writer = writer;
        self
    }

    pub fn desktop_dir(&self) -> Option<&Path> {
        self.desktop_dir.as_deref()
    }

    /// Path of the shortcut for `display_name`
    pub fn shortcut_path(&self, display_name: &str) -> ShortcutResult<PathBuf> {
        let name = validate_name(display_name)?;
        let desktop = self.desktop_dir.as_ref().ok_or(ShortcutError::NoDesktop)?;
        Ok(desktop.join(format!("{}.{}", name, self.writer.extension())))
    }

    /// Build the descriptor for a shortcut
    pub fn describe(
        &self,
        display_name: &str,
        target: &Path,
        working_dir: &Path,
    ) -> ShortcutResult<ShortcutDescriptor> {
        Ok(ShortcutDescriptor {
            display_name: validate_name(display_name)?.to_string(),
            target: target.to_path_buf(),
            working_dir: working_dir.to_path_buf(),
            link_path: self.shortcut_path(display_name)?,
        })
    }

    /// Remove the shortcut for `display_name`, including links in legacy
    /// formats with the same name
    ///
    /// Returns whether any file was removed.
    pub fn delete_shortcut(&self, display_name: &str) -> ShortcutResult<bool> {
        let path = self.shortcut_path(display_name)?;
        let candidates = std::iter::once(path.clone()).chain(
            self.writer
                .legacy_extensions()
                .iter()
                .map(|ext| path.with_extension(ext)),
        );

        let mut removed = false;
        for candidate in candidates {
            if !candidate.exists() {
                debug!("No shortcut to remove at {}", candidate.display());
                continue;
            }

            fs::remove_file(&candidate).map_err(|source| ShortcutError::Io {
                path: candidate.clone(),
                source,
            })?;

            info!("Removed shortcut {}", candidate.display());
            removed = true;
        }

        Ok(removed)
    }

    /// Write a shortcut for `display_name` launching `target` in `working_dir`
    pub fn create_shortcut(
        &self,
        display_name: &str,
        target: &Path,
        working_dir: &Path,
    ) -> ShortcutResult<PathBuf> {
        let descriptor = self.describe(display_name, target, working_dir)?;
        let path = descriptor.link_path.clone();
        let io_err = |source| ShortcutError::Io {
            path: path.clone(),
            source,
        };

        fs::write(&path, self.writer.render(&descriptor)).map_err(io_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if self.writer.executable() {
                fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).map_err(io_err)?;
            }
        }

        info!("Created shortcut {}", path.display());
        Ok(path)
    }
}

impl Default for ShortcutManager {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_desktop_dir() -> Option<PathBuf> {
    directories::UserDirs::new().and_then(|dirs| {
        dirs.desktop_dir()
            .map(Path::to_path_buf)
            .or_else(|| Some(dirs.home_dir().join("Desktop")))
    })
}

fn validate_name(display_name: &str) -> ShortcutResult<&str> {
    let name = display_name.trim();
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(ShortcutError::InvalidName(display_name.to_string()));
    }
    Ok(name)
}

/// Double-quote a path for shell-style command lines
fn quote(path: &Path) -> String {
    let mut quoted = String::from("\"");
    for c in path.display().to_string().chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

fn file_url(path: &Path) -> String {
    let normalized = path.display().to_string().replace('\\', "/");
    if normalized.starts_with('/') {
        format!("file://{}", normalized)
    } else {
        format!("file:///{}", normalized)
    }
}
