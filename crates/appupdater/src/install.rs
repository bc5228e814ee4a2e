//! Installation directory management
//!
//! This module provides:
//! - Selective wipe of the destination that keeps the protected directory
//! - Empty-archive validation
//! - Zip extraction into the destination
//! - Version marker persistence
//!
//! All operations are blocking; the controller runs them on the blocking
//! thread pool.

use appupdater_core::InstallSettings;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::error::{Result, UpdateError};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Prepares, fills, and stamps the installation directory
#[derive(Debug, Clone)]
pub struct InstallationManager {
    settings: InstallSettings,
}

impl InstallationManager {
    pub fn new(settings: InstallSettings) -> Self {
        Self { settings }
    }

    /// Top-level directory name that survives the wipe
    pub fn protected_dir(&self) -> &str {
        &self.settings.protected_dir
    }

    /// Location of the transient archive inside `dest`
    pub fn archive_path(&self, dest: &Path) -> PathBuf {
        dest.join(&self.settings.archive_name)
    }

    /// Location of the version marker inside `dest`
    pub fn version_marker_path(&self, dest: &Path) -> PathBuf {
        dest.join(&self.settings.version_file)
    }

    /// Create `path`, or empty it except for the protected directory
    ///
    /// Only immediate children are inspected. A directory whose name equals
    /// the protected name is left untouched with its contents; everything else
    /// (files, symlinks, other directories) is removed. Nested directories
    /// sharing the protected name get no special treatment.
    pub fn prepare_destination(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            info!("Creating installation directory {}", path.display());
            return fs::create_dir_all(path)
                .map_err(|e| UpdateError::io(format!("Failed to create {}", path.display()), e));
        }

        info!(
            "Clearing {} (keeping '{}')",
            path.display(),
            self.settings.protected_dir
        );

        let entries = fs::read_dir(path)
            .map_err(|e| UpdateError::io(format!("Failed to list {}", path.display()), e))?;

        for entry in entries {
            let entry = entry
                .map_err(|e| UpdateError::io(format!("Failed to list {}", path.display()), e))?;
            let entry_path = entry.path();
            // DirEntry::file_type does not follow symlinks
            let file_type = entry.file_type().map_err(|e| {
                UpdateError::io(format!("Failed to inspect {}", entry_path.display()), e)
            })?;

            let removal = if file_type.is_dir() {
                if entry.file_name() == self.settings.protected_dir.as_str() {
                    debug!("Keeping protected directory {}", entry_path.display());
                    continue;
                }
                fs::remove_dir_all(&entry_path)
            } else {
                remove_file_or_link(&entry_path)
            };
            removal.map_err(|e| {
                UpdateError::io(format!("Failed to remove {}", entry_path.display()), e)
            })?;

            debug!("Removed {}", entry_path.display());
        }

        Ok(())
    }

    /// Reject a zero-length archive
    pub fn validate_archive(&self, path: &Path) -> Result<()> {
        let metadata = fs::metadata(path)
            .map_err(|e| UpdateError::io(format!("Failed to read {}", path.display()), e))?;

        if metadata.len() == 0 {
            return Err(UpdateError::EmptyArchive {
                path: path.to_path_buf(),
            });
        }

        Ok(())
    }

    /// Extract every entry of `archive_path` into `dest`, then remove the archive
    ///
    /// On a corrupt archive the error is returned and the archive stays on
    /// disk for inspection.
    pub fn extract_archive(&self, archive_path: &Path, dest: &Path) -> Result<()> {
        info!("Extracting {} into {}", archive_path.display(), dest.display());

        let file = File::open(archive_path)
            .map_err(|e| UpdateError::io(format!("Failed to open {}", archive_path.display()), e))?;
        let mut archive = ZipArchive::new(file)?;

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let outpath = match entry.enclosed_name() {
                Some(relative) => dest.join(relative),
                None => {
                    warn!("Skipping archive entry outside destination: {}", entry.name());
                    continue;
                }
            };

            if entry.is_dir() {
                fs::create_dir_all(&outpath).map_err(|e| {
                    UpdateError::io(format!("Failed to create {}", outpath.display()), e)
                })?;
                continue;
            }

            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    UpdateError::io(format!("Failed to create {}", parent.display()), e)
                })?;
            }

            let mut outfile = File::create(&outpath).map_err(|e| {
                UpdateError::io(format!("Failed to create {}", outpath.display()), e)
            })?;
            copy_entry(&mut entry, &mut outfile, &outpath)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = entry.unix_mode() {
                    fs::set_permissions(&outpath, fs::Permissions::from_mode(mode)).map_err(
                        |e| UpdateError::io(format!("Failed to chmod {}", outpath.display()), e),
                    )?;
                }
            }
        }

        let entry_count = archive.len();
        drop(archive);
        fs::remove_file(archive_path).map_err(|e| {
            UpdateError::io(format!("Failed to remove {}", archive_path.display()), e)
        })?;

        info!("Extracted {} entries", entry_count);
        Ok(())
    }

    /// Overwrite the version marker with the trimmed version
    pub fn write_version_marker(&self, dest: &Path, version: &str) -> Result<()> {
        let marker = self.version_marker_path(dest);
        fs::write(&marker, version.trim())
            .map_err(|e| UpdateError::io(format!("Failed to write {}", marker.display()), e))?;
        info!("Recorded version {}", version.trim());
        Ok(())
    }

    /// Currently installed version, if a marker exists
    pub fn read_version_marker(&self, dest: &Path) -> Option<String> {
        fs::read_to_string(self.version_marker_path(dest))
            .ok()
            .map(|v| v.trim().to_string())
    }
}

/// Copy one archive entry to disk
///
/// Any failure while reading the entry (bad deflate data, CRC mismatch,
/// truncation) is an archive error; only write failures are I/O errors.
fn copy_entry(entry: &mut impl Read, outfile: &mut File, outpath: &Path) -> Result<()> {
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    loop {
        let n = match entry.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(UpdateError::Zip(e.into())),
        };
        outfile
            .write_all(&buf[..n])
            .map_err(|e| UpdateError::io(format!("Failed to write {}", outpath.display()), e))?;
    }
}

fn remove_file_or_link(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        // Windows directory symlinks need remove_dir
        Err(e) if cfg!(windows) && path.is_dir() => fs::remove_dir(path).or(Err(e)),
        other => other,
    }
}
