//! Archive and installation directory fixtures

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::constants::*;

/// Build a zip archive in memory
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(*name, SimpleFileOptions::default())
                .unwrap();
        } else {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

/// The archive served in the happy-path scenarios
pub fn release_archive() -> Vec<u8> {
    zip_bytes(&[
        (MAIN_EXECUTABLE, EXECUTABLE_CONTENT),
        ("data/", b""),
        ("data/levels.dat", b"levels v2"),
        ("README.txt", b"read me"),
    ])
}

/// A structurally valid zip whose deflate data for the main executable is
/// garbage
pub fn corrupt_deflate_archive() -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    writer.start_file(MAIN_EXECUTABLE, options).unwrap();
    writer.write_all(&payload(200 * 1024)).unwrap();
    let mut bytes = writer.finish().unwrap().into_inner();

    let data_start = ZipArchive::new(Cursor::new(bytes.as_slice()))
        .unwrap()
        .by_index_raw(0)
        .unwrap()
        .data_start() as usize;
    bytes[data_start..data_start + 64].fill(0xFF);
    bytes
}

/// Deterministic payload of `len` bytes
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Populate `dest` as a previous installation with user data
pub fn seed_previous_install(dest: &Path) {
    fs::create_dir_all(dest.join(PROTECTED_DIR).join("slots")).unwrap();
    fs::write(dest.join(PROTECTED_DIR).join("profile.dat"), b"player one").unwrap();
    fs::write(dest.join(PROTECTED_DIR).join("slots/1.dat"), b"slot one").unwrap();

    fs::write(dest.join(MAIN_EXECUTABLE), b"old game binary").unwrap();
    fs::write(dest.join("obsolete.dll"), b"stale").unwrap();
    fs::create_dir_all(dest.join("data")).unwrap();
    fs::write(dest.join("data/old-levels.dat"), b"levels v1").unwrap();
    fs::write(dest.join(VERSION_FILE), INSTALLED_VERSION).unwrap();
}

/// Sorted names of the immediate children of `dir`
pub fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
