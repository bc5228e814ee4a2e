//! Shared test constants

/// Version served by the mock version endpoint
pub const REMOTE_VERSION: &str = "2.0.0";

/// Version recorded by a previous installation
pub const INSTALLED_VERSION: &str = "1.0.0";

/// Shortcut display name served by the mock name endpoint
pub const SHORTCUT_NAME: &str = "Star Game";

/// Main executable inside the test archives
pub const MAIN_EXECUTABLE: &str = "game.exe";

/// Contents of the main executable inside the test archives
pub const EXECUTABLE_CONTENT: &[u8] = b"new game binary";

/// Endpoint paths on the mock server
pub const ARCHIVE_PATH: &str = "/downloads/game.zip";
pub const VERSION_PATH: &str = "/downloads/version.txt";
pub const SHORTCUT_NAME_PATH: &str = "/downloads/name.txt";

/// Protected directory and marker names from the default settings
pub const PROTECTED_DIR: &str = "save";
pub const VERSION_FILE: &str = "version.txt";
pub const ARCHIVE_NAME: &str = "temp.zip";

/// Chunk size used by the download tests
pub const TEST_CHUNK_SIZE: usize = 1024;
