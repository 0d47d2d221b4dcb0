//! Location of the SQLite database.
//!
//! The database lives in a platform-specific data directory unless a path
//! is given through `--db` or `FINSERIES_DB`.

use finseries_data::error::DataError;
use finseries_data::store::SqliteStore;
use std::path::{Path, PathBuf};

/// Get the default data directory path.
///
/// Uses platform-specific data directories:
/// - Linux: `~/.local/share/finseries/`
/// - macOS: `~/Library/Application Support/finseries/`
/// - Windows: `%APPDATA%\finseries\`
pub(crate) fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("finseries")
}

/// Get the default database path.
pub(crate) fn default_db_path() -> PathBuf {
    default_data_dir().join("finance.db")
}

/// Resolve the database path, preferring an explicit one.
pub(crate) fn db_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map_or_else(default_db_path, Path::to_path_buf)
}

/// Open the store, creating the directory if needed.
pub(crate) fn open_store(explicit: Option<&Path>) -> Result<SqliteStore, DataError> {
    let path = db_path(explicit);
    tracing::debug!(path = %path.display(), "opening statement store");
    SqliteStore::open(&path)
}
