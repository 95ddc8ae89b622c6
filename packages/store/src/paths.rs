//! Default location of the listings database.
//!
//! A crawl run without `--db` writes to `data/listings.sqlite3` under the
//! workspace root, next to the `packages/` directory.

use std::path::{Path, PathBuf};

const DATA_DIR: &str = "data";
const LISTINGS_DB_FILE: &str = "listings.sqlite3";

/// Workspace root, two levels above this crate's manifest. Falls back to the
/// current directory when the crate is built outside the workspace.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Default listings database file.
#[must_use]
pub fn listings_db_path() -> PathBuf {
    project_root().join(DATA_DIR).join(LISTINGS_DB_FILE)
}

/// Creates `path` and its parents unless it already exists. An empty path
/// (a bare file name's parent) is left alone.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if path.as_os_str().is_empty() || path.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(path)
}
