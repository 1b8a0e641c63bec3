//! Atomic snapshot file writes
//!
//! Snapshots are written to a sibling `.tmp` file, synced, then renamed over
//! the destination. Readers see either the previous snapshot or the new
//! one, never a partial write.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Temp file used while `path` is being replaced
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Atomically replace `path` with `content`, creating parent directories
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let temp_path = temp_path_for(path);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(&temp_path)?;
    file.write_all(content)?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Remove the temp file an interrupted write may have left next to `path`.
///
/// Returns whether a file was removed.
pub fn remove_stale_temp(path: &Path) -> io::Result<bool> {
    let temp_path = temp_path_for(path);
    if !temp_path.exists() {
        return Ok(false);
    }
    fs::remove_file(&temp_path)?;
    Ok(true)
}
