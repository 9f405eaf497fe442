//! Atomic I/O operations with file locking

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use fs2::FileExt;

use crate::{Error, Result};

/// Write content atomically to a file with locking.
///
/// The target is opened (and created if needed) and held under an exclusive
/// advisory lock while the content is written to a sibling temp file, synced,
/// and renamed over the target. Readers going through [`read_locked`] never
/// observe a partial write.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
    }

    let lock_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| Error::io(path, e))?;
    lock_file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    // Same directory so the rename stays on one filesystem. Each call gets
    // its own uniquely named temp file.
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let prefix = format!(
        ".{}.",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default()
    );
    let mut temp_file = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| Error::io(dir, e))?;
    temp_file
        .write_all(content)
        .map_err(|e| Error::io(temp_file.path(), e))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| Error::io(temp_file.path(), e))?;

    temp_file.persist(path).map_err(|e| Error::io(path, e.error))?;

    tracing::trace!(path = %path.display(), bytes = content.len(), "atomic write complete");
    // Lock released when lock_file is dropped
    Ok(())
}

/// Read a whole file under a shared lock.
///
/// Reads through the locked handle to avoid a TOCTOU race with a concurrent
/// [`write_atomic`].
pub fn read_locked(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    file.lock_shared().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    let mut content = String::new();
    (&file)
        .read_to_string(&mut content)
        .map_err(|e| Error::io(path, e))?;
    Ok(content)
}

/// Remove a file, treating "already gone" as success.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(path, e)),
    }
}
