//! Atomic file replacement.
//!
//! Staged and installed binaries are written to a temporary file next to the
//! destination and renamed into place, so readers see either the previous
//! file or the complete new one, and an interrupted copy leaves the previous
//! file untouched.

use std::fs::File;
use std::io;
use std::path::Path;

use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error)]
pub enum AtomicCopyError {
  #[error("copy failed: {0}")]
  Copy(#[source] io::Error),

  #[error("setting permissions failed: {0}")]
  Permissions(#[source] io::Error),

  #[error("rename into place failed: {0}")]
  Persist(#[source] io::Error),
}

/// Copy `from` over `to` via a temporary file in `to`'s directory.
///
/// Without `mode`, the source's permissions are carried over. With `mode`
/// (unix only), the copy gets exactly that mode before it becomes visible.
pub fn copy_atomic(from: &Path, to: &Path, mode: Option<u32>) -> Result<(), AtomicCopyError> {
  let parent = match to.parent() {
    Some(p) if !p.as_os_str().is_empty() => p,
    _ => Path::new("."),
  };

  let mut source = File::open(from).map_err(AtomicCopyError::Copy)?;
  let permissions = source.metadata().map_err(AtomicCopyError::Copy)?.permissions();

  let mut temp = tempfile::Builder::new()
    .prefix(".stagebin-")
    .suffix(".tmp")
    .tempfile_in(parent)
    .map_err(AtomicCopyError::Copy)?;

  let bytes = io::copy(&mut source, temp.as_file_mut()).map_err(AtomicCopyError::Copy)?;
  temp.as_file().sync_all().map_err(AtomicCopyError::Copy)?;

  temp
    .as_file()
    .set_permissions(with_mode(permissions, mode))
    .map_err(AtomicCopyError::Permissions)?;

  temp.persist(to).map_err(|e| AtomicCopyError::Persist(e.error))?;
  trace!(from = %from.display(), to = %to.display(), bytes, "replaced file");
  Ok(())
}

#[cfg(unix)]
fn with_mode(permissions: std::fs::Permissions, mode: Option<u32>) -> std::fs::Permissions {
  use std::os::unix::fs::PermissionsExt;

  match mode {
    Some(mode) => std::fs::Permissions::from_mode(mode),
    None => permissions,
  }
}

#[cfg(not(unix))]
fn with_mode(permissions: std::fs::Permissions, _mode: Option<u32>) -> std::fs::Permissions {
  permissions
}

/// Remove `path` if it exists. Returns whether anything was removed.
pub fn remove_if_exists(path: &Path) -> io::Result<bool> {
  match std::fs::remove_file(path) {
    Ok(()) => Ok(true),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
    Err(e) => Err(e),
  }
}
