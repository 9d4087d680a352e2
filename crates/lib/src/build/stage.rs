//! Staging: moving a fresh toolchain artifact to its stable workspace path.

use std::path::Path;

use tracing::{debug, info};

use crate::error::StagingError;
use crate::util::fs::{AtomicCopyError, copy_atomic, remove_if_exists};
use crate::workspace::BuildTarget;

/// Copy `produced` over `staged`, atomically.
///
/// The previous staged artifact stays in place until the new one is fully
/// written.
pub fn stage_artifact(produced: &Path, staged: &Path) -> Result<(), StagingError> {
  if !produced.is_file() {
    return Err(StagingError::ArtifactMissing(produced.to_path_buf()));
  }

  if let Some(parent) = staged.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent).map_err(|source| StagingError::Copy {
      from: produced.to_path_buf(),
      to: staged.to_path_buf(),
      source,
    })?;
  }

  copy_atomic(produced, staged, None).map_err(|e| match e {
    AtomicCopyError::Copy(source) | AtomicCopyError::Permissions(source) => StagingError::Copy {
      from: produced.to_path_buf(),
      to: staged.to_path_buf(),
      source,
    },
    AtomicCopyError::Persist(source) => StagingError::Persist {
      path: staged.to_path_buf(),
      source,
    },
  })?;

  info!(from = %produced.display(), to = %staged.display(), "staged artifact");
  Ok(())
}

/// Remove the staged artifact of `target`. Returns whether one existed.
///
/// Toolchain output and installed copies are left alone.
pub fn clean(target: &BuildTarget) -> Result<bool, StagingError> {
  let removed = remove_if_exists(&target.output).map_err(|source| StagingError::Remove {
    path: target.output.clone(),
    source,
  })?;

  if removed {
    info!(target = %target.name, path = %target.output.display(), "removed staged artifact");
  } else {
    debug!(target = %target.name, "nothing to clean");
  }
  Ok(removed)
}
