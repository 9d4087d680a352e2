//! Dependency enumeration for a build target.
//!
//! A target's dependency set is the target manifest, the workspace manifest,
//! and every recognized source file under the target's own directory and each
//! shared directory it declares. The set is recomputed by walking the
//! filesystem on every call and is never stored.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use crate::error::ConfigError;
use crate::workspace::{BuildTarget, Workspace};

/// One file the target's output depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyFile {
  pub path: PathBuf,
  pub modified: SystemTime,
}

/// Ordered, de-duplicated set of files a target depends on.
#[derive(Debug, Clone, Default)]
pub struct DependencySet {
  files: Vec<DependencyFile>,
}

impl DependencySet {
  /// Enumerate every dependency of `target`.
  ///
  /// Fails if the target's own directory or any shared directory is missing,
  /// if a directory cannot be read, or if no source files are found at all.
  /// Symlinks are followed; dangling symlinks are skipped.
  pub fn collect(ws: &Workspace, target: &BuildTarget) -> Result<Self, ConfigError> {
    for dir in target.source_dirs() {
      if !dir.is_dir() {
        return Err(ConfigError::MissingDirectory {
          target: target.name.clone(),
          path: dir.to_path_buf(),
        });
      }
    }

    let mut set = Self::default();
    let mut seen = HashSet::new();

    for manifest in [&target.manifest, &ws.root_manifest] {
      if let Some(file) = stat_file(manifest) {
        set.push(file, &mut seen);
      }
    }

    let manifests = set.files.len();
    for dir in target.source_dirs() {
      scan_dir(target, dir, &ws.extensions, |file| set.push(file, &mut seen))?;
    }

    if set.files.len() == manifests {
      return Err(ConfigError::EmptyDependencySet(target.name.clone()));
    }

    debug!(target = %target.name, files = set.files.len(), "collected dependency set");
    Ok(set)
  }

  fn push(&mut self, file: DependencyFile, seen: &mut HashSet<PathBuf>) {
    if seen.insert(file.path.clone()) {
      self.files.push(file);
    }
  }

  pub fn files(&self) -> &[DependencyFile] {
    &self.files
  }

  pub fn len(&self) -> usize {
    self.files.len()
  }

  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }

  /// The most recently modified dependency.
  pub fn newest(&self) -> Option<&DependencyFile> {
    self.files.iter().max_by_key(|f| f.modified)
  }

  pub fn contains(&self, path: &Path) -> bool {
    self.files.iter().any(|f| f.path == path)
  }
}

/// Walk `dir` recursively, reporting every recognized source file.
fn scan_dir(
  target: &BuildTarget,
  dir: &Path,
  extensions: &[String],
  mut visit: impl FnMut(DependencyFile),
) -> Result<(), ConfigError> {
  let walker = WalkDir::new(dir).follow_links(true).sort_by_file_name();

  for entry in walker {
    let entry = match entry {
      Ok(entry) => entry,
      Err(err) => {
        if err.loop_ancestor().is_some() {
          warn!(target = %target.name, path = ?err.path(), "skipping symlink loop");
          continue;
        }
        if err.io_error().is_some_and(|e| e.kind() == io::ErrorKind::NotFound) {
          debug!(target = %target.name, path = ?err.path(), "skipping dangling symlink");
          continue;
        }
        return Err(ConfigError::Scan {
          target: target.name.clone(),
          path: err.path().unwrap_or(dir).to_path_buf(),
          message: err.to_string(),
        });
      }
    };

    if !entry.file_type().is_file() || !is_source_file(entry.path(), extensions) {
      continue;
    }

    let modified = entry.metadata().ok().and_then(|m| m.modified().ok());
    match modified {
      Some(modified) => {
        trace!(path = %entry.path().display(), "dependency");
        visit(DependencyFile {
          path: entry.path().to_path_buf(),
          modified,
        });
      }
      None => debug!(path = %entry.path().display(), "skipping file without modification time"),
    }
  }

  Ok(())
}

fn stat_file(path: &Path) -> Option<DependencyFile> {
  let metadata = fs::metadata(path).ok().filter(|m| m.is_file())?;
  Some(DependencyFile {
    path: path.to_path_buf(),
    modified: metadata.modified().ok()?,
  })
}

/// Whether `path` has one of the recognized source extensions.
pub fn is_source_file(path: &Path, extensions: &[String]) -> bool {
  path
    .extension()
    .and_then(|e| e.to_str())
    .is_some_and(|ext| extensions.iter().any(|allowed| allowed == ext))
}
