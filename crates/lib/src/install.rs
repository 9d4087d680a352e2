//! Installing staged artifacts into `<destdir><prefix>/bin` and removing them.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::build::{BuildOutcome, Toolchain, ensure_built};
use crate::consts::INSTALL_MODE;
use crate::error::{InstallError, PipelineError};
use crate::platform::{ToolchainTarget, paths};
use crate::util::fs::{AtomicCopyError, copy_atomic, remove_if_exists};
use crate::workspace::{BuildTarget, Workspace};

/// Where installed binaries go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallLayout {
  pub prefix: PathBuf,
  pub destdir: Option<PathBuf>,
}

impl InstallLayout {
  pub fn new(prefix: impl Into<PathBuf>, destdir: Option<PathBuf>) -> Self {
    Self {
      prefix: prefix.into(),
      destdir,
    }
  }

  /// `PREFIX` and `DESTDIR` from the environment.
  pub fn from_env() -> Self {
    Self::new(paths::prefix(), paths::destdir())
  }

  /// `<destdir><prefix>/bin`
  pub fn bin_dir(&self) -> PathBuf {
    paths::compose_destdir(self.destdir.as_deref(), &self.prefix).join("bin")
  }

  pub fn installed_path(&self, target: &BuildTarget) -> PathBuf {
    self.bin_dir().join(&target.install_name)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallOutcome {
  pub build: BuildOutcome,
  pub installed: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "path", rename_all = "kebab-case")]
pub enum UninstallOutcome {
  Removed(PathBuf),
  NotInstalled,
}

/// Build `target` if stale, then install its staged artifact.
pub async fn install(
  ws: &Workspace,
  target: &BuildTarget,
  layout: &InstallLayout,
  triple: &ToolchainTarget,
  toolchain: &Toolchain,
) -> Result<InstallOutcome, PipelineError> {
  let build = ensure_built(ws, target, triple, toolchain).await?;

  let staged = target.output.clone();
  let dest_dir = layout.bin_dir();
  let dest = layout.installed_path(target);
  let task_dest = dest.clone();

  tokio::task::spawn_blocking(move || install_file(&staged, &dest_dir, &task_dest))
    .await
    .map_err(|e| InstallError::Copy {
      from: target.output.clone(),
      to: dest.clone(),
      source: io::Error::other(e),
    })??;

  info!(target = %target.name, path = %dest.display(), "installed");
  Ok(InstallOutcome { build, installed: dest })
}

/// Copy an already-staged artifact to `layout`, without building.
pub fn install_staged(target: &BuildTarget, layout: &InstallLayout) -> Result<PathBuf, InstallError> {
  let dest = layout.installed_path(target);
  install_file(&target.output, &layout.bin_dir(), &dest)?;
  Ok(dest)
}

fn install_file(staged: &Path, bin_dir: &Path, dest: &Path) -> Result<(), InstallError> {
  if !staged.is_file() {
    return Err(InstallError::MissingArtifact(staged.to_path_buf()));
  }

  std::fs::create_dir_all(bin_dir).map_err(|source| InstallError::CreateDir {
    path: bin_dir.to_path_buf(),
    source,
  })?;

  copy_atomic(staged, dest, Some(INSTALL_MODE)).map_err(|e| match e {
    AtomicCopyError::Permissions(source) => InstallError::SetPermissions {
      path: dest.to_path_buf(),
      source,
    },
    AtomicCopyError::Copy(source) | AtomicCopyError::Persist(source) => InstallError::Copy {
      from: staged.to_path_buf(),
      to: dest.to_path_buf(),
      source,
    },
  })
}

/// Remove the installed copy of `target`. Nothing installed is not an error.
pub fn uninstall(target: &BuildTarget, layout: &InstallLayout) -> Result<UninstallOutcome, InstallError> {
  let path = layout.installed_path(target);
  let removed = remove_if_exists(&path).map_err(|source| InstallError::Remove {
    path: path.clone(),
    source,
  })?;

  if removed {
    info!(target = %target.name, path = %path.display(), "uninstalled");
    Ok(UninstallOutcome::Removed(path))
  } else {
    debug!(target = %target.name, path = %path.display(), "not installed");
    Ok(UninstallOutcome::NotInstalled)
  }
}
