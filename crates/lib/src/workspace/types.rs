//! Build graph configuration types (`stagebin.toml` format).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_EXTENSIONS, DEFAULT_MANIFEST, DEFAULT_TARGET_DIR};

/// Root of `stagebin.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceConfig {
  /// Workspace-wide settings.
  #[serde(default)]
  pub workspace: WorkspaceSettings,

  /// Build targets, in declaration order.
  #[serde(rename = "target", default)]
  pub targets: Vec<TargetConfig>,
}

/// Workspace-wide settings shared by every target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct WorkspaceSettings {
  /// Manifest at the workspace root; every target depends on it.
  #[serde(default = "default_manifest")]
  pub manifest: PathBuf,

  /// Manifest filename inside each target's own directory.
  #[serde(default = "default_manifest")]
  pub target_manifest: PathBuf,

  /// Toolchain output root. `CARGO_TARGET_DIR` takes precedence.
  #[serde(default = "default_target_dir")]
  pub target_dir: PathBuf,

  /// File extensions counted as sources when scanning directories.
  #[serde(default = "default_extensions")]
  pub extensions: Vec<String>,
}

impl Default for WorkspaceSettings {
  fn default() -> Self {
    Self {
      manifest: default_manifest(),
      target_manifest: default_manifest(),
      target_dir: default_target_dir(),
      extensions: default_extensions(),
    }
  }
}

fn default_manifest() -> PathBuf {
  PathBuf::from(DEFAULT_MANIFEST)
}

fn default_target_dir() -> PathBuf {
  PathBuf::from(DEFAULT_TARGET_DIR)
}

fn default_extensions() -> Vec<String> {
  DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

/// One `[[target]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TargetConfig {
  /// Target name, unique within the workspace. Also the produced binary name.
  pub name: String,

  /// The target's own source directory, relative to the workspace root.
  pub path: PathBuf,

  /// Shared source directories this target compiles in.
  #[serde(default)]
  pub shared: Vec<PathBuf>,

  /// Staged artifact path relative to the workspace root (default: `<name>`).
  #[serde(default)]
  pub output: Option<PathBuf>,

  /// Filename under `<prefix>/bin` (default: `<name>`).
  #[serde(default)]
  pub install_name: Option<String>,

  /// Package passed to the toolchain (default: `<name>`).
  #[serde(default)]
  pub package: Option<String>,
}

/// A build target with every path resolved against the workspace root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildTarget {
  pub name: String,
  pub package: String,
  pub source_dir: PathBuf,
  pub shared_dirs: Vec<PathBuf>,
  pub manifest: PathBuf,
  pub output: PathBuf,
  pub install_name: String,
}

impl BuildTarget {
  pub(crate) fn resolve(config: &TargetConfig, root: &Path, settings: &WorkspaceSettings) -> Self {
    let source_dir = root.join(&config.path);
    Self {
      name: config.name.clone(),
      package: config.package.clone().unwrap_or_else(|| config.name.clone()),
      manifest: source_dir.join(&settings.target_manifest),
      shared_dirs: config.shared.iter().map(|dir| root.join(dir)).collect(),
      source_dir,
      output: root.join(config.output.as_deref().unwrap_or_else(|| Path::new(&config.name))),
      install_name: config.install_name.clone().unwrap_or_else(|| config.name.clone()),
    }
  }

  /// Every directory whose contents feed this target, own directory first.
  pub fn source_dirs(&self) -> impl Iterator<Item = &Path> {
    std::iter::once(self.source_dir.as_path()).chain(self.shared_dirs.iter().map(PathBuf::as_path))
  }
}
