//! Workspace build graph.
//!
//! A workspace is described by a single `stagebin.toml` at its root listing
//! every build target. The same build rule is applied to each entry, so adding
//! a program to the workspace is one `[[target]]` block rather than a copy of
//! the rule.
//!
//! ```toml
//! [workspace]
//! manifest = "Cargo.toml"
//! target-dir = "target"
//!
//! [[target]]
//! name = "zkas"
//! path = "bin/zkas"
//! shared = ["src/zkas", "src/serial"]
//! ```

pub mod types;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::{CONFIG_FILENAME, STATE_DIRNAME};
use crate::error::ConfigError;
use crate::platform::paths;

pub use types::{BuildTarget, TargetConfig, WorkspaceConfig, WorkspaceSettings};

/// A loaded and validated workspace.
#[derive(Debug, Clone)]
pub struct Workspace {
  /// Absolute workspace root.
  pub root: PathBuf,
  /// Manifest at the workspace root, a dependency of every target.
  pub root_manifest: PathBuf,
  /// Absolute toolchain output root.
  pub target_dir: PathBuf,
  /// Source file extensions (without the leading dot).
  pub extensions: Vec<String>,
  /// Targets in declaration order.
  pub targets: Vec<BuildTarget>,
}

impl Workspace {
  /// Load `stagebin.toml` from the given workspace root.
  pub fn load(root: &Path) -> Result<Self, ConfigError> {
    Self::load_file(&root.join(CONFIG_FILENAME))
  }

  /// Load a specific configuration file. Its parent directory is the workspace root.
  pub fn load_file(config_path: &Path) -> Result<Self, ConfigError> {
    let read_err = |source| ConfigError::Read {
      path: config_path.to_path_buf(),
      source,
    };

    let content = std::fs::read_to_string(config_path).map_err(read_err)?;
    let config: WorkspaceConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: config_path.to_path_buf(),
      source,
    })?;

    let config_path = dunce::canonicalize(config_path).map_err(read_err)?;
    let root = config_path.parent().map(Path::to_path_buf).unwrap_or_default();

    if config.targets.is_empty() {
      return Err(ConfigError::NoTargets(config_path));
    }

    Self::from_config(&root, config)
  }

  /// Resolve and validate a parsed configuration against `root`.
  pub fn from_config(root: &Path, config: WorkspaceConfig) -> Result<Self, ConfigError> {
    let settings = config.workspace;

    let mut by_name: HashMap<&str, &TargetConfig> = HashMap::new();
    for target in &config.targets {
      validate_name(&target.name)?;
      if by_name.insert(target.name.as_str(), target).is_some() {
        return Err(ConfigError::DuplicateName(target.name.clone()));
      }
    }

    let targets: Vec<BuildTarget> = config
      .targets
      .iter()
      .map(|t| BuildTarget::resolve(t, root, &settings))
      .collect();

    let mut by_output: HashMap<&Path, &str> = HashMap::new();
    for target in &targets {
      if let Some(first) = by_output.insert(target.output.as_path(), target.name.as_str()) {
        return Err(ConfigError::DuplicateOutput {
          first: first.to_string(),
          second: target.name.clone(),
          path: target.output.clone(),
        });
      }
    }

    let target_dir = paths::target_dir_override().unwrap_or(settings.target_dir);

    debug!(root = %root.display(), targets = targets.len(), "loaded workspace");

    Ok(Self {
      root: root.to_path_buf(),
      root_manifest: root.join(&settings.manifest),
      target_dir: root.join(target_dir),
      extensions: settings.extensions,
      targets,
    })
  }

  /// Look up a target by name.
  pub fn target(&self, name: &str) -> Option<&BuildTarget> {
    self.targets.iter().find(|t| t.name == name)
  }

  /// Select targets by name, in declaration order. No names selects every target.
  pub fn select(&self, names: &[String]) -> Result<Vec<BuildTarget>, ConfigError> {
    if names.is_empty() {
      return Ok(self.targets.clone());
    }

    if let Some(unknown) = names.iter().find(|n| self.target(n).is_none()) {
      return Err(ConfigError::UnknownTarget {
        name: unknown.clone(),
        available: self.target_names().join(", "),
      });
    }

    Ok(
      self
        .targets
        .iter()
        .filter(|t| names.contains(&t.name))
        .cloned()
        .collect(),
    )
  }

  pub fn target_names(&self) -> Vec<&str> {
    self.targets.iter().map(|t| t.name.as_str()).collect()
  }

  /// Directory holding per-target staging locks.
  pub fn lock_dir(&self) -> PathBuf {
    self.root.join(STATE_DIRNAME).join("locks")
  }
}

fn validate_name(name: &str) -> Result<(), ConfigError> {
  let message = if name.is_empty() {
    "name must not be empty"
  } else if name.contains(['/', '\\']) {
    "name must not contain path separators"
  } else if name == "." || name == ".." {
    "name must not be a relative path component"
  } else {
    return Ok(());
  };

  Err(ConfigError::InvalidTarget {
    name: name.to_string(),
    message: message.to_string(),
  })
}
