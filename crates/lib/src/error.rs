//! Error taxonomy for the build pipeline.
//!
//! Each stage of the pipeline has its own error type so callers can tell a
//! misconfigured workspace apart from a failed compile, and a failed compile
//! apart from a compile whose output could not be staged.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Problems with the workspace description. Raised before the toolchain runs.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("no build targets declared in {0}")]
  NoTargets(PathBuf),

  #[error("invalid target {name}: {message}")]
  InvalidTarget { name: String, message: String },

  #[error("duplicate target name: {0}")]
  DuplicateName(String),

  #[error("targets {first} and {second} both stage to {path}")]
  DuplicateOutput {
    first: String,
    second: String,
    path: PathBuf,
  },

  #[error("unknown target: {name} (available: {available})")]
  UnknownTarget { name: String, available: String },

  #[error("target {target}: dependency directory {path} does not exist or is not a directory")]
  MissingDirectory { target: String, path: PathBuf },

  #[error("target {target}: failed to scan {path}: {message}")]
  Scan {
    target: String,
    path: PathBuf,
    message: String,
  },

  #[error("target {0}: dependency set is empty (no source files found)")]
  EmptyDependencySet(String),

  #[error("failed to query {program} for the host triple: {message}")]
  TripleQuery { program: String, message: String },
}

/// The toolchain could not be run or reported failure.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error("failed to spawn {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: io::Error,
  },

  #[error("{program} exited with {status}{}", format_stderr(.stderr))]
  ToolchainFailed {
    program: String,
    status: ExitStatus,
    stderr: String,
  },
}

fn format_stderr(stderr: &str) -> String {
  let trimmed = stderr.trim();
  if trimmed.is_empty() {
    String::new()
  } else {
    format!(":\n{}", trimmed)
  }
}

/// The toolchain succeeded but its artifact could not be put in place.
#[derive(Debug, Error)]
pub enum StagingError {
  #[error("toolchain reported success but produced no artifact at {0}")]
  ArtifactMissing(PathBuf),

  #[error("failed to copy {from} to {to}: {source}")]
  Copy {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to move staged artifact into {path}: {source}")]
  Persist {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to remove staged artifact {path}: {source}")]
  Remove {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Install and uninstall failures.
#[derive(Debug, Error)]
pub enum InstallError {
  #[error("staged artifact {0} does not exist")]
  MissingArtifact(PathBuf),

  #[error("failed to create {path}: {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to install {from} to {to}: {source}")]
  Copy {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to set permissions on {path}: {source}")]
  SetPermissions {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to remove {path}: {source}")]
  Remove {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Failures acquiring the per-target staging lock.
#[derive(Debug, Error)]
pub enum LockError {
  #[error("failed to create lock directory {path}: {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to open lock file {path}: {source}")]
  OpenFile {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to lock {path}: {source}")]
  LockFailed {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("lock task for {0} was cancelled")]
  Cancelled(PathBuf),
}

/// Any failure of a per-target pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("configuration error: {0}")]
  Config(#[from] ConfigError),

  #[error("build failed: {0}")]
  Build(#[from] BuildError),

  #[error("staging failed: {0}")]
  Staging(#[from] StagingError),

  #[error("install failed: {0}")]
  Install(#[from] InstallError),

  #[error("lock error: {0}")]
  Lock(#[from] LockError),

  #[error("task for target {0} was cancelled before it finished")]
  Cancelled(String),
}

impl PipelineError {
  /// Process exit code for this failure.
  ///
  /// A toolchain failure propagates the toolchain's own exit code; every
  /// other failure maps to 1.
  pub fn exit_code(&self) -> i32 {
    match self {
      PipelineError::Build(BuildError::ToolchainFailed { status, .. }) => match status.code() {
        Some(code) if code != 0 => code,
        _ => 1,
      },
      _ => 1,
    }
  }

  /// Short label for the failing stage.
  pub fn stage(&self) -> &'static str {
    match self {
      PipelineError::Config(_) => "config",
      PipelineError::Build(_) => "build",
      PipelineError::Staging(_) => "staging",
      PipelineError::Install(_) => "install",
      PipelineError::Lock(_) => "lock",
      PipelineError::Cancelled(_) => "cancelled",
    }
  }
}
