//! Compilation target triple resolution.
//!
//! The triple is resolved once per invocation: an explicit override wins,
//! otherwise the toolchain is asked for its host triple (`rustc -vV`). It is
//! never persisted, since the installed toolchain may change between runs.

use std::fmt;

use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, info};

use super::paths;
use crate::error::ConfigError;

/// Where a resolved triple came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TripleSource {
  /// `--target` or `RUST_TARGET`.
  Override,
  /// The toolchain's reported host triple.
  Toolchain,
}

/// The active compilation target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolchainTarget {
  pub triple: String,
  pub source: TripleSource,
}

impl ToolchainTarget {
  pub fn new(triple: impl Into<String>, source: TripleSource) -> Self {
    Self {
      triple: triple.into(),
      source,
    }
  }

  /// Resolve the active triple.
  ///
  /// `explicit` (from the command line) takes precedence over `RUST_TARGET`;
  /// with neither set, the toolchain is queried.
  pub async fn resolve(explicit: Option<&str>) -> Result<Self, ConfigError> {
    let overridden = explicit
      .filter(|t| !t.is_empty())
      .map(str::to_string)
      .or_else(paths::triple_override);

    if let Some(triple) = overridden {
      debug!(triple = %triple, "using target triple override");
      return Ok(Self::new(triple, TripleSource::Override));
    }

    let triple = query_host_triple(&paths::rustc_program()).await?;
    info!(triple = %triple, "resolved host triple from toolchain");
    Ok(Self::new(triple, TripleSource::Toolchain))
  }

  /// Executable suffix for binaries produced for this triple.
  pub fn exe_suffix(&self) -> &'static str {
    if self.triple.contains("windows") { ".exe" } else { "" }
  }
}

impl fmt::Display for ToolchainTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.triple)
  }
}

/// Run `<rustc> -vV` and extract the `host:` line.
async fn query_host_triple(rustc: &str) -> Result<String, ConfigError> {
  let query_err = |message: String| ConfigError::TripleQuery {
    program: rustc.to_string(),
    message,
  };

  let output = Command::new(rustc)
    .arg("-vV")
    .output()
    .await
    .map_err(|e| query_err(e.to_string()))?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    return Err(query_err(format!("exited with {}: {}", output.status, stderr.trim())));
  }

  let stdout = String::from_utf8_lossy(&output.stdout);
  parse_host_triple(&stdout)
    .map(str::to_string)
    .ok_or_else(|| query_err("no `host:` line in version output".to_string()))
}

/// Extract the host triple from `rustc -vV` output.
pub fn parse_host_triple(version_output: &str) -> Option<&str> {
  version_output
    .lines()
    .find_map(|line| line.strip_prefix("host:"))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}
