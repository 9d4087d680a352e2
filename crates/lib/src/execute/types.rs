//! Types for running a verb over a set of targets.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use serde::ser::SerializeStruct;

use crate::build::{BuildOutcome, Toolchain};
use crate::error::PipelineError;
use crate::install::{InstallLayout, InstallOutcome, UninstallOutcome};
use crate::platform::ToolchainTarget;
use crate::stale::Staleness;

/// What to do with each selected target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
  Build,
  Clean,
  Install,
  Uninstall,
  Status,
}

impl Verb {
  /// Whether this verb may run the toolchain, and so needs a target triple.
  pub fn needs_toolchain(&self) -> bool {
    matches!(self, Verb::Build | Verb::Install)
  }
}

impl fmt::Display for Verb {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Verb::Build => "build",
      Verb::Clean => "clean",
      Verb::Install => "install",
      Verb::Uninstall => "uninstall",
      Verb::Status => "status",
    };
    f.write_str(name)
  }
}

/// Configuration for a run.
#[derive(Debug, Clone)]
pub struct ExecuteConfig {
  /// Maximum number of targets processed at once.
  pub parallelism: usize,

  /// Triple from the command line. Falls back to `RUST_TARGET`, then the toolchain host.
  pub triple: Option<String>,

  pub layout: InstallLayout,

  pub toolchain: Toolchain,
}

impl ExecuteConfig {
  /// Everything from the environment, with one worker per available CPU.
  pub fn from_env() -> Self {
    Self {
      parallelism: num_cpus(),
      triple: None,
      layout: InstallLayout::from_env(),
      toolchain: Toolchain::from_env(),
    }
  }
}

/// Get the number of CPUs for default parallelism.
pub fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}

/// A target's state, computed without building anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetStatus {
  pub staleness: Staleness,
  /// Number of files in the dependency set.
  pub dependencies: usize,
  pub staged: PathBuf,
  /// Installed path, if an installed copy exists.
  pub installed: Option<PathBuf>,
}

/// What a verb did for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verb", rename_all = "lowercase")]
pub enum TargetOutcome {
  Build(BuildOutcome),
  Clean { removed: bool },
  Install(InstallOutcome),
  Uninstall(UninstallOutcome),
  Status(TargetStatus),
}

/// Result for a single target.
#[derive(Debug)]
pub struct TargetReport {
  pub name: String,
  pub result: Result<TargetOutcome, PipelineError>,
}

impl TargetReport {
  pub fn is_success(&self) -> bool {
    self.result.is_ok()
  }
}

impl Serialize for TargetReport {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut state = serializer.serialize_struct("TargetReport", 3)?;
    state.serialize_field("name", &self.name)?;
    match &self.result {
      Ok(outcome) => {
        state.serialize_field("ok", &true)?;
        state.serialize_field("outcome", outcome)?;
      }
      Err(e) => {
        state.serialize_field("ok", &false)?;
        state.serialize_field(
          "error",
          &serde_json::json!({
            "stage": e.stage(),
            "message": e.to_string(),
            "exit_code": e.exit_code(),
          }),
        )?;
      }
    }
    state.end()
  }
}

/// Result of running a verb over every selected target.
#[derive(Debug, Serialize)]
pub struct RunReport {
  pub verb: Verb,
  /// Resolved triple; only set for verbs that run the toolchain.
  pub triple: Option<ToolchainTarget>,
  /// One report per target, in declaration order.
  pub targets: Vec<TargetReport>,
}

impl RunReport {
  pub fn is_success(&self) -> bool {
    self.targets.iter().all(TargetReport::is_success)
  }

  pub fn failures(&self) -> impl Iterator<Item = (&str, &PipelineError)> {
    self
      .targets
      .iter()
      .filter_map(|t| t.result.as_ref().err().map(|e| (t.name.as_str(), e)))
  }

  /// 0 on success, otherwise the exit code of the first failing target.
  pub fn exit_code(&self) -> i32 {
    self.failures().next().map(|(_, e)| e.exit_code()).unwrap_or(0)
  }

  /// Number of targets for which the toolchain actually ran.
  pub fn built_count(&self) -> usize {
    self
      .targets
      .iter()
      .filter(|t| match &t.result {
        Ok(TargetOutcome::Build(outcome)) => outcome.was_built(),
        Ok(TargetOutcome::Install(outcome)) => outcome.build.was_built(),
        _ => false,
      })
      .count()
  }
}
