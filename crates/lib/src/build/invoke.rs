//! External toolchain invocation.
//!
//! The toolchain is driven strictly through its command-line contract:
//! `<cargo> build --release --target <triple> --package <package> --bin <name>`,
//! run from the workspace root. Naming the binary pins the artifact to
//! `<target-dir>/<triple>/release/<name>` even when the package is named
//! differently. Extra compiler flags are forwarded in `RUSTFLAGS`
//! without being parsed.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::consts::{ENV_CARGO_TARGET_DIR, ENV_RUSTFLAGS};
use crate::error::BuildError;
use crate::platform::{ToolchainTarget, paths};
use crate::workspace::{BuildTarget, Workspace};

/// Lines of toolchain stderr kept in a failure report.
const STDERR_TAIL_LINES: usize = 60;

/// How to run the build driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
  /// Build driver executable.
  pub program: String,
  /// Opaque extra compiler flags.
  pub rustflags: Option<String>,
}

impl Toolchain {
  /// `CARGO` and `RUSTFLAGS` from the environment.
  pub fn from_env() -> Self {
    Self {
      program: paths::cargo_program(),
      rustflags: paths::rustflags(),
    }
  }

  /// Arguments for a release build of `target` for `triple`.
  pub fn build_args(target: &BuildTarget, triple: &ToolchainTarget) -> Vec<String> {
    vec![
      "build".to_string(),
      "--release".to_string(),
      "--target".to_string(),
      triple.triple.clone(),
      "--package".to_string(),
      target.package.clone(),
      "--bin".to_string(),
      target.name.clone(),
    ]
  }

  /// Run the toolchain for `target`. Does not look at or touch staged artifacts.
  pub async fn build(&self, ws: &Workspace, target: &BuildTarget, triple: &ToolchainTarget) -> Result<(), BuildError> {
    let args = Self::build_args(target, triple);
    info!(target = %target.name, program = %self.program, args = ?args, "invoking toolchain");

    let mut command = Command::new(&self.program);
    command
      .args(&args)
      .current_dir(&ws.root)
      .env(ENV_CARGO_TARGET_DIR, &ws.target_dir)
      .stdin(Stdio::null())
      .kill_on_drop(true);

    if let Some(flags) = &self.rustflags {
      command.env(ENV_RUSTFLAGS, flags);
    }

    let output = command.output().await.map_err(|source| BuildError::Spawn {
      program: self.program.clone(),
      source,
    })?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !output.status.success() {
      return Err(BuildError::ToolchainFailed {
        program: self.program.clone(),
        status: output.status,
        stderr: tail_lines(&stderr, STDERR_TAIL_LINES),
      });
    }

    if !stderr.trim().is_empty() {
      debug!(target = %target.name, stderr = %stderr.trim(), "toolchain output");
    }

    Ok(())
  }
}

/// Where the toolchain leaves the release binary of `target` for `triple`.
pub fn toolchain_output(ws: &Workspace, target: &BuildTarget, triple: &ToolchainTarget) -> PathBuf {
  ws.target_dir
    .join(&triple.triple)
    .join("release")
    .join(format!("{}{}", target.name, triple.exe_suffix()))
}

fn tail_lines(text: &str, count: usize) -> String {
  let lines: Vec<&str> = text.lines().collect();
  let start = lines.len().saturating_sub(count);
  lines[start..].join("\n")
}
