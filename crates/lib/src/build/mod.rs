//! Building and staging targets.
//!
//! # Submodules
//!
//! - [`invoke`] - Runs the external toolchain
//! - [`stage`] - Moves the toolchain's artifact to the staged path

pub mod invoke;
pub mod stage;

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{PipelineError, StagingError};
use crate::lock::StagingLock;
use crate::platform::ToolchainTarget;
use crate::stale::{self, Staleness};
use crate::workspace::{BuildTarget, Workspace};

pub use invoke::{Toolchain, toolchain_output};
pub use stage::{clean, stage_artifact};

/// What `ensure_built` did for a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum BuildOutcome {
  /// The toolchain ran and the artifact was staged.
  Built {
    reason: Staleness,
    #[serde(serialize_with = "serialize_millis")]
    duration: Duration,
  },
  /// The staged artifact was already fresh.
  UpToDate,
}

impl BuildOutcome {
  pub fn was_built(&self) -> bool {
    matches!(self, BuildOutcome::Built { .. })
  }
}

fn serialize_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.serialize_u128(duration.as_millis())
}

/// Build `target` if its staged artifact is stale.
///
/// Staleness is checked, then re-checked under the target's staging lock,
/// so a concurrent invocation that just staged the same target is not
/// repeated.
pub async fn ensure_built(
  ws: &Workspace,
  target: &BuildTarget,
  triple: &ToolchainTarget,
  toolchain: &Toolchain,
) -> Result<BuildOutcome, PipelineError> {
  if !stale::staleness(ws, target)?.is_stale() {
    debug!(target = %target.name, "staged artifact is up to date");
    return Ok(BuildOutcome::UpToDate);
  }

  let _lock = StagingLock::acquire_async(ws.lock_dir(), target.name.clone()).await?;

  let reason = stale::staleness(ws, target)?;
  if !reason.is_stale() {
    info!(target = %target.name, "staged by a concurrent build");
    return Ok(BuildOutcome::UpToDate);
  }

  info!(target = %target.name, reason = reason.label(), "rebuilding");
  let started = Instant::now();
  build(ws, target, triple, toolchain).await?;

  Ok(BuildOutcome::Built {
    reason,
    duration: started.elapsed(),
  })
}

/// Run the toolchain for `target` and stage the result. Unconditional.
///
/// A failed toolchain run returns before anything is copied, so the previous
/// staged artifact survives.
pub async fn build(
  ws: &Workspace,
  target: &BuildTarget,
  triple: &ToolchainTarget,
  toolchain: &Toolchain,
) -> Result<PathBuf, PipelineError> {
  toolchain.build(ws, target, triple).await?;

  let produced = toolchain_output(ws, target, triple);
  let staged = target.output.clone();
  let staged_for_task = staged.clone();

  tokio::task::spawn_blocking(move || stage_artifact(&produced, &staged_for_task))
    .await
    .map_err(|e| StagingError::Copy {
      from: toolchain_output(ws, target, triple),
      to: staged.clone(),
      source: io::Error::other(e),
    })??;

  Ok(staged)
}
