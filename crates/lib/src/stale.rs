//! Rebuild decision.
//!
//! A target is stale when its staged artifact is missing, or when any file in
//! its dependency set was modified strictly after the artifact. Equal
//! timestamps count as fresh: on filesystems with coarse timestamp resolution
//! a build that finishes in the same tick as the last edit is not redone.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::deps::DependencySet;
use crate::error::ConfigError;
use crate::workspace::{BuildTarget, Workspace};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Staleness {
  /// The staged artifact does not exist.
  Missing,
  /// `newest` was modified after the staged artifact.
  Outdated { newest: PathBuf },
  /// Nothing changed since the artifact was staged.
  Fresh,
}

impl Staleness {
  /// Compare a dependency set against the artifact at `output`.
  pub fn of(deps: &DependencySet, output: &Path) -> Self {
    let artifact_time = match fs::metadata(output).and_then(|m| m.modified()) {
      Ok(time) => time,
      Err(e) => {
        if e.kind() != io::ErrorKind::NotFound {
          warn!(path = %output.display(), error = %e, "cannot read artifact timestamp, treating as missing");
        }
        return Staleness::Missing;
      }
    };

    match deps.newest() {
      Some(newest) if newest.modified > artifact_time => Staleness::Outdated {
        newest: newest.path.clone(),
      },
      _ => Staleness::Fresh,
    }
  }

  pub fn is_stale(&self) -> bool {
    !matches!(self, Staleness::Fresh)
  }

  pub fn label(&self) -> &'static str {
    match self {
      Staleness::Missing => "missing",
      Staleness::Outdated { .. } => "outdated",
      Staleness::Fresh => "fresh",
    }
  }
}

/// Enumerate `target`'s dependencies and compare them against its staged artifact.
///
/// Configuration problems (missing directories, no sources) are reported
/// even when the artifact is absent.
pub fn staleness(ws: &Workspace, target: &BuildTarget) -> Result<Staleness, ConfigError> {
  let deps = DependencySet::collect(ws, target)?;
  let state = Staleness::of(&deps, &target.output);
  debug!(target = %target.name, state = state.label(), "checked staleness");
  Ok(state)
}

/// Whether `target` must be rebuilt.
pub fn needs_rebuild(ws: &Workspace, target: &BuildTarget) -> Result<bool, ConfigError> {
  staleness(ws, target).map(|s| s.is_stale())
}
