//! Per-target pipeline execution.
//!
//! Targets are independent: each selected target gets its own task, and a
//! semaphore bounds how many run at once. A failure in one target is recorded
//! in its report and never cancels or skips the others.

pub mod types;

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::build::{self, ensure_built};
use crate::deps::DependencySet;
use crate::error::{ConfigError, PipelineError};
use crate::install;
use crate::platform::ToolchainTarget;
use crate::stale::Staleness;
use crate::workspace::{BuildTarget, Workspace};

pub use types::{ExecuteConfig, RunReport, TargetOutcome, TargetReport, TargetStatus, Verb, num_cpus};

/// Run `verb` over `targets`.
///
/// Configuration problems in any selected target (missing source
/// directories, empty dependency sets, an unresolvable triple) abort the
/// whole run before the toolchain is invoked. Everything after that is
/// reported per target.
pub async fn run(
  ws: Arc<Workspace>,
  targets: Vec<BuildTarget>,
  verb: Verb,
  config: &ExecuteConfig,
) -> Result<RunReport, ConfigError> {
  info!(verb = %verb, targets = targets.len(), parallelism = config.parallelism, "starting run");

  let triple = if verb.needs_toolchain() {
    for target in &targets {
      DependencySet::collect(&ws, target)?;
    }
    Some(ToolchainTarget::resolve(config.triple.as_deref()).await?)
  } else {
    None
  };

  let semaphore = Arc::new(Semaphore::new(config.parallelism.max(1)));
  let config = Arc::new(config.clone());
  let mut join_set = JoinSet::new();

  for (index, target) in targets.iter().cloned().enumerate() {
    let ws = ws.clone();
    let config = config.clone();
    let triple = triple.clone();
    let semaphore = semaphore.clone();

    join_set.spawn(async move {
      // The semaphore is never closed, so acquiring only waits.
      let _permit = semaphore.acquire().await;
      let result = run_target(&ws, &target, verb, triple.as_ref(), &config).await;
      (index, result)
    });
  }

  let mut results: Vec<Option<Result<TargetOutcome, PipelineError>>> = targets.iter().map(|_| None).collect();

  while let Some(joined) = join_set.join_next().await {
    match joined {
      Ok((index, result)) => results[index] = Some(result),
      Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
      Err(e) => error!(error = %e, "target task was cancelled"),
    }
  }

  let reports = collect_reports(targets, results);

  let report = RunReport {
    verb,
    triple,
    targets: reports,
  };

  info!(
    verb = %verb,
    succeeded = report.targets.iter().filter(|t| t.is_success()).count(),
    failed = report.failures().count(),
    "run complete"
  );

  Ok(report)
}

/// Pair each target with its task result, in declaration order. A target
/// whose task never reported back is recorded as cancelled.
fn collect_reports(
  targets: Vec<BuildTarget>,
  results: Vec<Option<Result<TargetOutcome, PipelineError>>>,
) -> Vec<TargetReport> {
  targets
    .into_iter()
    .zip(results)
    .map(|(target, result)| {
      let result = result.unwrap_or_else(|| Err(PipelineError::Cancelled(target.name.clone())));
      if let Err(e) = &result {
        debug!(target = %target.name, stage = e.stage(), error = %e, "target failed");
      }
      TargetReport {
        name: target.name,
        result,
      }
    })
    .collect()
}

/// Run one verb for one target.
async fn run_target(
  ws: &Workspace,
  target: &BuildTarget,
  verb: Verb,
  triple: Option<&ToolchainTarget>,
  config: &ExecuteConfig,
) -> Result<TargetOutcome, PipelineError> {
  match (verb, triple) {
    (Verb::Build, Some(triple)) => {
      let outcome = ensure_built(ws, target, triple, &config.toolchain).await?;
      Ok(TargetOutcome::Build(outcome))
    }
    (Verb::Install, Some(triple)) => {
      let outcome = install::install(ws, target, &config.layout, triple, &config.toolchain).await?;
      Ok(TargetOutcome::Install(outcome))
    }
    (Verb::Build | Verb::Install, None) => Err(
      ConfigError::TripleQuery {
        program: config.toolchain.program.clone(),
        message: "no target triple resolved".to_string(),
      }
      .into(),
    ),
    (Verb::Clean, _) => {
      let removed = build::clean(target)?;
      Ok(TargetOutcome::Clean { removed })
    }
    (Verb::Uninstall, _) => {
      let outcome = install::uninstall(target, &config.layout)?;
      Ok(TargetOutcome::Uninstall(outcome))
    }
    (Verb::Status, _) => Ok(TargetOutcome::Status(status(ws, target, config)?)),
  }
}

/// Compute a target's status without building it.
pub fn status(ws: &Workspace, target: &BuildTarget, config: &ExecuteConfig) -> Result<TargetStatus, ConfigError> {
  let deps = DependencySet::collect(ws, target)?;
  let installed = config.layout.installed_path(target);

  Ok(TargetStatus {
    staleness: Staleness::of(&deps, &target.output),
    dependencies: deps.len(),
    staged: target.output.clone(),
    installed: installed.is_file().then_some(installed),
  })
}
