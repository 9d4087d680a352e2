//! Implementation of `stagebin build`, the default command.

use anyhow::Result;

use stagebin_lib::build::BuildOutcome;
use stagebin_lib::execute::{TargetOutcome, Verb};

use super::{GlobalOptions, finish, run_verb};
use crate::output::{format_duration, print_info, print_success};

/// Rebuild stale targets and stage their artifacts.
///
/// Prints one line per target: how long the rebuild took and why it was
/// needed, or that the staged artifact is already current.
pub fn cmd_build(options: &GlobalOptions, targets: &[String]) -> Result<i32> {
  let report = run_verb(options, Verb::Build, targets)?;

  if !options.format.is_json() {
    if let Some(triple) = &report.triple {
      print_info(&format!("Target triple: {triple}"));
    }
    for target in &report.targets {
      match &target.result {
        Ok(TargetOutcome::Build(BuildOutcome::Built { reason, duration })) => print_success(&format!(
          "{} built in {} ({})",
          target.name,
          format_duration(*duration),
          reason.label()
        )),
        Ok(TargetOutcome::Build(BuildOutcome::UpToDate)) => print_info(&format!("{} is up to date", target.name)),
        _ => {}
      }
    }
  }

  finish(options, &report)
}
