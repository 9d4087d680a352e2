//! Implementation of `stagebin install`.

use anyhow::Result;

use stagebin_lib::build::BuildOutcome;
use stagebin_lib::execute::{TargetOutcome, Verb};

use super::{GlobalOptions, finish, run_verb};
use crate::output::{format_duration, print_success, symbols};

/// Build stale targets, then copy every staged artifact into `<destdir><prefix>/bin`.
pub fn cmd_install(options: &GlobalOptions, targets: &[String]) -> Result<i32> {
  let report = run_verb(options, Verb::Install, targets)?;

  if !options.format.is_json() {
    for target in &report.targets {
      if let Ok(TargetOutcome::Install(outcome)) = &target.result {
        let built = match &outcome.build {
          BuildOutcome::Built { duration, .. } => format!(" (built in {})", format_duration(*duration)),
          BuildOutcome::UpToDate => String::new(),
        };
        print_success(&format!(
          "{} {} {}{}",
          target.name,
          symbols::ARROW,
          outcome.installed.display(),
          built
        ));
      }
    }
  }

  finish(options, &report)
}
