//! Implementation of `stagebin clean`.

use anyhow::Result;

use stagebin_lib::execute::{TargetOutcome, Verb};

use super::{GlobalOptions, finish, run_verb};
use crate::output::{print_info, print_success};

/// Remove staged artifacts. Toolchain output and installed copies are kept.
pub fn cmd_clean(options: &GlobalOptions, targets: &[String]) -> Result<i32> {
  let report = run_verb(options, Verb::Clean, targets)?;

  if !options.format.is_json() {
    for target in &report.targets {
      match &target.result {
        Ok(TargetOutcome::Clean { removed: true }) => print_success(&format!("Removed {}", target.name)),
        Ok(TargetOutcome::Clean { removed: false }) => print_info(&format!("{} is not staged", target.name)),
        _ => {}
      }
    }
  }

  finish(options, &report)
}
