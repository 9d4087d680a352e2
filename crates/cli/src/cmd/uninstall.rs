//! Implementation of `stagebin uninstall`.

use anyhow::Result;

use stagebin_lib::execute::{TargetOutcome, Verb};
use stagebin_lib::install::UninstallOutcome;

use super::{GlobalOptions, finish, run_verb};
use crate::output::{print_info, print_success};

/// Remove installed copies. Targets that were never installed are reported, not failed.
pub fn cmd_uninstall(options: &GlobalOptions, targets: &[String]) -> Result<i32> {
  let report = run_verb(options, Verb::Uninstall, targets)?;

  if !options.format.is_json() {
    for target in &report.targets {
      match &target.result {
        Ok(TargetOutcome::Uninstall(UninstallOutcome::Removed(path))) => {
          print_success(&format!("Removed {}", path.display()))
        }
        Ok(TargetOutcome::Uninstall(UninstallOutcome::NotInstalled)) => {
          print_info(&format!("{} is not installed", target.name))
        }
        _ => {}
      }
    }
  }

  finish(options, &report)
}
