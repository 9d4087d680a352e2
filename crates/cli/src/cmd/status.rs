//! Status command implementation.
//!
//! Displays, per target, whether the staged artifact is current and whether
//! an installed copy exists. Nothing is built.

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};

use stagebin_lib::execute::{TargetOutcome, TargetStatus, Verb};
use stagebin_lib::stale::Staleness;

use super::{GlobalOptions, finish, run_verb};
use crate::output::{print_stat, symbols};

pub fn cmd_status(options: &GlobalOptions, targets: &[String]) -> Result<i32> {
  let report = run_verb(options, Verb::Status, targets)?;

  if !options.format.is_json() {
    for target in &report.targets {
      if let Ok(TargetOutcome::Status(status)) = &target.result {
        print_status(&target.name, status);
      }
    }
  }

  finish(options, &report)
}

fn print_status(name: &str, status: &TargetStatus) {
  let marker = match status.staleness {
    Staleness::Fresh => symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()).to_string(),
    Staleness::Missing => symbols::MINUS.if_supports_color(Stream::Stdout, |s| s.red()).to_string(),
    Staleness::Outdated { .. } => symbols::TILDE.if_supports_color(Stream::Stdout, |s| s.yellow()).to_string(),
  };
  println!("{marker} {name} ({})", status.staleness.label());

  if let Staleness::Outdated { newest } = &status.staleness {
    print_stat("Changed", &newest.display().to_string());
  }
  print_stat("Dependencies", &status.dependencies.to_string());
  print_stat("Staged", &status.staged.display().to_string());
  match &status.installed {
    Some(path) => print_stat("Installed", &path.display().to_string()),
    None => print_stat("Installed", "no"),
  }
}
