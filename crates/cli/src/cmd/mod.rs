mod build;
mod clean;
mod install;
mod status;
mod uninstall;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use stagebin_lib::consts::CONFIG_FILENAME;
use stagebin_lib::execute::{self, ExecuteConfig, RunReport, Verb};
use stagebin_lib::install::InstallLayout;
use stagebin_lib::platform::paths;
use stagebin_lib::workspace::Workspace;

use crate::output::{OutputFormat, print_error, print_json};

pub use build::cmd_build;
pub use clean::cmd_clean;
pub use install::cmd_install;
pub use status::cmd_status;
pub use uninstall::cmd_uninstall;

/// Options shared by every command.
pub struct GlobalOptions {
  pub root: Option<PathBuf>,
  pub config: Option<PathBuf>,
  pub jobs: Option<usize>,
  pub target: Option<String>,
  pub prefix: Option<PathBuf>,
  pub destdir: Option<PathBuf>,
  pub format: OutputFormat,
}

impl GlobalOptions {
  fn config_path(&self) -> Result<PathBuf> {
    if let Some(config) = &self.config {
      return Ok(config.clone());
    }
    let root = match &self.root {
      Some(root) => root.clone(),
      None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    Ok(root.join(CONFIG_FILENAME))
  }

  fn layout(&self) -> InstallLayout {
    InstallLayout::new(
      self.prefix.clone().unwrap_or_else(paths::prefix),
      self.destdir.clone().or_else(paths::destdir),
    )
  }

  fn execute_config(&self) -> ExecuteConfig {
    let mut config = ExecuteConfig::from_env();
    if let Some(jobs) = self.jobs {
      config.parallelism = jobs.max(1);
    }
    config.triple = self.target.clone();
    config.layout = self.layout();
    config
  }
}

/// Load the workspace, run `verb` over the selected targets and return the report.
fn run_verb(options: &GlobalOptions, verb: Verb, names: &[String]) -> Result<RunReport> {
  let config_path = options.config_path()?;
  let ws = Workspace::load_file(&config_path)
    .with_context(|| format!("Failed to load workspace from {}", config_path.display()))?;
  let targets = ws.select(names)?;
  let config = options.execute_config();
  debug!(root = %ws.root.display(), targets = targets.len(), "loaded workspace");

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt
    .block_on(execute::run(Arc::new(ws), targets, verb, &config))
    .with_context(|| format!("Cannot {verb}"))?;

  Ok(report)
}

/// Print `report` as JSON, or print each failure. Returns the process exit code.
fn finish(options: &GlobalOptions, report: &RunReport) -> Result<i32> {
  if options.format.is_json() {
    print_json(report)?;
  } else {
    for (name, err) in report.failures() {
      print_error(&format!("{name}: {err}"));
    }
  }
  Ok(report.exit_code())
}
