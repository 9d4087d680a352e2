mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use output::{OutputFormat, print_error};

/// stagebin - build, stage and install every program in a Rust workspace
#[derive(Parser)]
#[command(name = "stagebin")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Workspace root (default: current directory)
  #[arg(short = 'C', long, global = true, value_name = "DIR")]
  root: Option<PathBuf>,

  /// Configuration file (default: <root>/stagebin.toml)
  #[arg(long, global = true, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Number of targets processed in parallel (default: available CPUs)
  #[arg(short, long, global = true, value_name = "N")]
  jobs: Option<usize>,

  /// Target triple, overriding RUST_TARGET and the toolchain host
  #[arg(long, global = true, value_name = "TRIPLE")]
  target: Option<String>,

  /// Installation prefix, overriding PREFIX
  #[arg(long, global = true, value_name = "DIR")]
  prefix: Option<PathBuf>,

  /// Staging root prepended to the prefix, overriding DESTDIR
  #[arg(long, global = true, value_name = "DIR")]
  destdir: Option<PathBuf>,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Option<Commands>,

  /// Targets to build when no command is given (default: all)
  targets: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
  /// Rebuild and stage targets whose sources changed (default)
  Build {
    /// Targets to build (default: all)
    targets: Vec<String>,
  },

  /// Remove staged artifacts
  Clean {
    /// Targets to clean (default: all)
    targets: Vec<String>,
  },

  /// Build if needed, then copy staged artifacts into <destdir><prefix>/bin
  Install {
    /// Targets to install (default: all)
    targets: Vec<String>,
  },

  /// Remove installed copies
  Uninstall {
    /// Targets to uninstall (default: all)
    targets: Vec<String>,
  },

  /// Show staleness and install state without building
  Status {
    /// Targets to inspect (default: all)
    targets: Vec<String>,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let options = cmd::GlobalOptions {
    root: cli.root,
    config: cli.config,
    jobs: cli.jobs,
    target: cli.target,
    prefix: cli.prefix,
    destdir: cli.destdir,
    format: cli.output,
  };

  let result = match cli.command {
    None => cmd::cmd_build(&options, &cli.targets),
    Some(Commands::Build { targets }) => cmd::cmd_build(&options, &targets),
    Some(Commands::Clean { targets }) => cmd::cmd_clean(&options, &targets),
    Some(Commands::Install { targets }) => cmd::cmd_install(&options, &targets),
    Some(Commands::Uninstall { targets }) => cmd::cmd_uninstall(&options, &targets),
    Some(Commands::Status { targets }) => cmd::cmd_status(&options, &targets),
  };

  match result {
    Ok(code) => exit_code(code),
    Err(e) => {
      print_error(&format!("{e:#}"));
      ExitCode::FAILURE
    }
  }
}

fn init_tracing(verbose: bool) {
  let filter = if verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn exit_code(code: i32) -> ExitCode {
  u8::try_from(code).map(ExitCode::from).unwrap_or(ExitCode::FAILURE)
}
