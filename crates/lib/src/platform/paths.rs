//! Environment-derived locations and toolchain settings.
//!
//! Every lookup here is evaluated on each call so one process never caches a
//! value across invocations. Empty variables are treated as unset.

use std::path::{Component, Path, PathBuf};

use crate::consts::{ENV_CARGO, ENV_CARGO_TARGET_DIR, ENV_DESTDIR, ENV_PREFIX, ENV_RUST_TARGET, ENV_RUSTC, ENV_RUSTFLAGS};

fn non_empty_var(name: &str) -> Option<String> {
  std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> Option<PathBuf> {
  non_empty_var("USERPROFILE").map(PathBuf::from)
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> Option<PathBuf> {
  non_empty_var("HOME").map(PathBuf::from)
}

/// Per-user toolchain directory, the default install prefix.
pub fn default_prefix() -> PathBuf {
  match home_dir() {
    Some(home) => home.join(".cargo"),
    None => PathBuf::from("/usr/local"),
  }
}

/// Installation prefix: `PREFIX`, falling back to [`default_prefix`].
pub fn prefix() -> PathBuf {
  non_empty_var(ENV_PREFIX).map(PathBuf::from).unwrap_or_else(default_prefix)
}

/// Destination root for staged/packaged installs (`DESTDIR`).
pub fn destdir() -> Option<PathBuf> {
  non_empty_var(ENV_DESTDIR).map(PathBuf::from)
}

/// Compose `<destdir><prefix>`, the way `$(DESTDIR)$(PREFIX)` concatenates.
///
/// The prefix's root and drive components are dropped so it nests under the
/// destination root instead of replacing it.
pub fn compose_destdir(destdir: Option<&Path>, prefix: &Path) -> PathBuf {
  match destdir {
    None => prefix.to_path_buf(),
    Some(root) => {
      let relative: PathBuf = prefix
        .components()
        .filter(|c| !matches!(c, Component::Prefix(_) | Component::RootDir))
        .collect();
      root.join(relative)
    }
  }
}

/// Toolchain output root override (`CARGO_TARGET_DIR`).
pub fn target_dir_override() -> Option<PathBuf> {
  non_empty_var(ENV_CARGO_TARGET_DIR).map(PathBuf::from)
}

/// Target triple override (`RUST_TARGET`).
pub fn triple_override() -> Option<String> {
  non_empty_var(ENV_RUST_TARGET)
}

/// Extra compiler flags, forwarded to the toolchain untouched.
pub fn rustflags() -> Option<String> {
  non_empty_var(ENV_RUSTFLAGS)
}

/// Build driver program (`CARGO`, default `cargo`).
pub fn cargo_program() -> String {
  non_empty_var(ENV_CARGO).unwrap_or_else(|| "cargo".to_string())
}

/// Compiler program queried for the host triple (`RUSTC`, default `rustc`).
pub fn rustc_program() -> String {
  non_empty_var(ENV_RUSTC).unwrap_or_else(|| "rustc".to_string())
}
