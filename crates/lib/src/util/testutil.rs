//! Test utilities for stagebin-lib.
//!
//! `FakeWorkspace` lays out a throwaway multi-program workspace in a temp
//! directory, and `fake_cargo` writes a shell script standing in for the
//! toolchain so pipeline tests never run a real compiler.

use std::cell::RefCell;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tempfile::TempDir;
use walkdir::WalkDir;

use crate::consts::CONFIG_FILENAME;
use crate::workspace::Workspace;

/// Set a file's modification time to `secs` after the Unix epoch.
pub fn set_mtime(path: &Path, secs: u64) {
  let file = File::options().write(true).open(path).unwrap();
  file.set_modified(UNIX_EPOCH + Duration::from_secs(secs)).unwrap();
}

pub fn mtime(path: &Path) -> SystemTime {
  std::fs::metadata(path).unwrap().modified().unwrap()
}

pub struct FakeWorkspace {
  _temp: TempDir,
  root: PathBuf,
  config: RefCell<String>,
}

impl FakeWorkspace {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let root = dunce::canonicalize(temp.path()).unwrap();
    let fake = Self {
      _temp: temp,
      root,
      config: RefCell::new(String::new()),
    };
    fake.write("Cargo.toml", "[workspace]\nmembers = [\"bin/*\"]\n");
    fake
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn path(&self, relative: &str) -> PathBuf {
    self.root.join(relative)
  }

  /// Write a file relative to the workspace root, creating parent directories.
  pub fn write(&self, relative: &str, content: &str) {
    let path = self.path(relative);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Declare a target at `bin/<name>` with a manifest and a `src/main.rs`.
  pub fn add_target(&self, name: &str, shared: &[&str]) {
    self.add_package_target(name, name, shared);
  }

  /// Declare a target whose binary `name` lives in a package named `package`.
  pub fn add_package_target(&self, name: &str, package: &str, shared: &[&str]) {
    self.write(
      &format!("bin/{name}/Cargo.toml"),
      &format!("[package]\nname = \"{package}\"\nversion = \"0.1.0\"\n"),
    );
    self.write(&format!("bin/{name}/src/main.rs"), "fn main() {}\n");

    let shared = shared.iter().map(|s| format!("\"{s}\"")).collect::<Vec<_>>().join(", ");
    let mut config = self.config.borrow_mut();
    config.push_str(&format!("\n[[target]]\nname = \"{name}\"\npath = \"bin/{name}\"\nshared = [{shared}]\n"));
    if package != name {
      config.push_str(&format!("package = \"{package}\"\n"));
    }
    std::fs::write(self.path(CONFIG_FILENAME), config.as_str()).unwrap();
  }

  /// Set every source and manifest file in the workspace to the same mtime.
  pub fn touch_all(&self, secs: u64) {
    for entry in WalkDir::new(&self.root).into_iter().filter_map(|e| e.ok()) {
      let rel = entry.path().strip_prefix(&self.root).unwrap();
      let generated = rel.starts_with("target") || rel.starts_with(".stagebin") || rel.starts_with("toolchain");
      if entry.file_type().is_file() && !generated {
        set_mtime(entry.path(), secs);
      }
    }
  }

  pub fn load(&self) -> Workspace {
    Workspace::load(&self.root).unwrap()
  }
}

/// Writes a stand-in for `cargo build` into `<root>/toolchain/cargo`.
///
/// The script records each invocation in `toolchain/invocations.log`, fails
/// with exit code 101 for any package that has a `toolchain/fail-<package>`
/// marker, and otherwise writes `<CARGO_TARGET_DIR>/<triple>/release/<bin>`.
#[cfg(unix)]
pub fn fake_cargo(root: &Path) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  const SCRIPT: &str = r#"#!/bin/sh
dir="$(cd "$(dirname "$0")" && pwd)"
triple=""
package=""
bin=""
while [ $# -gt 0 ]; do
  case "$1" in
    --target) triple="$2"; shift 2 ;;
    --package) package="$2"; shift 2 ;;
    --bin) bin="$2"; shift 2 ;;
    *) shift ;;
  esac
done
echo "$package $triple ${RUSTFLAGS:-}" >> "$dir/invocations.log"
if [ -e "$dir/fail-$package" ]; then
  echo "error: could not compile \`$package\`" >&2
  exit 101
fi
out="${CARGO_TARGET_DIR:-target}/$triple/release"
mkdir -p "$out"
printf '#!/bin/sh\necho %s %s\n' "$package" "$(cat "$dir/version-$package" 2>/dev/null || echo 1)" > "$out/${bin:-$package}"
"#;

  let dir = root.join("toolchain");
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("cargo");
  std::fs::write(&path, SCRIPT).unwrap();
  std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
  path
}

/// Invocations recorded by [`fake_cargo`], one `"<package> <triple> <rustflags>"` line each.
#[cfg(unix)]
pub fn cargo_invocations(root: &Path) -> Vec<String> {
  std::fs::read_to_string(root.join("toolchain").join("invocations.log"))
    .map(|log| log.lines().map(|l| l.trim_end().to_string()).collect())
    .unwrap_or_default()
}
