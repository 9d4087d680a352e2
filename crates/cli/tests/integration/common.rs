//! Shared test helpers for CLI integration tests.

use std::fs::File;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

pub const TRIPLE: &str = "x86_64-unknown-linux-gnu";

/// Records each invocation, fails with 101 when `fail-<package>` exists, and
/// otherwise writes `<CARGO_TARGET_DIR>/<triple>/release/<bin>`.
const FAKE_CARGO: &str = r#"#!/bin/sh
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
printf '#!/bin/sh\necho %s\n' "$package" > "$out/${bin:-$package}"
"#;

/// Isolated workspace, toolchain and install prefix.
///
/// Each test gets its own temporary directory containing a workspace with a
/// shared `src/util` module, a fake `cargo`, and an install prefix.
pub struct TestEnv {
  pub temp: TempDir,
  pub root: PathBuf,
}

impl TestEnv {
  /// A workspace declaring `names`, each depending on `src/util`.
  pub fn with_targets(names: &[&str]) -> Self {
    let temp = TempDir::new().unwrap();
    let root = dunce::canonicalize(temp.path()).unwrap().join("ws");
    let env = Self { temp, root };

    env.write_file("Cargo.toml", "[workspace]\nmembers = [\"bin/*\"]\n");
    env.write_file("src/util/mod.rs", "pub fn shared() {}\n");

    let mut config = String::new();
    for name in names {
      env.write_file(
        &format!("bin/{name}/Cargo.toml"),
        &format!("[package]\nname = \"{name}\"\nversion = \"0.1.0\"\n"),
      );
      env.write_file(&format!("bin/{name}/src/main.rs"), "fn main() {}\n");
      config.push_str(&format!(
        "\n[[target]]\nname = \"{name}\"\npath = \"bin/{name}\"\nshared = [\"src/util\"]\n"
      ));
    }
    env.write_file("stagebin.toml", &config);

    let toolchain = env.toolchain_dir();
    std::fs::create_dir_all(&toolchain).unwrap();
    let cargo = toolchain.join("cargo");
    std::fs::write(&cargo, FAKE_CARGO).unwrap();
    std::fs::set_permissions(&cargo, std::fs::Permissions::from_mode(0o755)).unwrap();

    env
  }

  /// Write a file relative to the workspace root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.root.join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Mark a workspace file as modified an hour from now.
  pub fn touch_future(&self, relative_path: &str) {
    let file = File::options().write(true).open(self.root.join(relative_path)).unwrap();
    file
      .set_modified(SystemTime::now() + Duration::from_secs(3600))
      .unwrap();
  }

  pub fn toolchain_dir(&self) -> PathBuf {
    self.temp.path().join("toolchain")
  }

  pub fn prefix(&self) -> PathBuf {
    self.temp.path().join("prefix")
  }

  pub fn staged(&self, name: &str) -> PathBuf {
    self.root.join(name)
  }

  pub fn installed(&self, name: &str) -> PathBuf {
    self.prefix().join("bin").join(name)
  }

  /// Make the fake toolchain fail for `package`.
  pub fn fail(&self, package: &str) {
    std::fs::write(self.toolchain_dir().join(format!("fail-{package}")), "").unwrap();
  }

  /// Toolchain invocations so far, as `"<package> <triple> <rustflags>"`.
  pub fn invocations(&self) -> Vec<String> {
    read_lines(&self.toolchain_dir().join("invocations.log"))
  }

  /// Get a pre-configured Command for the stagebin binary.
  ///
  /// Sets environment variables for isolated testing:
  /// - `CARGO`: the fake toolchain
  /// - `RUST_TARGET`: a fixed triple, so `rustc` is never queried
  /// - `PREFIX`: an isolated install prefix
  ///
  /// and clears `DESTDIR`, `RUSTFLAGS` and `CARGO_TARGET_DIR`.
  pub fn stagebin_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("stagebin");
    cmd.current_dir(&self.root);
    cmd.env("CARGO", self.toolchain_dir().join("cargo"));
    cmd.env("RUST_TARGET", TRIPLE);
    cmd.env("PREFIX", self.prefix());
    cmd.env_remove("DESTDIR");
    cmd.env_remove("RUSTFLAGS");
    cmd.env_remove("CARGO_TARGET_DIR");
    cmd.env_remove("RUST_LOG");
    cmd
  }
}

fn read_lines(path: &Path) -> Vec<String> {
  std::fs::read_to_string(path)
    .map(|log| log.lines().map(|l| l.trim_end().to_string()).collect())
    .unwrap_or_default()
}
