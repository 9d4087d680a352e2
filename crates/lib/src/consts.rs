/// Build graph configuration file, looked up at the workspace root.
pub const CONFIG_FILENAME: &str = "stagebin.toml";

/// Per-workspace state directory (relative to the workspace root).
pub const STATE_DIRNAME: &str = ".stagebin";

/// Manifest filename used for both the workspace root and each target.
pub const DEFAULT_MANIFEST: &str = "Cargo.toml";

/// Default toolchain output root (relative to the workspace root).
pub const DEFAULT_TARGET_DIR: &str = "target";

/// Source file extensions recognized when no `extensions` list is configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["rs"];

/// Mode applied to installed binaries.
pub const INSTALL_MODE: u32 = 0o755;

pub const ENV_RUSTFLAGS: &str = "RUSTFLAGS";
pub const ENV_PREFIX: &str = "PREFIX";
pub const ENV_DESTDIR: &str = "DESTDIR";
pub const ENV_RUST_TARGET: &str = "RUST_TARGET";
pub const ENV_CARGO: &str = "CARGO";
pub const ENV_RUSTC: &str = "RUSTC";
pub const ENV_CARGO_TARGET_DIR: &str = "CARGO_TARGET_DIR";
