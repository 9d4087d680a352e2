//! stagebin-lib: build orchestration for multi-program Rust workspaces
//!
//! A workspace declares its programs in `stagebin.toml`. For each one this
//! crate decides whether the staged binary is out of date, drives the
//! toolchain to rebuild it, stages the result at a stable path and installs or
//! removes it under a prefix:
//! - `workspace`: the build graph, loaded and validated from configuration
//! - `deps` / `stale`: per-target dependency sets and the rebuild decision
//! - `build`: toolchain invocation and staging
//! - `install`: copying staged binaries into `<destdir><prefix>/bin`
//! - `execute`: running a verb over many targets in parallel

pub mod build;
pub mod consts;
pub mod deps;
pub mod error;
pub mod execute;
pub mod install;
pub mod lock;
pub mod platform;
pub mod stale;
pub mod util;
pub mod workspace;
