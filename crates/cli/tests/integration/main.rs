//! End-to-end tests driving the stagebin binary against a stand-in toolchain.

#![cfg(unix)]

mod build_tests;
mod common;
mod install_tests;
mod status_tests;
