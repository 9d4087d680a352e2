//! Install and uninstall command integration tests.

use std::os::unix::fs::PermissionsExt;

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn install_builds_then_installs() {
  let env = TestEnv::with_targets(&["zkas"]);

  env
    .stagebin_cmd()
    .arg("install")
    .assert()
    .success()
    .stdout(predicate::str::contains("built in"));

  let installed = env.installed("zkas");
  assert!(installed.is_file());
  let mode = std::fs::metadata(&installed).unwrap().permissions().mode();
  assert_eq!(mode & 0o777, 0o755);
  assert_eq!(std::fs::read(&installed).unwrap(), std::fs::read(env.staged("zkas")).unwrap());
}

#[test]
fn install_twice_invokes_toolchain_once() {
  let env = TestEnv::with_targets(&["taud"]);

  env.stagebin_cmd().arg("install").assert().success();
  let first = std::fs::read(env.installed("taud")).unwrap();

  env
    .stagebin_cmd()
    .arg("install")
    .assert()
    .success()
    .stdout(predicate::str::contains("built in").not());

  assert_eq!(env.invocations().len(), 1);
  assert_eq!(std::fs::read(env.installed("taud")).unwrap(), first);
}

#[test]
fn destdir_is_prepended_to_prefix() {
  let env = TestEnv::with_targets(&["lilith"]);
  let destdir = env.temp.path().join("pkgroot");

  env
    .stagebin_cmd()
    .arg("install")
    .env("DESTDIR", &destdir)
    .env("PREFIX", "/usr/local")
    .assert()
    .success();

  assert!(destdir.join("usr/local/bin/lilith").is_file());
}

#[test]
fn prefix_flag_overrides_environment() {
  let env = TestEnv::with_targets(&["vanityaddr"]);
  let prefix = env.temp.path().join("elsewhere");

  env
    .stagebin_cmd()
    .arg("install")
    .arg("--prefix")
    .arg(&prefix)
    .assert()
    .success();

  assert!(prefix.join("bin/vanityaddr").is_file());
  assert!(!env.installed("vanityaddr").exists());
}

#[test]
fn uninstall_is_idempotent() {
  let env = TestEnv::with_targets(&["zkas"]);
  env.stagebin_cmd().arg("install").assert().success();

  env
    .stagebin_cmd()
    .arg("uninstall")
    .assert()
    .success()
    .stdout(predicate::str::contains("Removed"));
  assert!(!env.installed("zkas").exists());
  assert!(env.staged("zkas").is_file());

  env
    .stagebin_cmd()
    .arg("uninstall")
    .assert()
    .success()
    .stdout(predicate::str::contains("zkas is not installed"));
}

#[test]
fn failed_target_does_not_block_installing_others() {
  let env = TestEnv::with_targets(&["zkas", "taud"]);
  env.fail("zkas");

  env.stagebin_cmd().arg("install").assert().code(101);

  assert!(!env.installed("zkas").exists());
  assert!(env.installed("taud").is_file());
}

#[test]
fn clean_then_install_rebuilds() {
  let env = TestEnv::with_targets(&["lilith"]);
  env.stagebin_cmd().arg("install").assert().success();
  env.stagebin_cmd().arg("clean").assert().success();

  env.stagebin_cmd().arg("install").arg("lilith").assert().success();

  assert_eq!(env.invocations().len(), 2);
  assert!(env.staged("lilith").is_file());
}
