//! Build and clean command integration tests.

use predicates::prelude::*;

use super::common::{TRIPLE, TestEnv};

#[test]
fn default_command_builds_everything() {
  let env = TestEnv::with_targets(&["zkas", "taud", "lilith"]);

  env
    .stagebin_cmd()
    .assert()
    .success()
    .stdout(predicate::str::contains("zkas built").and(predicate::str::contains("lilith built")));

  for name in ["zkas", "taud", "lilith"] {
    assert!(env.staged(name).is_file(), "{name} was not staged");
  }
  assert_eq!(env.invocations().len(), 3);
}

#[test]
fn second_build_is_up_to_date() {
  let env = TestEnv::with_targets(&["zkas"]);

  env.stagebin_cmd().arg("build").assert().success();
  env
    .stagebin_cmd()
    .arg("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("zkas is up to date"));

  assert_eq!(env.invocations(), vec![format!("zkas {TRIPLE}")]);
}

#[test]
fn shared_source_change_rebuilds_dependents() {
  let env = TestEnv::with_targets(&["zkas", "taud"]);
  env.stagebin_cmd().assert().success();

  env.touch_future("src/util/mod.rs");
  env.stagebin_cmd().arg("build").arg("taud").assert().success();

  assert_eq!(env.invocations().len(), 3);
  assert_eq!(env.invocations()[2], format!("taud {TRIPLE}"));
}

#[test]
fn rustflags_and_target_flag_are_forwarded() {
  let env = TestEnv::with_targets(&["vanityaddr"]);

  env
    .stagebin_cmd()
    .arg("--target")
    .arg("aarch64-unknown-linux-gnu")
    .env("RUSTFLAGS", "-C target-cpu=native")
    .assert()
    .success()
    .stdout(predicate::str::contains("aarch64-unknown-linux-gnu"));

  assert_eq!(
    env.invocations(),
    vec!["vanityaddr aarch64-unknown-linux-gnu -C target-cpu=native"]
  );
}

#[test]
fn toolchain_failure_propagates_exit_code() {
  let env = TestEnv::with_targets(&["zkas", "taud"]);
  env.fail("zkas");

  env
    .stagebin_cmd()
    .assert()
    .code(101)
    .stderr(predicate::str::contains("zkas").and(predicate::str::contains("could not compile")));

  assert!(!env.staged("zkas").exists());
  assert!(env.staged("taud").is_file(), "other targets still build");
}

#[test]
fn clean_removes_only_staged_artifacts() {
  let env = TestEnv::with_targets(&["lilith"]);
  env.stagebin_cmd().assert().success();

  env
    .stagebin_cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Removed lilith"));

  assert!(!env.staged("lilith").exists());
  assert!(env.root.join("target").join(TRIPLE).join("release/lilith").is_file());

  env
    .stagebin_cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("lilith is not staged"));
}

#[test]
fn root_flag_works_from_another_directory() {
  let env = TestEnv::with_targets(&["zkas"]);

  env
    .stagebin_cmd()
    .current_dir(env.temp.path())
    .arg("-C")
    .arg(&env.root)
    .arg("build")
    .assert()
    .success();

  assert!(env.staged("zkas").is_file());
}
