//! Status command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn status_reports_missing_without_building() {
  let env = TestEnv::with_targets(&["zkas"]);

  env
    .stagebin_cmd()
    .arg("status")
    .assert()
    .success()
    .stdout(predicate::str::contains("zkas (missing)"));

  assert!(env.invocations().is_empty());
  assert!(!env.staged("zkas").exists());
}

#[test]
fn status_tracks_changes_after_build() {
  let env = TestEnv::with_targets(&["taud"]);
  env.stagebin_cmd().assert().success();

  env
    .stagebin_cmd()
    .arg("status")
    .assert()
    .success()
    .stdout(predicate::str::contains("taud (fresh)"));

  env.touch_future("bin/taud/src/main.rs");
  env
    .stagebin_cmd()
    .arg("status")
    .assert()
    .success()
    .stdout(predicate::str::contains("taud (outdated)").and(predicate::str::contains("main.rs")));
}

#[test]
fn status_json_is_machine_readable() {
  let env = TestEnv::with_targets(&["zkas", "lilith"]);
  env.stagebin_cmd().arg("install").arg("lilith").assert().success();

  let output = env
    .stagebin_cmd()
    .arg("status")
    .arg("--output")
    .arg("json")
    .output()
    .unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["verb"], "status");
  assert_eq!(json["targets"][0]["name"], "zkas");
  assert_eq!(json["targets"][0]["outcome"]["staleness"]["state"], "missing");
  assert!(json["targets"][0]["outcome"]["installed"].is_null());
  assert_eq!(json["targets"][1]["outcome"]["staleness"]["state"], "fresh");
  assert_eq!(json["targets"][1]["outcome"]["dependencies"], 4);
}

#[test]
fn build_json_reports_failure() {
  let env = TestEnv::with_targets(&["zkas"]);
  env.fail("zkas");

  let output = env.stagebin_cmd().args(["--output", "json", "build"]).output().unwrap();
  assert_eq!(output.status.code(), Some(101));

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["targets"][0]["ok"], false);
  assert_eq!(json["targets"][0]["error"]["stage"], "build");
  assert_eq!(json["targets"][0]["error"]["exit_code"], 101);
  assert_eq!(json["triple"]["triple"], "x86_64-unknown-linux-gnu");
}
