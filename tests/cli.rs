// ABOUTME: Integration tests for the rollplan CLI commands.
// ABOUTME: Validates --help output, init, plan building, and response replay.

use assert_cmd::Command;
use predicates::prelude::*;
use rollplan::plan::DeploymentPlan;
use rollplan::protocol::{ApplierResponse, RemoteError, ResponseWriter, UpdateResult};
use rollplan::types::ServerIdentity;
use std::fs;
use std::path::Path;

fn rollplan_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("rollplan"))
}

/// Write the init template plus the artifact it refers to.
fn init_project(dir: &Path) {
    rollplan_cmd().current_dir(dir).arg("init").assert().success();
    fs::create_dir(dir.join("target")).unwrap();
    fs::write(dir.join("target/my-app.war"), b"archive").unwrap();
}

fn save_plan(dir: &Path) -> DeploymentPlan {
    rollplan_cmd()
        .current_dir(dir)
        .args(["plan", "--output", "plan.json"])
        .assert()
        .success();
    serde_json::from_str(&fs::read_to_string(dir.join("plan.json")).unwrap()).unwrap()
}

#[test]
fn help_shows_commands() {
    rollplan_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("replay"));
}

#[test]
fn init_creates_plan_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let plan_path = temp_dir.path().join("rollplan.yml");

    rollplan_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .success();

    assert!(plan_path.exists(), "rollplan.yml should be created");
    let content = fs::read_to_string(&plan_path).unwrap();
    assert!(content.contains("rollout:"), "Plan should have a rollout");
}

#[test]
fn init_refuses_to_overwrite_existing_plan() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("rollplan.yml"), "sets: []").unwrap();

    rollplan_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn plan_prints_built_plan_as_json() {
    let temp_dir = tempfile::tempdir().unwrap();
    init_project(temp_dir.path());

    rollplan_cmd()
        .current_dir(temp_dir.path())
        .args(["plan", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("main-server-group"))
        .stdout(predicate::str::contains("\"kind\":\"add\""));
}

#[test]
fn plan_without_plan_file_fails() {
    let temp_dir = tempfile::tempdir().unwrap();

    rollplan_cmd()
        .current_dir(temp_dir.path())
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("plan file not found"));
}

#[test]
fn replay_decodes_recorded_response() {
    let temp_dir = tempfile::tempdir().unwrap();
    init_project(temp_dir.path());
    let plan = save_plan(temp_dir.path());

    let set = plan.set_plan();
    let add = set.actions()[0].id();
    let server = ServerIdentity::new("h1", "main-server-group", "server-one");
    let response = ResponseWriter::new(plan.id())
        .set(set.id())
        .action(add, &ApplierResponse::servers_identified(vec![server.clone()]))
        .unwrap()
        .server(add, &server, &UpdateResult::success(None))
        .unwrap()
        .complete();
    fs::write(temp_dir.path().join("response.bin"), &response).unwrap();

    rollplan_cmd()
        .current_dir(temp_dir.path())
        .args(["replay", "plan.json", "response.bin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("h1/main-server-group:server-one: ok"))
        .stdout(predicate::str::contains("completed"));
}

#[test]
fn replay_reports_rejected_plan() {
    let temp_dir = tempfile::tempdir().unwrap();
    init_project(temp_dir.path());
    let plan = save_plan(temp_dir.path());

    let response = ResponseWriter::new(plan.id())
        .plan_invalid(&RemoteError::new("unknown server group"))
        .unwrap();
    fs::write(temp_dir.path().join("response.bin"), &response).unwrap();

    rollplan_cmd()
        .current_dir(temp_dir.path())
        .args(["replay", "plan.json", "response.bin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rejected"));
}

#[test]
fn replay_reports_truncated_response() {
    let temp_dir = tempfile::tempdir().unwrap();
    init_project(temp_dir.path());
    let plan = save_plan(temp_dir.path());

    let response = ResponseWriter::new(plan.id()).set(plan.set_plan().id()).finish();
    fs::write(temp_dir.path().join("response.bin"), &response).unwrap();

    rollplan_cmd()
        .current_dir(temp_dir.path())
        .args(["--quiet", "replay", "plan.json", "response.bin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("PLAN_COMPLETE"));
}

#[test]
fn replay_rejects_tampered_plan() {
    let temp_dir = tempfile::tempdir().unwrap();
    init_project(temp_dir.path());
    save_plan(temp_dir.path());

    let path = temp_dir.path().join("plan.json");
    let mut plan: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    plan["set_plans"][0]["server_group_plans"][0][0]["max_failure_percentage"] =
        serde_json::json!(250);
    fs::write(&path, serde_json::to_string(&plan).unwrap()).unwrap();
    fs::write(temp_dir.path().join("response.bin"), b"").unwrap();

    rollplan_cmd()
        .current_dir(temp_dir.path())
        .args(["replay", "plan.json", "response.bin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("0..=100"));
}
