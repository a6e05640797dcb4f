// ABOUTME: End-to-end tests for the ncdeploy binary.
// ABOUTME: Runs the CLI against shell-script stand-ins for the automation engine.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const ENV_OVERRIDES: &[&str] = &[
    "DEPLOY_MODE",
    "SKIP_VALIDATION",
    "FORCE_DEPLOY",
    "DRY_RUN",
    "VERBOSE",
];

fn ncdeploy_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ncdeploy"));
    cmd.current_dir(dir);
    for var in ENV_OVERRIDES {
        cmd.env_remove(var);
    }
    cmd
}

fn write(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A project whose automation engine is a script exiting with `exit_code`.
fn project_with_engine(exit_code: i32) -> TempDir {
    project_with_engine_body(&format!("exit {exit_code}"))
}

/// A project whose automation engine logs its arguments, then runs `body`.
fn project_with_engine_body(body: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    let engine = root.join("bin/ansible-playbook");
    write(
        root,
        "bin/ansible-playbook",
        &format!("#!/bin/sh\necho \"$@\" >> \"$(dirname \"$0\")/calls.log\"\n{body}\n"),
    );
    let mut perms = fs::metadata(&engine).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&engine, perms).unwrap();

    write(
        root,
        "ncdeploy.yml",
        "tools:\n  playbook: bin/ansible-playbook\n  runtime: null\ncollections: []\nsettle_interval: 0s\n",
    );
    write(root, "inventory/hosts.yml", "all:\n  hosts: {}\n");
    write(root, "playbooks/deploy_controllers.yml", "---\n");
    write(root, "playbooks/validate_deployment.yml", "---\n");
    write(root, "playbooks/cleanup.yml", "---\n");
    dir
}

fn read_state(dir: &Path) -> Value {
    let content = fs::read_to_string(dir.join(".deployment_state.json")).unwrap();
    serde_json::from_str(&content).unwrap()
}

fn engine_calls(dir: &Path) -> String {
    fs::read_to_string(dir.join("bin/calls.log")).unwrap_or_default()
}

mod arguments {
    use super::*;

    #[test]
    fn help_lists_operations_and_modifiers() {
        let dir = TempDir::new().unwrap();
        ncdeploy_cmd(dir.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--deploy-only"))
            .stdout(predicate::str::contains("--cleanup"))
            .stdout(predicate::str::contains("--skip-validation"))
            .stdout(predicate::str::contains("DEPLOY_MODE"));
    }

    #[test]
    fn version_exits_zero() {
        let dir = TempDir::new().unwrap();
        ncdeploy_cmd(dir.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("ncdeploy"));
    }

    #[test]
    fn unknown_flag_prints_usage_and_fails() {
        let dir = TempDir::new().unwrap();
        ncdeploy_cmd(dir.path())
            .arg("--teardown")
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("Usage"));
    }

    #[test]
    fn operation_flags_are_exclusive() {
        let dir = TempDir::new().unwrap();
        ncdeploy_cmd(dir.path())
            .args(["--deploy-only", "--cleanup"])
            .assert()
            .failure()
            .code(2);
    }
}

mod deploy_only {
    use super::*;

    #[test]
    fn successful_engine_records_deployed() {
        let dir = project_with_engine(0);

        ncdeploy_cmd(dir.path())
            .arg("--deploy-only")
            .assert()
            .success()
            .stdout(predicate::str::contains("Controllers deployed"));

        let state = read_state(dir.path());
        assert_eq!(state["state"], "deployed");
        assert_eq!(state["data"]["status"], "success");
        assert!(engine_calls(dir.path()).contains("deploy_controllers.yml"));
        assert!(!engine_calls(dir.path()).contains("validate_deployment.yml"));
        assert!(!dir.path().join(".deploy.pid").exists());
    }

    #[test]
    fn failing_engine_records_failed_deployment() {
        let dir = project_with_engine(1);

        ncdeploy_cmd(dir.path())
            .arg("--deploy-only")
            .assert()
            .failure()
            .code(1);

        let state = read_state(dir.path());
        assert_eq!(state["state"], "failed");
        assert_eq!(state["data"]["phase"], "deployment");
        assert_eq!(state["data"]["exit_code"], 1);
        assert!(!dir.path().join(".deploy.pid").exists());
    }

    #[test]
    fn deploy_mode_env_selects_operation() {
        let dir = project_with_engine(0);

        ncdeploy_cmd(dir.path())
            .env("DEPLOY_MODE", "deploy")
            .assert()
            .success();

        assert_eq!(read_state(dir.path())["state"], "deployed");
        assert!(!engine_calls(dir.path()).contains("validate_deployment.yml"));
    }

    #[test]
    fn dry_run_env_passes_check_flag() {
        let dir = project_with_engine(0);

        ncdeploy_cmd(dir.path())
            .arg("--deploy-only")
            .env("DRY_RUN", "true")
            .assert()
            .success();

        assert!(engine_calls(dir.path()).contains("--check"));
    }

    #[test]
    fn false_env_value_leaves_flag_off() {
        let dir = project_with_engine(0);

        ncdeploy_cmd(dir.path())
            .arg("--deploy-only")
            .env("DRY_RUN", "false")
            .assert()
            .success();

        assert!(!engine_calls(dir.path()).contains("--check"));
    }

    #[test]
    fn missing_inventory_aborts_without_state() {
        let dir = project_with_engine(0);
        fs::remove_file(dir.path().join("inventory/hosts.yml")).unwrap();

        ncdeploy_cmd(dir.path())
            .arg("--deploy-only")
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("prerequisite"));

        assert!(!dir.path().join(".deployment_state.json").exists());
        assert!(engine_calls(dir.path()).is_empty());
    }

    #[test]
    fn log_file_receives_timestamped_lines() {
        let dir = project_with_engine(0);

        ncdeploy_cmd(dir.path()).arg("--deploy-only").assert().success();

        let log = fs::read_to_string(dir.path().join("logs/deployment.log")).unwrap();
        assert!(log.contains("Controllers deployed"));
        assert!(log.lines().next().unwrap().starts_with(char::is_numeric));
    }
}

mod full {
    use super::*;

    #[test]
    fn full_run_deploys_then_validates() {
        let dir = project_with_engine(0);
        write(
            dir.path(),
            "reports/validation_report_1.json",
            r#"{"status": "SUCCESS", "health_score": 100}"#,
        );

        ncdeploy_cmd(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Health score:   100"));

        let calls = engine_calls(dir.path());
        let deploy = calls.find("deploy_controllers.yml").unwrap();
        let validate = calls.find("validate_deployment.yml").unwrap();
        assert!(deploy < validate);
        assert_eq!(read_state(dir.path())["state"], "validated");
    }

    #[test]
    fn skip_validation_flag_skips_engine_call() {
        let dir = project_with_engine(0);

        ncdeploy_cmd(dir.path())
            .arg("--skip-validation")
            .assert()
            .success();

        assert!(!engine_calls(dir.path()).contains("validate_deployment.yml"));
        assert_eq!(read_state(dir.path())["state"], "deployed");
    }
}

mod cleanup {
    use super::*;

    #[test]
    fn wrong_confirmation_leaves_state_unchanged() {
        let dir = project_with_engine(0);
        let original = r#"{"timestamp":"2026-01-01T00:00:00Z","state":"deployed","deployment_id":"20260101_000000","data":{}}"#;
        write(dir.path(), ".deployment_state.json", original);

        ncdeploy_cmd(dir.path())
            .arg("--cleanup")
            .write_stdin("no\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("Cleanup cancelled"));

        let after = fs::read_to_string(dir.path().join(".deployment_state.json")).unwrap();
        assert_eq!(after, original);
        assert!(engine_calls(dir.path()).is_empty());
    }

    #[test]
    fn exact_confirmation_removes_state() {
        let dir = project_with_engine(0);
        write(
            dir.path(),
            ".deployment_state.json",
            r#"{"timestamp":"2026-01-01T00:00:00Z","state":"deployed","deployment_id":"x","data":{}}"#,
        );

        ncdeploy_cmd(dir.path())
            .arg("--cleanup")
            .write_stdin("DELETE\n")
            .assert()
            .success();

        assert!(!dir.path().join(".deployment_state.json").exists());
        assert!(engine_calls(dir.path()).contains("cleanup.yml"));
    }

    #[test]
    fn force_env_skips_prompt() {
        let dir = project_with_engine(0);

        ncdeploy_cmd(dir.path())
            .arg("--cleanup")
            .env("FORCE_DEPLOY", "1")
            .assert()
            .success();

        assert!(engine_calls(dir.path()).contains("cleanup.yml"));
    }

    #[test]
    fn failing_cleanup_records_phase() {
        let dir = project_with_engine(3);

        ncdeploy_cmd(dir.path())
            .args(["--cleanup", "--force"])
            .assert()
            .failure()
            .code(1);

        let state = read_state(dir.path());
        assert_eq!(state["state"], "failed");
        assert_eq!(state["data"]["phase"], "cleanup");
        assert_eq!(state["data"]["exit_code"], 3);
    }
}

mod health_check {
    use super::*;

    #[test]
    fn missing_script_fails() {
        let dir = project_with_engine(0);

        ncdeploy_cmd(dir.path())
            .arg("--health-check")
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("health_check.sh"));
    }

    #[test]
    fn passing_script_succeeds() {
        let dir = project_with_engine(0);
        write(dir.path(), "scripts/health_check.sh", "exit 0\n");

        ncdeploy_cmd(dir.path())
            .arg("--health-check")
            .assert()
            .success()
            .stdout(predicate::str::contains("Health check passed"));
    }

    #[test]
    fn failing_script_records_phase() {
        let dir = project_with_engine(0);
        write(dir.path(), "scripts/health_check.sh", "exit 5\n");

        ncdeploy_cmd(dir.path())
            .arg("--health-check")
            .assert()
            .failure()
            .code(1);

        let state = read_state(dir.path());
        assert_eq!(state["data"]["phase"], "health_check");
        assert_eq!(state["data"]["exit_code"], 5);
    }
}

mod finalizer {
    use super::*;

    fn wait_for(path: &Path) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !path.exists() {
            assert!(Instant::now() < deadline, "{} never appeared", path.display());
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    /// The binary without assert_cmd's wrapper, for spawning and custom stdin.
    fn ncdeploy_process(dir: &Path) -> std::process::Command {
        let mut cmd = std::process::Command::new(assert_cmd::cargo::cargo_bin!("ncdeploy"));
        cmd.current_dir(dir);
        for var in ENV_OVERRIDES {
            cmd.env_remove(var);
        }
        cmd
    }

    #[test]
    fn sigterm_records_interruption_and_exits_143() {
        let dir = project_with_engine_body("sleep 5");

        let mut child = ncdeploy_process(dir.path())
            .arg("--deploy-only")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();

        wait_for(&dir.path().join("bin/calls.log"));
        assert!(dir.path().join(".deploy.pid").exists());
        std::thread::sleep(Duration::from_millis(200));
        let killed = std::process::Command::new("kill")
            .args(["-TERM", &child.id().to_string()])
            .status()
            .unwrap();
        assert!(killed.success());

        let status = child.wait().unwrap();

        assert_eq!(status.code(), Some(143));
        let state = read_state(dir.path());
        assert_eq!(state["state"], "failed");
        assert_eq!(state["data"]["status"], "interrupted");
        assert_eq!(state["data"]["exit_code"], 143);
        assert!(!dir.path().join(".deploy.pid").exists());
    }

    #[test]
    fn unreadable_confirmation_records_failure_with_code_1() {
        let dir = project_with_engine(0);
        let stdin = fs::File::open(dir.path().join("bin")).unwrap();

        let output = ncdeploy_process(dir.path())
            .arg("--cleanup")
            .stdin(stdin)
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(1));
        let state = read_state(dir.path());
        assert_eq!(state["state"], "failed");
        assert_eq!(state["data"]["status"], "interrupted");
        assert_eq!(state["data"]["exit_code"], 1);
        assert!(!dir.path().join(".deploy.pid").exists());
        assert!(!engine_calls(dir.path()).contains("cleanup.yml"));
    }
}
