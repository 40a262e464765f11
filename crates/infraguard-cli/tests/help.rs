use assert_cmd::Command;
use predicates::prelude::*;

#[allow(deprecated)]
fn infraguard_cmd() -> Command {
    Command::cargo_bin("infraguard").expect("infraguard binary")
}

#[test]
fn help_lists_every_command() {
    let output = infraguard_cmd().arg("--help").output().expect("run infraguard");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["check", "plan", "md", "annotations", "explain"] {
        assert!(stdout.contains(command), "--help does not mention {command}");
    }
}

#[test]
fn bad_var_assignment_is_a_usage_error() {
    infraguard_cmd()
        .args(["check", ".", "--var", "region"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected name=value"));
}

#[test]
fn invalid_log_level_is_rejected() {
    infraguard_cmd()
        .args(["--log-level", "infraguard=loud", "explain", "open_ingress"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid --log-level"));
}
