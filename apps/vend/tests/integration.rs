//! Integration tests for vend CLI

use std::process::Command;

#[test]
fn test_cli_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_vend"))
        .arg("--version")
        .output()
        .expect("Failed to execute vend");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("vend"));
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_vend"))
        .arg("--help")
        .output()
        .expect("Failed to execute vend");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Download purchased files and confirm checkout payments"));
    assert!(stdout.contains("download"));
    assert!(stdout.contains("buy"));
    assert!(stdout.contains("verify"));
    assert!(stdout.contains("login"));
}

#[test]
fn test_cli_invalid_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_vend"))
        .arg("refund")
        .output()
        .expect("Failed to execute vend");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized subcommand"));
}

#[test]
fn test_download_requires_product_id() {
    let output = Command::new(env!("CARGO_BIN_EXE_vend"))
        .arg("download")
        .output()
        .expect("Failed to execute vend");

    assert!(!output.status.success());
}

#[test]
fn test_download_rejects_non_numeric_product_id() {
    let output = Command::new(env!("CARGO_BIN_EXE_vend"))
        .args(["download", "starter-kit"])
        .output()
        .expect("Failed to execute vend");

    assert!(!output.status.success());
}

#[test]
fn test_json_login_without_token_fails_cleanly() {
    let output = Command::new(env!("CARGO_BIN_EXE_vend"))
        .args(["--json", "login"])
        .output()
        .expect("Failed to execute vend");

    // No prompt is possible in JSON mode; stdout stays clean
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_login_logout_round_trip() {
    // Point every platform directory into the sandbox so the token file
    // lands in (and disappears from) a throwaway home.
    let home = tempfile::tempdir().expect("tempdir");
    let run = |args: &[&str]| {
        Command::new(env!("CARGO_BIN_EXE_vend"))
            .args(args)
            .env("HOME", home.path())
            .env("XDG_DATA_HOME", home.path().join("data"))
            .env("XDG_CONFIG_HOME", home.path().join("config"))
            .output()
            .expect("Failed to execute vend")
    };

    let login = run(&["--json", "login", "tok-123"]);
    assert!(login.status.success());
    let stdout = String::from_utf8_lossy(&login.stdout);
    assert!(stdout.contains(r#""result": "logged_in""#));

    let token_path = home.path().join("data").join("vend").join("token");
    assert_eq!(std::fs::read_to_string(&token_path).unwrap(), "tok-123");

    let logout = run(&["--json", "logout"]);
    assert!(logout.status.success());
    assert!(!token_path.exists());

    // Logging out twice stays clean
    let again = run(&["--json", "logout"]);
    assert!(again.status.success());
}
