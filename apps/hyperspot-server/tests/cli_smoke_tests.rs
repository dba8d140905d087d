#![allow(clippy::unwrap_used, clippy::expect_used)]

//! CLI smoke tests for the hyperspot-server binary: help/version output,
//! config-file validation, and the `--list-modules` introspection flag.

use std::process::{Command, Stdio};
use std::time::Duration;

use tempfile::TempDir;
use tokio::time::timeout;

fn run_hyperspot_server(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_hyperspot-server"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("failed to execute hyperspot-server")
}

async fn run_hyperspot_server_with_timeout(
    args: &[&str],
    timeout_duration: Duration,
) -> Result<std::process::Output, Box<dyn std::error::Error>> {
    let mut cmd = tokio::process::Command::new(env!("CARGO_BIN_EXE_hyperspot-server"));
    cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);

    let child = cmd.spawn()?;
    match timeout(timeout_duration, child.wait_with_output()).await {
        Ok(result) => result.map_err(Into::into),
        Err(_elapsed) => Err("elapsed".into()),
    }
}

#[test]
fn help_command_describes_run_and_check() {
    let output = run_hyperspot_server(&["--help"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hyperspot-server") || stdout.contains("HyperSpot"));
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("run"));
    assert!(stdout.contains("check"));
    assert!(stdout.contains("--config"));
    assert!(stdout.contains("--list-modules"));
}

#[test]
fn version_command_reports_binary_name_and_version() {
    let output = run_hyperspot_server(&["--version"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hyperspot-server"));
    assert!(stdout.chars().any(|c| c.is_ascii_digit()));
}

#[test]
fn invalid_subcommand_fails() {
    let output = run_hyperspot_server(&["not-a-real-command"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error") || stderr.contains("unrecognized"));
}

#[test]
fn missing_config_file_is_rejected() {
    let output = run_hyperspot_server(&["--config", "/nonexistent/hyperspot.yaml", "check"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does not exist"), "expected a missing-file message, got: {stderr}");
}

#[test]
fn invalid_yaml_is_rejected() {
    let temp_dir = TempDir::new().expect("tempdir");
    let config_path = temp_dir.path().join("invalid.yaml");
    std::fs::write(&config_path, "server: [unterminated").expect("write config");

    let output = run_hyperspot_server(&["--config", config_path.to_str().unwrap(), "check"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("YAML") || stderr.contains("yaml"), "expected a YAML-parse message, got: {stderr}");
}

#[test]
fn valid_config_passes_check() {
    let temp_dir = TempDir::new().expect("tempdir");
    let config_path = temp_dir.path().join("valid.yaml");
    std::fs::write(
        &config_path,
        "server:\n  bind: \"127.0.0.1:0\"\nmodules:\n  tenant_lifecycle_manager:\n    config:\n      enabled: true\n",
    )
    .expect("write config");

    let output = run_hyperspot_server(&["--config", config_path.to_str().unwrap(), "check"]);
    if !output.status.success() {
        eprintln!("stderr: {}", String::from_utf8_lossy(&output.stderr));
    }
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("OK"));
}

#[test]
fn invalid_bind_address_is_rejected_by_check() {
    let temp_dir = TempDir::new().expect("tempdir");
    let config_path = temp_dir.path().join("bad_bind.yaml");
    std::fs::write(&config_path, "server:\n  bind: \"not-an-address\"\n").expect("write config");

    let output = run_hyperspot_server(&["--config", config_path.to_str().unwrap(), "check"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("address") || stderr.contains("invalid"), "got: {stderr}");
}

#[test]
fn list_modules_reports_sorted_names_from_config() {
    let temp_dir = TempDir::new().expect("tempdir");
    let config_path = temp_dir.path().join("modules.yaml");
    std::fs::write(
        &config_path,
        "modules:\n  zeta_module:\n    config: {}\n  alpha_module:\n    config: {}\n",
    )
    .expect("write config");

    let output = run_hyperspot_server(&["--config", config_path.to_str().unwrap(), "--list-modules"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configured modules (2)"));
    let alpha_pos = stdout.find("alpha_module").expect("alpha_module listed");
    let zeta_pos = stdout.find("zeta_module").expect("zeta_module listed");
    assert!(alpha_pos < zeta_pos, "modules should be listed alphabetically");
}

#[test]
fn list_modules_with_no_modules_configured_reports_zero() {
    let output = run_hyperspot_server(&["--list-modules"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configured modules (0)"));
}

#[tokio::test]
async fn running_with_no_arguments_starts_the_server() {
    // With no subcommand the binary defaults to `run` and keeps going until
    // killed; a timeout here means the server came up successfully.
    match run_hyperspot_server_with_timeout(&[], Duration::from_secs(2)).await {
        Err(e) if e.to_string().contains("elapsed") => {}
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            panic!("expected the server to still be running after 2s; stdout={stdout} stderr={stderr}");
        }
        Err(other) => panic!("unexpected failure: {other}"),
    }
}
