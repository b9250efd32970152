//! CLI integration tests
//!
//! These tests run the compiled binary and check:
//! - Command parsing and help output
//! - Output formats
//! - Error handling and exit codes

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

/// Helper to get the path to the stackprobe binary
fn stackprobe_bin() -> PathBuf {
    // In tests, the binary should be at target/debug/stackprobe
    let mut path = env::current_exe()
        .expect("Failed to get current executable path")
        .parent()
        .expect("No parent")
        .to_path_buf();

    // If we're in deps/, go up one more level
    if path.ends_with("deps") {
        path = path.parent().expect("No parent").to_path_buf();
    }

    path.join(format!("stackprobe{}", env::consts::EXE_SUFFIX))
}

fn stackprobe() -> Command {
    let mut cmd = Command::new(stackprobe_bin());
    for var in [
        "STACKPROBE_CATALOG",
        "STACKPROBE_THREADS",
        "STACKPROBE_MAX_DEPTH",
        "STACKPROBE_TIMEOUT_SECS",
        "STACKPROBE_MATCH_MODE",
        "STACKPROBE_RESPECT_GITIGNORE",
        "STACKPROBE_EXCLUDE",
        "STACKPROBE_NO_LOCATE",
        "STACKPROBE_LOG_LEVEL",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Helper to create a small Rust + Docker repository
fn create_rust_repo(dir: &TempDir) -> PathBuf {
    let repo_path = dir.path().to_path_buf();

    let cargo_toml = r#"[package]
name = "test-project"
version = "0.1.0"
edition = "2021"

[dependencies]
serde = "1.0"
"#;
    fs::write(repo_path.join("Cargo.toml"), cargo_toml).expect("Failed to write Cargo.toml");
    fs::create_dir_all(repo_path.join("src")).expect("Failed to create src directory");
    fs::write(repo_path.join("src/main.rs"), "fn main() {}\n").expect("Failed to write main.rs");
    fs::write(repo_path.join("Dockerfile"), "FROM rust:1.75\n").expect("Failed to write Dockerfile");

    repo_path
}

#[test]
fn test_cli_help() {
    let output = stackprobe()
        .arg("--help")
        .output()
        .expect("Failed to execute stackprobe");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("stackprobe"));
    assert!(stdout.contains("detect"));
    assert!(stdout.contains("catalog"));
}

#[test]
fn test_cli_version() {
    let output = stackprobe()
        .arg("--version")
        .output()
        .expect("Failed to execute stackprobe");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_detect_json_output() {
    let dir = TempDir::new().unwrap();
    let repo = create_rust_repo(&dir);

    let output = stackprobe()
        .args(["detect", "--format", "json"])
        .arg(&repo)
        .output()
        .expect("Failed to execute stackprobe");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is not JSON");
    assert_eq!(value["technologies"], serde_json::json!(["docker", "rust"]));
    assert!(value.get("stats").is_none());
}

#[test]
fn test_detect_with_stats() {
    let dir = TempDir::new().unwrap();
    let repo = create_rust_repo(&dir);

    let output = stackprobe()
        .args(["detect", "--format", "json", "--stats", "-j", "1"])
        .arg(&repo)
        .output()
        .expect("Failed to execute stackprobe");

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["stats"]["files_scanned"], 3);
    assert_eq!(value["stats"]["truncated"], false);
}

#[test]
fn test_detect_human_output() {
    let dir = TempDir::new().unwrap();
    let repo = create_rust_repo(&dir);

    let output = stackprobe()
        .arg("detect")
        .arg(&repo)
        .output()
        .expect("Failed to execute stackprobe");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Detected 2 technologies"));
    assert!(stdout.contains("  rust"));
}

#[test]
fn test_detect_yaml_output() {
    let dir = TempDir::new().unwrap();
    let repo = create_rust_repo(&dir);

    let output = stackprobe()
        .args(["detect", "--format", "yaml"])
        .arg(&repo)
        .output()
        .expect("Failed to execute stackprobe");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("technologies:"));
    assert!(stdout.contains("- rust"));
}

#[test]
fn test_detect_exclude_flag() {
    let dir = TempDir::new().unwrap();
    let repo = create_rust_repo(&dir);
    fs::create_dir_all(repo.join("generated")).unwrap();
    fs::write(repo.join("generated/schema.py"), "x = 1\n").unwrap();

    let with_python = stackprobe()
        .args(["detect", "--format", "json"])
        .arg(&repo)
        .output()
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&with_python.stdout).unwrap();
    assert!(value["technologies"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("python")));

    let without_python = stackprobe()
        .args(["detect", "--format", "json", "-x", "generated"])
        .arg(&repo)
        .output()
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&without_python.stdout).unwrap();
    assert!(!value["technologies"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("python")));
}

#[test]
fn test_detect_nonexistent_path_is_empty() {
    let dir = TempDir::new().unwrap();

    let output = stackprobe()
        .args(["detect", "--format", "json"])
        .arg(dir.path().join("nope"))
        .output()
        .expect("Failed to execute stackprobe");

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["technologies"], serde_json::json!([]));
}

#[test]
fn test_detect_invalid_catalog_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let repo = create_rust_repo(&dir);
    let catalog = dir.path().join("broken.toml");
    fs::write(&catalog, "version = 1\n[technologies.rust\n").unwrap();

    let output = stackprobe()
        .arg("detect")
        .arg(&repo)
        .arg("--catalog")
        .arg(&catalog)
        .output()
        .expect("Failed to execute stackprobe");

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"));
}

#[test]
fn test_detect_invalid_env_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let repo = create_rust_repo(&dir);

    let output = stackprobe()
        .env("STACKPROBE_MATCH_MODE", "fuzzy")
        .arg("detect")
        .arg(&repo)
        .output()
        .expect("Failed to execute stackprobe");

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_invalid_format_is_usage_error() {
    let output = stackprobe()
        .args(["detect", "--format", "xml"])
        .output()
        .expect("Failed to execute stackprobe");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid value"));
}

#[test]
fn test_catalog_command_lists_builtin() {
    let output = stackprobe()
        .args(["catalog", "--format", "json"])
        .output()
        .expect("Failed to execute stackprobe");

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["version"], 1);
    let ids: Vec<&str> = value["technologies"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["id"].as_str())
        .collect();
    assert!(ids.contains(&"python"));
    assert!(ids.contains(&"next.js"));
}

#[test]
fn test_catalog_command_validates_file() {
    let dir = TempDir::new().unwrap();
    let catalog = dir.path().join("custom.yaml");
    fs::write(&catalog, "version: 1\ntechnologies:\n  zig:\n    extensions: [\".zig\"]\n").unwrap();

    let output = stackprobe()
        .arg("catalog")
        .arg("--catalog")
        .arg(&catalog)
        .output()
        .expect("Failed to execute stackprobe");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 technologies"));
    assert!(stdout.contains("zig"));
}

#[test]
fn test_logs_stay_off_stdout() {
    let dir = TempDir::new().unwrap();
    let repo = create_rust_repo(&dir);

    let output = stackprobe()
        .args(["detect", "--format", "json", "-v"])
        .arg(&repo)
        .output()
        .expect("Failed to execute stackprobe");

    assert!(output.status.success());
    serde_json::from_slice::<serde_json::Value>(&output.stdout).expect("stdout polluted by logs");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("DEBUG"));
}
