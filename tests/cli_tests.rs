use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Binary with an isolated home directory and no credentials in the environment
fn cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("askcmd").unwrap();
    cmd.env("HOME", home.path())
        .env_remove("ASKCMD_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("ASKCMD_BASE_URL")
        .env_remove("ASKCMD_MODEL");
    cmd
}

#[test]
fn test_help_lists_options() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("askcmd"))
        .stdout(predicate::str::contains("QUERY"))
        .stdout(predicate::str::contains("--verbose"))
        .stdout(predicate::str::contains("--model"))
        .stdout(predicate::str::contains("--setup"));
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")))
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_unknown_flag_exits_with_usage_error() {
    let home = TempDir::new().unwrap();
    cmd(&home).arg("--no-such-flag").assert().code(2);
}

#[test]
fn test_query_too_long_is_rejected() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .arg("a".repeat(1001))
        .write_stdin("")
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Error: Query is too long. Please limit your query to 1000 characters.",
        ));

    assert!(!home.path().join(".askcmd").join("history.json").exists());
}

#[test]
fn test_piped_input_counts_toward_length() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .arg("explain this")
        .write_stdin("x".repeat(1000))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Query is too long"));
}

#[test]
fn test_empty_interactive_query_exits() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .write_stdin("   \n")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Enter your query"))
        .stdout(predicate::str::contains("No query provided. Exiting."));
}

#[test]
fn test_missing_api_key_is_reported() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .arg("list files")
        .write_stdin("")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No API key configured"));
}

#[test]
fn test_invalid_config_file_is_reported() {
    let home = TempDir::new().unwrap();
    let config_path = home.path().join("config.json");
    std::fs::write(&config_path, "{ not json").unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&config_path, std::fs::Permissions::from_mode(0o600)).unwrap();
    }

    cmd(&home)
        .arg("--config")
        .arg(&config_path)
        .arg("list files")
        .write_stdin("")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid JSON"));
}
