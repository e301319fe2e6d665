use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn version_flag_works() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("cite")?;
    cmd.arg("--version").assert().success().stdout(predicate::str::contains("cite"));
    Ok(())
}

#[test]
fn invalid_style_is_rejected_with_usage() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("cite")?;
    let output = cmd
        .env("NO_COLOR", "1")
        .args(["create", "http://example.com", "-f", "bibtex"])
        .output()?;
    assert!(!output.status.success());
    let stderr = String::from_utf8(strip_ansi_escapes::strip(output.stderr))?;
    assert!(
        stderr.contains("possible values"),
        "expected clap usage guidance, got:\n{stderr}"
    );
    Ok(())
}

#[test]
fn invalid_override_field_fails_before_fetching() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("cite")?;
    // An unroutable URL: if the field check did not run first this would
    // fail with a network error instead.
    let output = cmd
        .env("NO_COLOR", "1")
        .args([
            "create",
            "http://127.0.0.1:1/",
            "--override",
            "bogus",
            "value",
        ])
        .output()?;
    assert!(!output.status.success());
    let stderr = String::from_utf8(strip_ansi_escapes::strip(output.stderr))?;
    assert!(
        stderr.contains("unknown field `bogus`"),
        "stderr:\n{stderr}"
    );
    assert!(stderr.contains("publish_date"), "stderr:\n{stderr}");
    Ok(())
}

#[test]
fn create_unreachable_url_exits_nonzero() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("cite")?;
    let output = cmd
        .env("NO_COLOR", "1")
        .args(["create", "http://127.0.0.1:1/", "--no-log"])
        .output()?;
    assert!(!output.status.success());
    let stderr = String::from_utf8(strip_ansi_escapes::strip(output.stderr))?;
    assert!(
        stderr.contains("failed to fetch http://127.0.0.1:1/"),
        "stderr:\n{stderr}"
    );
    Ok(())
}

#[test]
fn logs_path_prints_db_location() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let db = dir.path().join("citations.db");
    let mut cmd = Command::cargo_bin("cite")?;
    cmd.args(["logs", "path", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("citations.db"));
    Ok(())
}

#[test]
fn logs_list_on_fresh_store_is_empty() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let db = dir.path().join("citations.db");
    let mut cmd = Command::cargo_bin("cite")?;
    cmd.args(["logs", "list", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    // The store is created on first use.
    assert!(db.exists());
    Ok(())
}

#[test]
fn batch_with_only_bad_urls_exits_nonzero() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("urls.txt");
    std::fs::write(&file, "http://127.0.0.1:1/\n\nhttp://127.0.0.1:2/\n")?;

    let mut cmd = Command::cargo_bin("cite")?;
    let output = cmd
        .env("NO_COLOR", "1")
        .arg("batch")
        .arg(&file)
        .arg("--no-log")
        .output()?;
    assert!(!output.status.success());
    let stderr = String::from_utf8(strip_ansi_escapes::strip(output.stderr))?;
    assert!(
        stderr.contains("✓ 0") && stderr.contains("✗ 2"),
        "summary mismatch. stderr=\n{stderr}"
    );
    Ok(())
}

#[test]
fn batch_missing_file_reports_error() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("cite")?;
    cmd.args(["batch", "/no/such/file.txt", "--no-log"])
        .assert()
        .failure();
    Ok(())
}
