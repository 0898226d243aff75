//! Exit codes of the `pdf-swap` binary

use std::process::Command;

fn pdf_swap() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pdf-swap"))
}

#[test]
fn test_help_exits_zero() {
    for flag in ["--help", "-h"] {
        let output = pdf_swap().arg(flag).output().unwrap();
        assert_eq!(output.status.code(), Some(0));
        let usage = String::from_utf8_lossy(&output.stdout);
        assert!(usage.contains("--port"));
        assert!(usage.contains("--logger"));
    }
}

#[test]
fn test_unknown_option_exits_one() {
    let output = pdf_swap().arg("--no-such-option").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn test_bad_port_exits_one() {
    let output = pdf_swap().args(["--port", "not-a-port"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_unreadable_logger_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let output = pdf_swap()
        .args(["--logger"])
        .arg(dir.path().join("missing.toml"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("logger configuration"));
}

#[test]
fn test_malformed_logger_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logger.toml");
    std::fs::write(&path, "format = [not toml").unwrap();

    let output = pdf_swap().arg("-l").arg(&path).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}
