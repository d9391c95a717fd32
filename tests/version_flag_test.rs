use std::process::Command;

fn run_with(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_devdash"))
        .args(args)
        .output()
        .expect("Failed to execute binary")
}

#[test]
fn test_version_flag() {
    let output = run_with(&["--version"]);

    assert!(
        output.status.success(),
        "Version flag should exit with code 0"
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let version = stdout.trim().strip_prefix("devdash ").unwrap_or("");
    assert_eq!(
        version,
        env!("CARGO_PKG_VERSION"),
        "Binary version should match CARGO_PKG_VERSION"
    );
}

#[test]
fn test_version_flag_skips_startup() {
    // An unreadable --config would fail startup; --version must exit first.
    let output = run_with(&["--config", "/definitely/not/here.yaml", "--version"]);

    assert!(output.status.success());
    assert!(output.stderr.is_empty());
}
