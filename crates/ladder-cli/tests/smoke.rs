use std::path::PathBuf;
use std::process::Command;

/// Mirrors `aero-machine-cli`'s `tests/smoke.rs`: locate the built binary under the
/// workspace `target/` dir rather than relying on `CARGO_BIN_EXE_*`, run it, and assert on
/// its stdout.
#[test]
fn runs_the_on_delay_demo_to_completion() {
    let repo_root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..");
    let target_dir = std::env::var_os("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| repo_root.join("target"));
    let exe_name = format!("ladder-cli{}", std::env::consts::EXE_SUFFIX);
    let debug_exe = target_dir.join("debug").join(&exe_name);
    let release_exe = target_dir.join("release").join(&exe_name);
    let exe = if debug_exe.exists() {
        debug_exe
    } else if release_exe.exists() {
        release_exe
    } else {
        panic!(
            "expected ladder-cli binary at {} or {}",
            debug_exe.display(),
            release_exe.display()
        );
    };

    let output = Command::new(exe)
        .args(["--dt", "0.5", "--cycles", "10"])
        .output()
        .expect("failed to run ladder-cli");

    assert!(
        output.status.success(),
        "ladder-cli exited with {}\nstderr:\n{}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Done=Some(Bool(true))"), "stdout:\n{stdout}");
    assert!(stdout.contains("changed tags since scan"), "stdout:\n{stdout}");
}
