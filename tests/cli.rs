//! Runs the `blnc` binary the way a user would, inside a scratch directory.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

/// Fresh working directory for one test.
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("blnc_cli_{}_{name}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn blnc(dir: &PathBuf, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_blnc"))
        .args(args)
        .current_dir(dir)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_list_targets() {
    let dir = scratch_dir("list");
    let output = blnc(&dir, &["-t", "list"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["ir", "fasm_x86-64_win32", "html-js"] {
        assert!(stdout.lines().any(|line| line.trim() == name), "missing {name} in:\n{stdout}");
    }
}

#[test]
fn test_unknown_target_fails() {
    let dir = scratch_dir("bogus");
    let output = blnc(&dir, &["-t", "bogus", "main.bn"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("please provide a valid target. You gave bogus"));
}

#[test]
fn test_missing_input_fails() {
    let dir = scratch_dir("no_input");
    let output = blnc(&dir, &[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("no input file is provided"));
}

#[test]
fn test_default_output_is_a_s() {
    let dir = scratch_dir("default_fasm");
    fs::write(dir.join("exit.bn"), "extern exit; function main() { exit(); }").unwrap();

    let output = blnc(&dir, &["exit.bn"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let asm = fs::read_to_string(dir.join("a.s")).unwrap();
    assert!(asm.starts_with("format MS64 COFF"));
    assert!(asm.contains("call exit"));
}

#[test]
fn test_failed_compile_writes_partial_output() {
    let dir = scratch_dir("partial");
    fs::write(
        dir.join("bad.bn"),
        "\n        function first() { }\n        function second() { y = 1; }\n",
    )
    .unwrap();

    let output = blnc(&dir, &["-t", "html-js", "bad.bn"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr(&output).contains("bad.bn:3:29: ERROR: could not find `y` in scope"),
        "{}",
        stderr(&output)
    );

    let page = fs::read_to_string(dir.join("a.html")).unwrap();
    assert!(page.contains("function first(...args) {"));
    assert!(!page.contains("function second"));
}

#[test]
fn test_output_flag_overrides_path() {
    let dir = scratch_dir("output_flag");
    fs::write(dir.join("main.bn"), "function main() { }").unwrap();

    let output = blnc(&dir, &["-t", "ir", "-o", "main.ir", "main.bn"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(output.stdout.is_empty());
    assert_eq!(
        fs::read_to_string(dir.join("main.ir")).unwrap(),
        "main() [locals=0, params=0]\n"
    );
    assert!(!dir.join("a.s").exists());
}
