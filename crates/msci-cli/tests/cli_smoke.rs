use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn script_file(name: &str, content: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("msci-smoke-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).expect("temp dir should be created");
    let path = dir.join(format!("{}.txt", name));
    fs::write(&path, content).expect("script should be written");
    path
}

fn msci(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_msci"))
        .args(args)
        .output()
        .expect("cli should execute")
}

#[test]
fn compile_prints_the_script_file_as_json() {
    let path = script_file(
        "plugin.smoke",
        "$x = 1\nif $x == 1\nreturn null\nelse\nreturn null\nend\n",
    );
    let output = msci(&["compile", path.to_string_lossy().as_ref()]);
    assert!(
        output.status.success(),
        "stderr:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let script: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be json");
    assert_eq!(script["name"], "plugin.smoke");
    assert_eq!(script["commands"].as_array().map(Vec::len), Some(5));
}

#[test]
fn check_reports_diagnostics_with_line_numbers() {
    let path = script_file("plugin.broken", "$a = 1\nend\nreturn $a\n");
    let output = msci(&["check", path.to_string_lossy().as_ref()]);
    assert_eq!(output.status.code(), Some(2));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("RESULT:INVALID"));
    assert!(stdout.contains("DIAGNOSTIC:2:"), "stdout:\n{}", stdout);
}

#[test]
fn tree_and_find_describe_the_source() {
    let path = script_file(
        "plugin.tree",
        "$n = 2\nwhile $n\ndec $n\nend\nreturn $n\n",
    );
    let output = msci(&["tree", "--linked", path.to_string_lossy().as_ref()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("while $n -> #4"), "stdout:\n{}", stdout);

    let output = msci(&["find", path.to_string_lossy().as_ref(), "--symbol", "$n"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("COUNT:4"), "stdout:\n{}", stdout);
}

#[test]
fn missing_files_fail_with_an_error_code() {
    let output = msci(&["check", "/definitely/not/here.txt"]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ERROR_CODE:CLI_SOURCE_NOT_FOUND"));
}
