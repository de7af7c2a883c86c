use std::process::{Command, Output};

fn hello(args: &[&str], env: &[(&str, &str)]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_decli-hello"));
    command
        .args(args)
        .env_remove("FIRST_NAME")
        .env_remove("LAST_NAME")
        .env_remove("AGE")
        .env_remove("RUST_LOG");
    for (name, value) in env {
        command.env(name, value);
    }
    command.output().expect("failed to run decli-hello")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_greets_with_defaults() {
    let output = hello(&[], &[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "Hello John Doe (-1)\n");
}

#[test]
fn test_flags_and_aliases() {
    let output = hello(&["--fn", "Jane", "--last-name", "Roe", "-a", "42"], &[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "Hello Jane Roe (42)\n");
}

#[test]
fn test_environment_fills_missing_flags() {
    let output = hello(&["--first-name", "Ada"], &[("FIRST_NAME", "Grace"), ("AGE", "36")]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "Hello Ada Doe (36)\n");
}

#[test]
fn test_negative_age_is_a_value() {
    let output = hello(&["--age", "-7"], &[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "Hello John Doe (-7)\n");
}

#[test]
fn test_help_lists_flags() {
    let output = hello(&["--help"], &[]);
    assert!(output.status.success());

    let help = stdout(&output);
    assert!(help.contains("--first-name"));
    assert!(help.contains("your last name"));
    assert!(help.contains("[env: AGE]"));
}

#[test]
fn test_version() {
    let output = hello(&["--version"], &[]);
    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_invalid_flag_value_fails() {
    let output = hello(&["--age", "old"], &[]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("old"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_invalid_env_value_fails() {
    let output = hello(&[], &[("AGE", "ancient")]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("error: invalid value \"ancient\" in $AGE"));
}

#[test]
fn test_unknown_flag_fails() {
    let output = hello(&["--nickname", "JD"], &[]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("--nickname"));
}
