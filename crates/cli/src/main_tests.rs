use super::*;
use clap::Parser;

#[test]
fn into_argv_carries_script_and_defaults() {
    let cli = Cli::parse_from(["bosun", "--script", "./run.sh"]);
    assert_eq!(cli.into_argv(), vec!["--script".to_string(), "./run.sh".to_string()]);
}

#[test]
fn into_argv_passes_through_child_args_and_flags() {
    let cli = Cli::parse_from([
        "bosun",
        "--script",
        "./run.sh",
        "--no-watch",
        "--no-codex",
        "--log-dir",
        "/tmp/logs",
        "--args",
        "--verbose",
        "--seed",
        "7",
    ]);
    assert_eq!(
        cli.into_argv(),
        vec![
            "--script".to_string(),
            "./run.sh".to_string(),
            "--args".to_string(),
            "--verbose".to_string(),
            "--seed".to_string(),
            "7".to_string(),
            "--no-watch".to_string(),
            "--no-codex".to_string(),
            "--log-dir".to_string(),
            "/tmp/logs".to_string(),
        ]
    );
}

#[test]
fn into_argv_omits_unset_optional_flags() {
    let cli = Cli::parse_from(["bosun"]);
    let argv = cli.into_argv();
    assert!(!argv.contains(&"--no-watch".to_string()));
    assert!(!argv.contains(&"--log-dir".to_string()));
}
