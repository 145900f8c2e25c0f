// tests/config_and_commands.rs

use std::io::Write;
use std::time::Duration;

use respawn::config::{load_and_validate, validate_config};
use respawn::errors::RespawnError;
use respawn::process::WorkerLauncher;
use respawn::types::Command;
use respawn_test_utils::builders::ConfigFileBuilder;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn full_config_maps_onto_runtime_options() {
    let file = config_file(
        r#"
[worker]
program = "server"
args = ["--port", "8080"]
env = { MODE = "dev" }
stop_grace_ms = 750

[watch]
paths = ["src"]
include = ["*.html"]
exclude = ["*_test.rs"]
debounce_ms = 400
step_ms = 25
timeout_ms = 100
force_polling = true

[reload]
safe = false
tick_ms = 5
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.launcher().describe(), "server --port 8080");
    assert_eq!(cfg.supervisor_options().stop_grace, Duration::from_millis(750));

    let watch = cfg.watch_options();
    assert_eq!(watch.debounce, Duration::from_millis(400));
    assert_eq!(watch.step, Duration::from_millis(25));
    assert!(watch.force_polling);
    assert!(watch.recursive);

    let filter = cfg.filter_options();
    assert_eq!(filter.includes, vec!["*.html"]);
    assert_eq!(filter.excludes, vec!["*_test.rs"]);

    let looping = cfg.loop_options();
    assert!(!looping.safe_reload);
    assert_eq!(looping.tick, Duration::from_millis(5));
}

#[test]
fn config_without_program_is_rejected() {
    let file = config_file("[watch]\ndebounce_ms = 400\n");

    match load_and_validate(file.path()) {
        Err(RespawnError::ConfigError(msg)) => assert!(msg.contains("program")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let file = config_file("[worker\nprogram = 1\n");

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, RespawnError::TomlError(_)));
}

#[test]
fn timing_rules_are_enforced() {
    let cfg = ConfigFileBuilder::new("server").timings(1_600, 0, 200).build();
    assert!(validate_config(&cfg).is_err());

    let cfg = ConfigFileBuilder::new("server").timings(1_600, 50, 20).build();
    assert!(validate_config(&cfg).is_err());

    let cfg = ConfigFileBuilder::new("server").stop_grace_ms(0).build();
    assert!(validate_config(&cfg).is_err());

    let cfg = ConfigFileBuilder::new("server").timings(50, 50, 50).build();
    assert!(validate_config(&cfg).is_ok());
}

#[test]
fn commands_parse_from_names_and_codes() {
    assert_eq!("reload".parse::<Command>().unwrap(), Command::Reload);
    assert_eq!(" STOP ".parse::<Command>().unwrap(), Command::Stop);
    assert_eq!(Command::try_from(1u8).unwrap(), Command::Pause);

    assert!(matches!(
        "restart".parse::<Command>(),
        Err(RespawnError::UnknownCommand(_))
    ));
    assert!(matches!(
        Command::try_from(5u8),
        Err(RespawnError::UnknownCommand(_))
    ));
}
