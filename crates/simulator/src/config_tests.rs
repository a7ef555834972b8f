use super::*;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile, TempDir};

fn raw_with_output(dir: &TempDir) -> RawConfig {
    RawConfig {
        output: Some(Value::String(dir.path().display().to_string())),
        ..Default::default()
    }
}

fn string(s: &str) -> Option<Value> {
    Some(Value::String(s.to_string()))
}

#[test]
fn test_defaults() {
    let dir = tempdir().unwrap();
    let config = Config::validate(&raw_with_output(&dir)).unwrap();

    assert!(!config.verbosity);
    assert_eq!(config.contest_count, 100);
    assert_eq!(config.worker_count, 1);
    assert_eq!(config.opponent, PlayerKind::Random);
    assert_eq!(config.engine_path, None);
    assert_eq!(config.output_dir, dir.path());
    assert_eq!(config.move_time(), Duration::from_millis(100));
}

#[test]
fn test_count_accepts_zero_and_numeric_strings() {
    let dir = tempdir().unwrap();

    let mut raw = raw_with_output(&dir);
    raw.simulations = Some(Value::Integer(0));
    assert_eq!(Config::validate(&raw).unwrap().contest_count, 0);

    raw.simulations = string("12");
    assert_eq!(Config::validate(&raw).unwrap().contest_count, 12);
}

#[test]
fn test_invalid_count() {
    let dir = tempdir().unwrap();
    for bad in [Value::Integer(-1), Value::String("lots".into()), Value::Float(2.5)] {
        let mut raw = raw_with_output(&dir);
        raw.simulations = Some(bad);
        assert!(matches!(
            Config::validate(&raw),
            Err(ValidationError::InvalidCount(_))
        ));
    }
}

#[test]
fn test_invalid_worker_count() {
    let dir = tempdir().unwrap();
    let mut raw = raw_with_output(&dir);
    raw.threads = Some(Value::Integer(0));

    assert!(matches!(
        Config::validate(&raw),
        Err(ValidationError::InvalidWorkerCount(_))
    ));
}

#[test]
fn test_count_is_checked_before_workers() {
    let dir = tempdir().unwrap();
    let mut raw = raw_with_output(&dir);
    raw.simulations = Some(Value::Integer(-5));
    raw.threads = Some(Value::Integer(0));

    assert!(matches!(
        Config::validate(&raw),
        Err(ValidationError::InvalidCount(_))
    ));
}

#[test]
fn test_opponent_is_case_insensitive() {
    let dir = tempdir().unwrap();
    let mut raw = raw_with_output(&dir);

    raw.opponent = string("rAnDoM");
    assert_eq!(Config::validate(&raw).unwrap().opponent, PlayerKind::Random);

    raw.opponent = string("stockfish");
    assert_eq!(
        Config::validate(&raw),
        Err(ValidationError::InvalidOpponent("\"stockfish\"".to_string()))
    );

    raw.opponent = Some(Value::Integer(1));
    assert!(matches!(
        Config::validate(&raw),
        Err(ValidationError::InvalidOpponent(_))
    ));
}

#[test]
fn test_engine_requires_existing_path() {
    let dir = tempdir().unwrap();
    let mut raw = raw_with_output(&dir);
    raw.opponent = string("engine");

    assert_eq!(
        Config::validate(&raw),
        Err(ValidationError::MissingEngine(None))
    );

    raw.engine = string("/nonexistent");
    assert_eq!(
        Config::validate(&raw),
        Err(ValidationError::MissingEngine(Some(PathBuf::from("/nonexistent"))))
    );

    let engine = NamedTempFile::new().unwrap();
    raw.engine = string(&engine.path().display().to_string());
    let config = Config::validate(&raw).unwrap();
    assert_eq!(config.opponent, PlayerKind::Engine);
    assert_eq!(config.engine_path.as_deref(), Some(engine.path()));
}

#[test]
fn test_engine_path_is_ignored_for_random_opponent() {
    let dir = tempdir().unwrap();
    let mut raw = raw_with_output(&dir);
    raw.engine = string("/nonexistent");

    let config = Config::validate(&raw).unwrap();
    assert_eq!(config.engine_path, None);
}

#[test]
fn test_missing_output_dir() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");
    let raw = RawConfig {
        output: string(&missing.display().to_string()),
        ..Default::default()
    };

    assert_eq!(
        Config::validate(&raw),
        Err(ValidationError::MissingOutputDir(missing))
    );
}

#[test]
fn test_output_must_be_a_directory() {
    let file = NamedTempFile::new().unwrap();
    let raw = RawConfig {
        output: string(&file.path().display().to_string()),
        ..Default::default()
    };

    assert!(matches!(
        Config::validate(&raw),
        Err(ValidationError::MissingOutputDir(_))
    ));
}

#[test]
fn test_invalid_move_time() {
    let dir = tempdir().unwrap();
    let mut raw = raw_with_output(&dir);
    raw.move_time_ms = Some(Value::Integer(0));

    assert!(matches!(
        Config::validate(&raw),
        Err(ValidationError::InvalidMoveTime(_))
    ));
}

#[test]
fn test_verbosity_values() {
    let dir = tempdir().unwrap();
    let mut raw = raw_with_output(&dir);

    raw.verbosity = Some(Value::Boolean(true));
    assert!(Config::validate(&raw).unwrap().verbosity);

    raw.verbosity = string("TRUE");
    assert!(Config::validate(&raw).unwrap().verbosity);

    raw.verbosity = Some(Value::Integer(3));
    assert!(!Config::validate(&raw).unwrap().verbosity);
}

#[test]
fn test_command_line_overrides_file() {
    let file = RawConfig {
        simulations: Some(Value::Integer(10)),
        threads: Some(Value::Integer(4)),
        opponent: string("Engine"),
        ..Default::default()
    };
    let cli = RawConfig {
        simulations: string("3"),
        opponent: string("random"),
        ..Default::default()
    };

    let merged = file.merge(cli);

    assert_eq!(merged.simulations, string("3"));
    assert_eq!(merged.opponent, string("random"));
    assert_eq!(merged.threads, Some(Value::Integer(4)));
    assert_eq!(merged.output, None);
}

#[test]
fn test_load_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "simulations = 8\nthreads = 2\nopponent = \"Engine\"\nengine = \"/usr/bin/stockfish\"\nverbosity = true"
    )
    .unwrap();

    let raw = RawConfig::load(file.path()).unwrap();

    assert_eq!(raw.simulations, Some(Value::Integer(8)));
    assert_eq!(raw.threads, Some(Value::Integer(2)));
    assert_eq!(raw.engine, string("/usr/bin/stockfish"));
    assert_eq!(raw.verbosity, Some(Value::Boolean(true)));
    assert_eq!(raw.output, None);
}

#[test]
fn test_load_rejects_malformed_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "simulations = = 3").unwrap();

    assert!(matches!(
        RawConfig::load(file.path()),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn test_missing_optional_file_gives_defaults() {
    let dir = tempdir().unwrap();

    let raw = RawConfig::load_optional(&dir.path().join("config.toml")).unwrap();
    assert_eq!(raw, RawConfig::default());

    assert!(matches!(
        RawConfig::load(&dir.path().join("config.toml")),
        Err(ConfigError::Io { .. })
    ));
}

#[test]
fn test_empty_strings_fall_back_to_defaults() {
    let dir = tempdir().unwrap();
    let mut raw = raw_with_output(&dir);
    raw.opponent = string("");
    assert_eq!(Config::validate(&raw).unwrap().opponent, PlayerKind::Random);

    raw.opponent = string("engine");
    raw.engine = string("");
    assert_eq!(
        Config::validate(&raw),
        Err(ValidationError::MissingEngine(None))
    );

    let raw = RawConfig {
        output: string("  "),
        ..Default::default()
    };
    // The default directory may or may not exist where tests run
    match Config::validate(&raw) {
        Ok(config) => assert_eq!(config.output_dir, Path::new(DEFAULT_OUTPUT_DIR)),
        Err(err) => assert_eq!(
            err,
            ValidationError::MissingOutputDir(PathBuf::from(DEFAULT_OUTPUT_DIR))
        ),
    }
}

#[test]
fn test_non_string_output_is_rejected() {
    for bad in [Value::Integer(7), Value::Boolean(true)] {
        let raw = RawConfig {
            output: Some(bad.clone()),
            ..Default::default()
        };
        assert_eq!(
            Config::validate(&raw),
            Err(ValidationError::MissingOutputDir(PathBuf::from(
                bad.to_string()
            )))
        );
    }
}
