use log::LevelFilter;
use logspace::file_size::InvalidFileSize;
use logspace::properties::{
    DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_HISTORY, DEFAULT_TOTAL_SIZE_CAP,
};
use logspace::{Environment, FileSize, LoggingProperties, PropertySource};

fn env_with(pairs: &[(&str, &str)]) -> Environment {
    let mut source = PropertySource::new("test");
    for (key, value) in pairs {
        source.put(key, value);
    }
    let mut env = Environment::new();
    env.add_first(source);
    env
}

#[test]
fn test_bind_empty_environment_leaves_fields_unset() {
    let props = LoggingProperties::bind(&Environment::new()).unwrap();
    assert!(props.enabled, "enabled defaults to true");
    assert_eq!(props.max_history, None);
    assert_eq!(props.max_file_size, None);
    assert_eq!(props.total_size_cap, None);
    assert_eq!(props.threshold, None);
    assert_eq!(props.file, None);
    assert_eq!(props.path, None);
    assert_eq!(props.rolling_file_pattern, None);
    assert_eq!(props.appender_name, None);
}

#[test]
fn test_bind_full_configuration() {
    let env = env_with(&[
        ("logspace.enabled", "true"),
        ("logspace.max-history", "24"),
        ("logspace.max-file-size", "10MB"),
        ("logspace.total-size-cap", "1GB"),
        ("logspace.threshold", "warn"),
        ("logspace.file", "svc.log"),
        ("logspace.path", "var/log"),
        ("logspace.rolling-file-pattern", "{date:yyyy-MM-dd}-{index}"),
        ("logspace.appender-name", "svc-appender"),
    ]);
    let props = LoggingProperties::bind(&env).unwrap();

    assert!(props.enabled);
    assert_eq!(props.max_history, Some(24));
    assert_eq!(props.max_file_size, Some(FileSize::from_bytes(10 * 1024 * 1024)));
    assert_eq!(props.total_size_cap, Some(FileSize::from_bytes(1024 * 1024 * 1024)));
    assert_eq!(props.threshold, Some(LevelFilter::Warn));
    assert_eq!(props.file.as_deref(), Some("svc.log"));
    assert_eq!(props.path.as_deref(), Some("var/log"));
    assert_eq!(
        props.rolling_file_pattern.as_deref(),
        Some("{date:yyyy-MM-dd}-{index}")
    );
    assert_eq!(props.appender_name.as_deref(), Some("svc-appender"));
}

#[test]
fn test_bind_disabled() {
    let env = env_with(&[("logspace.enabled", "false")]);
    let props = LoggingProperties::bind(&env).unwrap();
    assert!(!props.enabled);
}

#[test]
fn test_bind_rejects_malformed_enabled() {
    let env = env_with(&[("logspace.enabled", "yes")]);
    assert!(LoggingProperties::bind(&env).is_err());
}

#[test]
fn test_bind_rejects_malformed_max_history() {
    let env = env_with(&[("logspace.max-history", "lots")]);
    assert!(LoggingProperties::bind(&env).is_err());
}

#[test]
fn test_bind_rejects_malformed_size() {
    let env = env_with(&[("logspace.max-file-size", "10TB")]);
    assert!(LoggingProperties::bind(&env).is_err());
}

#[test]
fn test_bind_rejects_malformed_threshold() {
    let env = env_with(&[("logspace.threshold", "loud")]);
    assert!(LoggingProperties::bind(&env).is_err());
}

#[test]
fn test_threshold_parsed_case_insensitively() {
    let env = env_with(&[("logspace.threshold", "ERROR")]);
    let props = LoggingProperties::bind(&env).unwrap();
    assert_eq!(props.threshold, Some(LevelFilter::Error));
}

#[test]
fn test_trace_flag_forces_trace() {
    let env = env_with(&[("trace", "true")]);
    let mut props = LoggingProperties::default();
    props.apply_debug_overrides(&env);
    assert_eq!(props.threshold, Some(LevelFilter::Trace));
}

#[test]
fn test_trace_wins_over_debug() {
    let env = env_with(&[("trace", "true"), ("debug", "true")]);
    let mut props = LoggingProperties::default();
    props.threshold = Some(LevelFilter::Warn);
    props.apply_debug_overrides(&env);
    assert_eq!(props.threshold, Some(LevelFilter::Trace), "trace takes precedence");
}

#[test]
fn test_debug_flag_forces_debug() {
    let env = env_with(&[("debug", "true")]);
    let mut props = LoggingProperties::default();
    props.apply_debug_overrides(&env);
    assert_eq!(props.threshold, Some(LevelFilter::Debug));
}

#[test]
fn test_false_flags_leave_threshold_alone() {
    let env = env_with(&[("trace", "false"), ("debug", "false")]);
    let mut props = LoggingProperties::default();
    props.apply_debug_overrides(&env);
    assert_eq!(props.threshold, None);
}

#[test]
fn test_documented_defaults() {
    assert_eq!(DEFAULT_MAX_FILE_SIZE.bytes(), 250 * 1024 * 1024);
    assert_eq!(DEFAULT_TOTAL_SIZE_CAP.bytes(), 15 * 1024 * 1024 * 1024);
    assert_eq!(DEFAULT_MAX_HISTORY, 168);
}

#[test]
fn test_file_size_parsing() {
    assert_eq!("250MB".parse::<FileSize>().unwrap().bytes(), 250 * 1024 * 1024);
    assert_eq!(
        "15gb".parse::<FileSize>().unwrap().bytes(),
        15 * 1024 * 1024 * 1024
    );
    assert_eq!("512 KB".parse::<FileSize>().unwrap().bytes(), 512 * 1024);
    assert_eq!("1024".parse::<FileSize>().unwrap().bytes(), 1024);
    assert_eq!("100b".parse::<FileSize>().unwrap().bytes(), 100);
}

#[test]
fn test_file_size_rejects_garbage() {
    assert_eq!(
        "".parse::<FileSize>(),
        Err(InvalidFileSize(String::new()))
    );
    assert!("lots".parse::<FileSize>().is_err());
    assert!("12.5MB".parse::<FileSize>().is_err());
    assert!("10TB".parse::<FileSize>().is_err());
}

#[test]
fn test_file_size_display_round_trip() {
    assert_eq!(FileSize::from_bytes(250 * 1024 * 1024).to_string(), "250MB");
    assert_eq!(
        FileSize::from_bytes(15 * 1024 * 1024 * 1024).to_string(),
        "15GB"
    );
    assert_eq!(FileSize::from_bytes(1024).to_string(), "1KB");
    assert_eq!(FileSize::from_bytes(1000).to_string(), "1000B");
}
