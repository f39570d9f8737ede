use log::LevelFilter;
use logspace::bootstrap::{
    error_log_properties, prepare_environment, APPLICATION_NAME_KEY, CONFIG_NAME_KEY,
    ROOT_LEVEL_KEY,
};
use logspace::properties::DEFAULT_ERROR_FILE_PATTERN;
use logspace::{
    Environment, LoggingContext, LoggingProperties, LoggingSystem, LogspaceSystem,
    PropertySource, KEY_ENABLED,
};
use tempfile::TempDir;

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
fn test_disabled_stream_builds_no_sinks() {
    let mut env = env_with(&[("logspace.enabled", "false")]);
    let mut ctx = LoggingContext::new();

    let sinks = LogspaceSystem::new().configure(&mut env, &mut ctx);

    assert!(sinks.is_empty());
    assert_eq!(ctx.appender_count(), 0, "no sinks at all, not even console");
    assert_eq!(ctx.property(KEY_ENABLED), Some("false"));
    assert!(!ctx.packaging_data_enabled());
}

#[test]
fn test_malformed_configuration_is_a_kill_switch() {
    let mut env = env_with(&[("logspace.max-file-size", "banana")]);
    let mut ctx = LoggingContext::new();

    let sinks = LogspaceSystem::new().configure(&mut env, &mut ctx);

    assert!(sinks.is_empty());
    assert_eq!(ctx.appender_count(), 0);
    assert_eq!(ctx.property(KEY_ENABLED), Some("false"));
}

#[test]
fn test_full_configure_run() {
    let dir = TempDir::new().unwrap();
    let mut env = env_with(&[
        ("application.name", "orders"),
        ("logspace.path", &dir.path().display().to_string()),
    ]);
    let mut ctx = LoggingContext::new();

    let sinks = LogspaceSystem::new().configure(&mut env, &mut ctx);

    assert_eq!(sinks.names(), ["orders", "orders-error"]);
    assert_eq!(ctx.appender_count(), 3, "primary, error and console sinks");
    assert!(ctx.has_console_appender());
    assert_eq!(ctx.property(KEY_ENABLED), Some("true"));
    assert!(ctx.packaging_data_enabled());
    assert_eq!(ctx.root_level(), Some(LevelFilter::Info));

    assert!(dir.path().join("orders.log").exists());
    assert!(dir.path().join("orders-error.log").exists());

    assert!(ctx.into_config().is_ok(), "assembled sink set is a valid engine config");
}

#[test]
fn test_root_level_override_from_environment() {
    let dir = TempDir::new().unwrap();
    let mut env = env_with(&[
        ("application.name", "orders"),
        ("logspace.path", &dir.path().display().to_string()),
        ("logging.level.root", "warn"),
    ]);
    let mut ctx = LoggingContext::new();

    LogspaceSystem::new().configure(&mut env, &mut ctx);
    assert_eq!(ctx.root_level(), Some(LevelFilter::Warn));
}

#[test]
fn test_unknown_application_falls_back() {
    let dir = TempDir::new().unwrap();
    let mut env = env_with(&[("logspace.path", &dir.path().display().to_string())]);
    let mut ctx = LoggingContext::new();

    let sinks = LogspaceSystem::new().configure(&mut env, &mut ctx);

    assert_eq!(sinks.names(), ["unknown-app", "unknown-app-error"]);
    assert!(dir.path().join("unknown-app.log").exists());
}

#[test]
fn test_error_file_derived_from_configured_file() {
    let dir = TempDir::new().unwrap();
    let mut env = env_with(&[
        ("application.name", "orders"),
        ("logspace.path", &dir.path().display().to_string()),
        ("logspace.file", "svc"),
    ]);
    let mut ctx = LoggingContext::new();

    LogspaceSystem::new().configure(&mut env, &mut ctx);

    assert!(dir.path().join("svc.log").exists());
    assert!(dir.path().join("svc-error.log").exists());
}

#[test]
fn test_error_log_properties_derivation() {
    let props = error_log_properties(&LoggingProperties::default(), "orders");

    assert!(props.enabled);
    assert_eq!(props.threshold, Some(LevelFilter::Error));
    assert_eq!(props.file.as_deref(), Some("orders-error.log"));
    assert_eq!(props.max_history, Some(7));
    assert_eq!(props.appender_name.as_deref(), Some("orders-error"));
    assert_eq!(
        props.rolling_file_pattern.as_deref(),
        Some(DEFAULT_ERROR_FILE_PATTERN)
    );
}

#[test]
fn test_error_log_properties_ignore_primary_tuning() {
    let primary = LoggingProperties {
        file: Some("svc.log".to_string()),
        path: Some("var/log".to_string()),
        threshold: Some(LevelFilter::Trace),
        max_history: Some(500),
        rolling_file_pattern: Some("{date:yyyy-MM-dd-HH}-{index}".to_string()),
        ..LoggingProperties::default()
    };
    let props = error_log_properties(&primary, "orders");

    assert_eq!(props.threshold, Some(LevelFilter::Error), "threshold is forced");
    assert_eq!(props.max_history, Some(7), "retention is forced");
    assert_eq!(props.file.as_deref(), Some("svc.log-error.log"));
    assert_eq!(props.path.as_deref(), Some("var/log"));
    assert_eq!(
        props.rolling_file_pattern.as_deref(),
        Some(DEFAULT_ERROR_FILE_PATTERN),
        "error stream always rolls daily"
    );
}

#[test]
fn test_config_name_promoted_to_application_name() {
    let mut env = env_with(&[(CONFIG_NAME_KEY, "cfg-client")]);
    prepare_environment(&mut env);
    assert_eq!(env.property(APPLICATION_NAME_KEY), Some("cfg-client"));
}

#[test]
fn test_existing_application_name_not_overwritten() {
    let mut env = env_with(&[
        (APPLICATION_NAME_KEY, "orders"),
        (CONFIG_NAME_KEY, "cfg-client"),
    ]);
    prepare_environment(&mut env);
    assert_eq!(env.property(APPLICATION_NAME_KEY), Some("orders"));
}

#[test]
fn test_prepare_environment_publishes_patterns_and_root_level() {
    let mut env = env_with(&[(APPLICATION_NAME_KEY, "orders")]);
    prepare_environment(&mut env);

    let console = env.property("logging.pattern.console").unwrap();
    assert!(console.contains("[orders,"), "application name baked in: {console}");
    let file = env.property("logging.pattern.file").unwrap();
    assert!(file.contains("[orders,"));

    assert_eq!(env.property(ROOT_LEVEL_KEY), Some("info"));
}

#[test]
fn test_published_root_level_yields_to_real_sources() {
    let mut env = env_with(&[(ROOT_LEVEL_KEY, "error")]);
    prepare_environment(&mut env);
    assert_eq!(env.property(ROOT_LEVEL_KEY), Some("error"));
}
