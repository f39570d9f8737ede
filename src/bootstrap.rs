use log::{info, warn, LevelFilter};

use crate::assembler::{
    attach_root, file_appender, LoggingContext, CONSOLE_PATTERN_KEY, FILE_PATTERN_KEY,
};
use crate::environment::Environment;
use crate::error::Result;
use crate::properties::{
    LoggingProperties, DEFAULT_ERROR_FILE_PATTERN, ERROR_MAX_HISTORY,
};

/// Context property carrying the bootstrap's on/off outcome, published
/// as `"true"` or `"false"` on every configure run.
pub const KEY_ENABLED: &str = "LOGSPACE_ENABLED";

/// Ambient key naming the application.
pub const APPLICATION_NAME_KEY: &str = "application.name";

/// Ambient fallback used for the application name when only a config
/// client name is available.
pub const CONFIG_NAME_KEY: &str = "config.name";

/// Property controlling the root channel level.
pub const ROOT_LEVEL_KEY: &str = "logging.level.root";

/// Application name of last resort.
pub const FALLBACK_APP_NAME: &str = "unknown-app";

/// Console encoder template. Placeholders are resolved against the
/// environment before the template is published, so the application
/// name and any ambient trace identifiers are baked into the pattern.
pub const CONSOLE_LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {h({l:<5})} \
     [${application.name:-},${trace.id:-},${span.id:-},${span.export:-}] [{T}] {t} - {m}{n}";

/// File encoder template, published alongside the console template
/// under its own key so the two may diverge.
pub const FILE_LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{T}] {l:<5} \
     [${application.name:-},${trace.id:-},${span.id:-},${span.export:-}] {M}:{L} - {m}{n}";

/// A pluggable logging configurer.
///
/// The host's composition root owns the [`Environment`] and the
/// [`LoggingContext`] and hands both to whichever configurer it was
/// assembled with. Implementations must never fail host startup: all
/// configuration problems degrade to "leave the host's own logging
/// untouched".
pub trait LoggingSystem {
    /// Configures sinks into the context and reports which were built.
    fn configure(&self, env: &mut Environment, ctx: &mut LoggingContext) -> SinkSet;
}

/// Names of the sinks a configure run attached.
#[derive(Debug, Default)]
pub struct SinkSet {
    names: Vec<String>,
}

impl SinkSet {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// The rolling-file logging system.
///
/// One configure run binds the `logspace.*` properties, publishes the
/// derived defaults into the environment, and attaches three sinks to
/// the root channel: a rolling file sink for the stream, a second
/// error-only rolling file sink derived from it, and a console sink.
///
/// # Examples
///
/// ```no_run
/// use logspace::{Environment, LoggingContext, LoggingSystem, LogspaceSystem};
///
/// let mut env = Environment::new();
/// let mut ctx = LoggingContext::new();
/// let sinks = LogspaceSystem::new().configure(&mut env, &mut ctx);
///
/// if !sinks.is_empty() {
///     let _handle = ctx.install().expect("logging engine rejected configuration");
/// }
/// ```
#[derive(Debug, Default)]
pub struct LogspaceSystem;

impl LogspaceSystem {
    pub fn new() -> Self {
        LogspaceSystem
    }
}

impl LoggingSystem for LogspaceSystem {
    fn configure(&self, env: &mut Environment, ctx: &mut LoggingContext) -> SinkSet {
        let mut props = match LoggingProperties::bind(env) {
            Ok(props) => props,
            Err(err) => {
                // Kill switch: a malformed configuration disables the
                // whole feature rather than half-applying it.
                warn!("malformed logging configuration ({err}), leaving host logging untouched");
                ctx.put_property(KEY_ENABLED, "false");
                return SinkSet::default();
            }
        };
        props.apply_debug_overrides(env);

        if !props.enabled {
            info!("rolling log configuration disabled");
            ctx.put_property(KEY_ENABLED, "false");
            return SinkSet::default();
        }

        prepare_environment(env);

        let app_name = env
            .property(APPLICATION_NAME_KEY)
            .filter(|name| !name.is_empty())
            .unwrap_or(FALLBACK_APP_NAME)
            .to_string();

        let root_level = env
            .property(ROOT_LEVEL_KEY)
            .and_then(|raw| raw.parse::<LevelFilter>().ok())
            .or(props.threshold)
            .unwrap_or(LevelFilter::Info);

        let primary = match file_appender(env, &props, &app_name) {
            Ok(primary) => primary,
            Err(err) => {
                warn!("could not build log file sink ({err}), leaving host logging untouched");
                ctx.put_property(KEY_ENABLED, "false");
                return SinkSet::default();
            }
        };
        let error_props = error_log_properties(&props, &app_name);
        let error = match file_appender(env, &error_props, &app_name) {
            Ok(error) => error,
            Err(err) => {
                warn!("could not build error log sink ({err}), leaving host logging untouched");
                ctx.put_property(KEY_ENABLED, "false");
                return SinkSet::default();
            }
        };

        ctx.put_property(KEY_ENABLED, "true");
        let names = vec![primary.0.clone(), error.0.clone()];
        attach_root(ctx, env, Some(root_level), vec![primary, error]);

        // Fixed post-condition for richer stack traces.
        ctx.set_packaging_data_enabled(true);

        SinkSet { names }
    }
}

/// Publishes derived defaults into the lowest-priority property layer.
///
/// The config client name is promoted to `application.name` when no
/// application name exists anywhere, never overwriting one that does.
/// Both encoder templates are resolved and published afterwards so they
/// pick up the merged name, and the root channel level defaults to
/// `info`.
pub fn prepare_environment(env: &mut Environment) {
    let app_name_missing = env
        .property(APPLICATION_NAME_KEY)
        .map_or(true, str::is_empty);
    let config_name = env
        .property(CONFIG_NAME_KEY)
        .filter(|name| !name.is_empty())
        .map(str::to_owned);

    if app_name_missing {
        if let Some(config_name) = config_name {
            env.default_properties().put(APPLICATION_NAME_KEY, &config_name);
        }
    }

    let console_pattern = env.resolve_placeholders(CONSOLE_LOG_PATTERN);
    env.default_properties().put(CONSOLE_PATTERN_KEY, &console_pattern);

    let file_pattern = env.resolve_placeholders(FILE_LOG_PATTERN);
    env.default_properties().put(FILE_PATTERN_KEY, &file_pattern);

    env.default_properties().put(ROOT_LEVEL_KEY, "info");
}

/// Derives the error-only stream from the primary stream.
///
/// The error stream always logs at ERROR, rolls daily, keeps seven
/// units of history, and registers as `{app}-error`, regardless of how
/// the primary stream is tuned.
pub fn error_log_properties(primary: &LoggingProperties, app_name: &str) -> LoggingProperties {
    LoggingProperties {
        enabled: true,
        threshold: Some(LevelFilter::Error),
        file: Some(match &primary.file {
            Some(file) => format!("{file}-error.log"),
            None => format!("{app_name}-error.log"),
        }),
        path: primary.path.clone(),
        rolling_file_pattern: Some(DEFAULT_ERROR_FILE_PATTERN.to_string()),
        max_history: Some(ERROR_MAX_HISTORY),
        appender_name: Some(format!("{app_name}-error")),
        max_file_size: None,
        total_size_cap: None,
    }
}

/// One-call bootstrap: configure against the environment and, when the
/// feature is on, install the assembled configuration as the global
/// logger. Returns `None` when the feature is off so the host keeps its
/// own logging setup.
pub fn init(env: &mut Environment) -> Result<Option<log4rs::Handle>> {
    let mut ctx = LoggingContext::new();
    LogspaceSystem::new().configure(env, &mut ctx);

    if ctx.property(KEY_ENABLED) != Some("true") {
        return Ok(None);
    }
    ctx.install().map(Some)
}
