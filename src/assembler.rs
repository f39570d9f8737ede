use std::collections::HashMap;
use std::path::Path;

use log::{warn, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::filter::threshold::ThresholdFilter;

use crate::environment::Environment;
use crate::error::Result;
use crate::policy::SizeAndTimePolicy;
use crate::properties::{LoggingProperties, DEFAULT_FILE_PATTERN, DEFAULT_PATH};

/// Name given to the console appender the assembler creates.
pub const CONSOLE_APPENDER_NAME: &str = "console";

/// Property key holding the console encoder pattern.
pub const CONSOLE_PATTERN_KEY: &str = "logging.pattern.console";

/// Property key holding the file encoder pattern.
pub const FILE_PATTERN_KEY: &str = "logging.pattern.file";

/// Encoder pattern used when neither pattern property is set.
pub const FALLBACK_LOG_PATTERN: &str =
    "{d(%Y-%m-%d %H:%M:%S%.3f)} [{T}] {l:<5} {M}:{L} - {m}{n}";

/// Explicit assembly state for one logging channel.
///
/// The context accumulates the appenders attached to the root channel,
/// the root level, and a small property map carrying bootstrap flags.
/// It is created by the host's composition root and passed into the
/// configurer; nothing here touches global state until [`install`] hands
/// the finished configuration to the engine.
///
/// [`install`]: LoggingContext::install
#[derive(Default)]
pub struct LoggingContext {
    appenders: Vec<(String, Appender)>,
    root_level: Option<LevelFilter>,
    properties: HashMap<String, String>,
    packaging_data_enabled: bool,
}

impl LoggingContext {
    pub fn new() -> Self {
        LoggingContext::default()
    }

    pub fn put_property(&mut self, key: &str, value: &str) {
        self.properties.insert(key.to_string(), value.to_string());
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Capability flag for richer stack traces in log output.
    pub fn set_packaging_data_enabled(&mut self, enabled: bool) {
        self.packaging_data_enabled = enabled;
    }

    pub fn packaging_data_enabled(&self) -> bool {
        self.packaging_data_enabled
    }

    pub fn root_level(&self) -> Option<LevelFilter> {
        self.root_level
    }

    pub fn set_root_level(&mut self, level: LevelFilter) {
        self.root_level = Some(level);
    }

    /// Attaches an appender to the root channel.
    pub fn attach(&mut self, name: &str, appender: Appender) {
        self.appenders.push((name.to_string(), appender));
    }

    pub fn appender_count(&self) -> usize {
        self.appenders.len()
    }

    pub fn appender_names(&self) -> impl Iterator<Item = &str> {
        self.appenders.iter().map(|(name, _)| name.as_str())
    }

    /// True when any attached appender's name contains `console`,
    /// compared case-insensitively.
    pub fn has_console_appender(&self) -> bool {
        self.appenders
            .iter()
            .any(|(name, _)| name.to_lowercase().contains(CONSOLE_APPENDER_NAME))
    }

    /// Finishes the context into an engine configuration.
    pub fn into_config(self) -> Result<Config> {
        let mut builder = Config::builder();
        let mut root = Root::builder();
        for (name, appender) in self.appenders {
            root = root.appender(name);
            builder = builder.appender(appender);
        }
        let config = builder.build(root.build(self.root_level.unwrap_or(LevelFilter::Info)))?;
        Ok(config)
    }

    /// Builds the configuration and installs it as the process-wide
    /// logger. Fatal when another global logger is already registered.
    pub fn install(self) -> Result<log4rs::Handle> {
        let config = self.into_config()?;
        Ok(log4rs::init_config(config)?)
    }
}

/// Builds the console appender with a pattern encoder.
///
/// The pattern comes from the `logging.pattern.console` property, with a
/// fixed fallback template when unset.
pub fn console_appender(env: &Environment) -> (String, Appender) {
    let pattern = env
        .property(CONSOLE_PATTERN_KEY)
        .unwrap_or(FALLBACK_LOG_PATTERN);
    let pattern = env.resolve_placeholders(pattern);

    let appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(&pattern)))
        .build();

    let appender = Appender::builder().build(CONSOLE_APPENDER_NAME, Box::new(appender));
    (CONSOLE_APPENDER_NAME.to_string(), appender)
}

/// Builds a rolling file appender for one stream.
///
/// The target file is `{path}/{file}` with the `.log` suffix applied
/// idempotently and placeholders resolved in both parts. A threshold
/// filter is attached when the stream has one, and the appender is
/// registered under the explicit `appender-name` override or else the
/// application name.
pub fn file_appender(
    env: &Environment,
    props: &LoggingProperties,
    app_name: &str,
) -> Result<(String, Appender)> {
    let pattern = env
        .property(FILE_PATTERN_KEY)
        .unwrap_or(FALLBACK_LOG_PATTERN);
    let encoder = PatternEncoder::new(&env.resolve_placeholders(pattern));

    let path = props.path.as_deref().unwrap_or(DEFAULT_PATH);
    let path = env.resolve_placeholders(path);
    let file = log_file_name(props.file.as_deref().unwrap_or(app_name));
    let file = env.resolve_placeholders(&file);
    let target = format!("{path}/{file}");

    let policy = rolling_policy(props, &path, &file)?;
    let appender = RollingFileAppender::builder()
        .encoder(Box::new(encoder))
        .append(true)
        .build(&target, Box::new(policy))?;

    let mut builder = Appender::builder();
    if let Some(threshold) = props.threshold {
        builder = builder.filter(Box::new(ThresholdFilter::new(threshold)));
    }

    let name = props
        .appender_name
        .clone()
        .unwrap_or_else(|| app_name.to_string());
    let appender = builder.build(name.as_str(), Box::new(appender));
    Ok((name, appender))
}

/// Builds the rolling policy for a stream, applying the documented
/// defaults for any cap the stream leaves unset.
///
/// An unusable `rolling-file-pattern` falls back to the default pattern
/// with a warning instead of failing the stream.
pub fn rolling_policy(
    props: &LoggingProperties,
    path: &str,
    file: &str,
) -> Result<SizeAndTimePolicy> {
    let mut builder = SizeAndTimePolicy::builder();
    if let Some(size) = props.max_file_size {
        builder = builder.max_file_size(size);
    }
    if let Some(cap) = props.total_size_cap {
        builder = builder.total_size_cap(cap);
    }
    if let Some(history) = props.max_history {
        builder = builder.max_history(history);
    }

    let rolling = props
        .rolling_file_pattern
        .as_deref()
        .unwrap_or(DEFAULT_FILE_PATTERN);

    match builder
        .clone()
        .build(&rolling_file_name_pattern(path, file, rolling))
    {
        Ok(policy) => Ok(policy),
        Err(err) if rolling != DEFAULT_FILE_PATTERN => {
            warn!(
                "unusable rolling file pattern {rolling:?} ({err}), \
                 falling back to {DEFAULT_FILE_PATTERN:?}"
            );
            builder.build(&rolling_file_name_pattern(path, file, DEFAULT_FILE_PATTERN))
        }
        Err(err) => Err(err),
    }
}

/// Attaches sinks to the root channel.
///
/// Sets the channel level when one is given, attaches every sink, and
/// then guarantees exactly one console sink: a new console appender is
/// created only when no attached appender's name already contains
/// `console` (case-insensitive), no matter how many times this runs.
pub fn attach_root(
    ctx: &mut LoggingContext,
    env: &Environment,
    level: Option<LevelFilter>,
    sinks: Vec<(String, Appender)>,
) {
    if let Some(level) = level {
        ctx.set_root_level(level);
    }
    for (name, appender) in sinks {
        ctx.attach(&name, appender);
    }

    if !ctx.has_console_appender() {
        let (name, appender) = console_appender(env);
        ctx.attach(&name, appender);
    }
}

/// Applies the `.log` suffix unless the name already ends with it.
pub fn log_file_name(name: &str) -> String {
    if name.ends_with(".log") {
        name.to_string()
    } else {
        format!("{name}.log")
    }
}

/// Derives the rolling file-name pattern for a stream's segments.
///
/// The base name is everything before the first `.log` occurrence in
/// the file name, not before the extension: a name like
/// `app.log.bak.log` truncates to `app`. Historical segment names have
/// always been derived this way, so the truncation is kept as-is.
pub fn rolling_file_name_pattern(path: &str, file: &str, rolling_pattern: &str) -> String {
    let full = Path::new(path).join(file);
    let dir = full
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = file.split(".log").next().unwrap_or(file);
    format!("{dir}/{base}-{rolling_pattern}.log")
}
