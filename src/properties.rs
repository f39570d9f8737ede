use log::{info, LevelFilter};

use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::file_size::FileSize;

/// Namespace prefix for all configuration keys consumed by the bootstrap.
pub const PREFIX: &str = "logspace";

/// Directory used when no `path` property is configured.
pub const DEFAULT_PATH: &str = "log";

/// Segment size cap used when `max-file-size` is not configured.
pub const DEFAULT_MAX_FILE_SIZE: FileSize = FileSize::from_bytes(250 * 1024 * 1024);

/// Stream-wide disk budget used when `total-size-cap` is not configured.
pub const DEFAULT_TOTAL_SIZE_CAP: FileSize = FileSize::from_bytes(15 * 1024 * 1024 * 1024);

/// Historical segments kept by default, seven days of hourly rollover.
pub const DEFAULT_MAX_HISTORY: u32 = 24 * 7;

/// Rolling name pattern used when `rolling-file-pattern` is not configured.
pub const DEFAULT_FILE_PATTERN: &str = "{date:yyyy-MM-dd-HH}-{index}";

/// Rolling name pattern forced onto the derived error stream.
pub const DEFAULT_ERROR_FILE_PATTERN: &str = "{date:yyyy-MM-dd}-{index}";

/// Historical segments kept for the derived error stream.
pub const ERROR_MAX_HISTORY: u32 = 7;

/// Configuration of one logical log stream, bound from the environment.
///
/// Every field except `enabled` is optional: a missing key stays `None`
/// here and the documented default is applied when the stream's sink is
/// assembled. The struct is bound once during bootstrap and never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct LoggingProperties {
    pub enabled: bool,
    pub max_history: Option<u32>,
    pub max_file_size: Option<FileSize>,
    pub total_size_cap: Option<FileSize>,
    pub threshold: Option<LevelFilter>,
    pub file: Option<String>,
    pub path: Option<String>,
    pub rolling_file_pattern: Option<String>,
    pub appender_name: Option<String>,
}

impl Default for LoggingProperties {
    fn default() -> Self {
        LoggingProperties {
            enabled: true,
            max_history: None,
            max_file_size: None,
            total_size_cap: None,
            threshold: None,
            file: None,
            path: None,
            rolling_file_pattern: None,
            appender_name: None,
        }
    }
}

impl LoggingProperties {
    /// Binds the `logspace.*` keys from the environment.
    ///
    /// Missing keys leave their field unset. A present key whose value
    /// cannot be parsed is a structural error: the caller treats it as a
    /// kill switch and skips sink construction entirely rather than
    /// guessing at intent.
    pub fn bind(env: &Environment) -> Result<Self> {
        let mut props = LoggingProperties::default();

        if let Some(raw) = prefixed(env, "enabled") {
            props.enabled = match raw.to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                _ => return Err(bind_error("enabled", raw)),
            };
        }
        if let Some(raw) = prefixed(env, "max-history") {
            props.max_history = Some(raw.parse().map_err(|_| bind_error("max-history", raw))?);
        }
        if let Some(raw) = prefixed(env, "max-file-size") {
            props.max_file_size = Some(raw.parse().map_err(|_| bind_error("max-file-size", raw))?);
        }
        if let Some(raw) = prefixed(env, "total-size-cap") {
            props.total_size_cap =
                Some(raw.parse().map_err(|_| bind_error("total-size-cap", raw))?);
        }
        if let Some(raw) = prefixed(env, "threshold") {
            props.threshold = Some(raw.parse().map_err(|_| bind_error("threshold", raw))?);
        }
        props.file = prefixed(env, "file").map(str::to_owned);
        props.path = prefixed(env, "path").map(str::to_owned);
        props.rolling_file_pattern = prefixed(env, "rolling-file-pattern").map(str::to_owned);
        props.appender_name = prefixed(env, "appender-name").map(str::to_owned);

        Ok(props)
    }

    /// Forces the threshold down when an ambient `trace` or `debug` flag
    /// is set, trace taking precedence over debug.
    pub fn apply_debug_overrides(&mut self, env: &Environment) {
        if env.is_flag_set("trace") {
            info!("trace mode, forcing default threshold to trace");
            self.threshold = Some(LevelFilter::Trace);
        } else if env.is_flag_set("debug") {
            info!("debug mode, forcing default threshold to debug");
            self.threshold = Some(LevelFilter::Debug);
        }
    }
}

fn prefixed<'a>(env: &'a Environment, key: &str) -> Option<&'a str> {
    env.property(&format!("{PREFIX}.{key}"))
}

fn bind_error(key: &str, value: &str) -> Error {
    Error::Bind {
        key: format!("{PREFIX}.{key}"),
        value: value.to_string(),
    }
}
