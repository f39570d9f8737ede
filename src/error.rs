use std::io;

use thiserror::Error;

/// Errors surfaced by the logging bootstrap.
///
/// Most configuration problems are intentionally *not* represented here:
/// the bootstrap falls back to the host's default logging on malformed
/// input instead of failing startup. The variants below cover the few
/// places where a caller can meaningfully inspect or propagate a failure.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration property had a value that could not be parsed.
    #[error("invalid value for property {key}: {value:?}")]
    Bind { key: String, value: String },

    /// A rolling file-name pattern could not be understood.
    #[error("invalid rolling file-name pattern {pattern:?}: {reason}")]
    Pattern { pattern: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The assembled appender set was rejected by the logging engine.
    #[error("logging engine rejected configuration: {0}")]
    Engine(#[from] log4rs::config::runtime::ConfigErrors),

    /// A global logger was already installed by someone else.
    #[error("global logger already installed: {0}")]
    AlreadyInstalled(#[from] log::SetLoggerError),
}

pub type Result<T> = std::result::Result<T, Error>;
