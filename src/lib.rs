//! # Logspace
//!
//! A rolling-log bootstrap for the `log`/log4rs ecosystem: reads a
//! configuration block from a layered property environment and wires a
//! console sink plus size-and-time rolling file sinks onto the root
//! logging channel.
//!
//! ## Key Features
//!
//! * Property-driven setup with sensible defaults for every knob
//! * Size AND time based rollover with date-and-index segment naming
//! * Retention count and total-size cap, enforced at startup too
//! * A derived error-only file stream next to every primary stream
//! * At most one console sink per channel, no matter how often the
//!   assembly runs
//! * `${...}` placeholder resolution against the environment, with
//!   unresolvable tokens left verbatim
//! * Fail-open behavior: malformed configuration disables the feature
//!   and leaves the host's own logging untouched
//!
//! ## Main Components
//!
//! * [`Environment`]: layered key-value property lookup with
//!   placeholder resolution
//! * [`LoggingProperties`]: one stream's configuration, bound from the
//!   `logspace.*` namespace
//! * [`SizeAndTimePolicy`]: the rolling policy plugged into the engine's
//!   file appender
//! * [`LoggingContext`]: explicit per-channel assembly state, installed
//!   once at the end
//! * [`LogspaceSystem`]: the configurer orchestrating a whole bootstrap
//!   run
//!
//! ## Quick Start
//!
//! ```no_run
//! use logspace::{Environment, PropertySource};
//!
//! let mut source = PropertySource::new("application");
//! source.put("application.name", "orders");
//! source.put("logspace.path", "var/log");
//!
//! let mut env = Environment::new();
//! env.add_first(source);
//!
//! match logspace::init(&mut env) {
//!     Ok(Some(_handle)) => log::info!("rolling logs configured"),
//!     Ok(None) => {} // feature off, host defaults stay in place
//!     Err(err) => eprintln!("logging bootstrap failed: {err}"),
//! }
//! ```

pub mod assembler;
pub mod bootstrap;
pub mod environment;
pub mod error;
pub mod file_size;
pub mod policy;
pub mod properties;

pub use assembler::LoggingContext;
pub use bootstrap::{init, LoggingSystem, LogspaceSystem, SinkSet, KEY_ENABLED};
pub use environment::{Environment, PropertySource};
pub use error::{Error, Result};
pub use file_size::FileSize;
pub use policy::{SegmentPattern, SizeAndTimePolicy};
pub use properties::LoggingProperties;
