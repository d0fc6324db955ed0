//! Application initialization.

use env_logger::Builder;
use log::{LevelFilter, SetLoggerError};

/// Initializes the logger with the given level.
///
/// `RUST_LOG` still wins when set, so the CLI default can be overridden per
/// invocation without a flag.
///
/// # Errors
///
/// Returns an error if a global logger was already installed.
pub fn init_logger_with(level: LevelFilter) -> Result<(), SetLoggerError> {
    let mut builder = Builder::new();
    builder.filter_level(level);
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    builder.try_init()
}
