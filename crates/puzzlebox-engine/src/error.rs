//! Error types for the engine binary.

use std::path::PathBuf;

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific startup failure. Once the driver loop is
/// running nothing can fail: timeouts and wrong answers are puzzle
/// events, not errors.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error in {}: {source}", path.display())]
    Config {
        /// The file that was being loaded.
        path: PathBuf,
        /// The underlying config error.
        source: puzzlebox_core::config::ConfigError,
    },

    /// The tracing subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },

    /// The control server failed to start.
    #[error("control server error: {source}")]
    Control {
        /// The underlying startup error.
        #[from]
        source: puzzlebox_control::StartupError,
    },
}
