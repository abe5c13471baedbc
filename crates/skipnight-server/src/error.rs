//! Error types for the bridge binary.
//!
//! [`ServerError`] is the top-level error type that wraps every failure
//! mode of startup and of the stdin/stdout pumps.

/// Top-level error for the bridge binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: skipnight_core::config::ConfigError,
    },

    /// A message template did not compile.
    #[error("message error: {source}")]
    Message {
        /// The underlying template error.
        #[from]
        source: skipnight_core::messaging::MessageError,
    },

    /// The tick loop went away while input was still arriving.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: skipnight_core::runner::RunnerError,
    },

    /// Reading stdin or writing stdout failed.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An output line could not be encoded.
    #[error("JSON error: {source}")]
    Json {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// A background task panicked or was cancelled.
    #[error("task error: {message}")]
    Task {
        /// Description of the task failure.
        message: String,
    },
}
