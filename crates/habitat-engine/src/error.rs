//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup, the run, and the
//! export so `main` can propagate them with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or scenario construction failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: habitat_core::ConfigError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: habitat_core::RunnerError,
    },

    /// Writing the recorded rows failed.
    #[error("export error: {source}")]
    Export {
        /// The underlying recorder error.
        #[from]
        source: habitat_core::recorder::RecorderError,
    },
}
