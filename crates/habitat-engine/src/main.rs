//! Simulation binary for Habitat.
//!
//! Wires configuration, logging, the scenario builder and the run loop
//! together, then exports what was recorded.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from the path given as the first argument, or
//!    `habitat-config.yaml` in the working directory
//! 2. Initialize structured logging (tracing), honoring `RUST_LOG`
//! 3. Build the scenario: world, sites or patches, initial population
//! 4. Run the simulation loop
//! 5. Export recorded rows and log the population report

mod error;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use habitat_core::config::LoggingConfig;
use habitat_core::runner::{self, ProgressCallback};
use habitat_core::{MemoryRecorder, PopulationReport, SimulationConfig, build_state};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Config file read when no path is given.
const DEFAULT_CONFIG_PATH: &str = "habitat-config.yaml";

/// Ticks between progress lines.
const PROGRESS_EVERY: u64 = 600;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, the run, or the export fails.
fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let path = config_path(std::env::args().skip(1));
    let config = load_config(&path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        config_path = %path.display(),
        scenario = %config.scenario,
        world_name = config.world.name,
        seed = config.world.seed,
        max_ticks = config.run.max_ticks,
        "habitat-engine starting"
    );

    // 3. Build the scenario.
    let mut state = build_state(&config).map_err(EngineError::from)?;

    // 4. Run the simulation.
    let mut recorder = MemoryRecorder::new();
    let mut callback = ProgressCallback::new(PROGRESS_EVERY);
    let result = runner::run_simulation(&mut state, &config.run, &mut recorder, &mut callback)
        .map_err(EngineError::from)?;
    runner::log_simulation_end(&result);

    // 5. Export and summarize.
    if let Some(output) = &config.logging.output {
        recorder
            .save_jsonl(output)
            .map_err(EngineError::from)
            .with_context(|| format!("writing rows to {}", output.display()))?;
    }
    let report = PopulationReport::from_rows(
        recorder.rows(),
        state.rules.timestep_interval,
        state.clock.frames_per_second(),
    );
    report.log();

    info!(
        run_id = %recorder.run_id(),
        end_reason = %result.end_reason,
        total_ticks = result.total_ticks,
        rows = recorder.len(),
        "habitat-engine shutdown complete"
    );
    Ok(())
}

/// The config path from the command-line arguments (program name removed).
fn config_path(mut args: impl Iterator<Item = String>) -> PathBuf {
    args.next()
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load the configuration at `path`, falling back to defaults (plus the
/// environment seed override) when the default file is absent.
fn load_config(path: &Path) -> Result<SimulationConfig, EngineError> {
    if path.exists() || path != Path::new(DEFAULT_CONFIG_PATH) {
        return Ok(SimulationConfig::from_file(path)?);
    }
    let mut config = SimulationConfig::default();
    config.apply_env_overrides()?;
    Ok(config)
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn first_argument_is_the_config_path() {
        let args = vec!["runs/ecosystem.yaml".to_owned(), "ignored".to_owned()];
        assert_eq!(
            config_path(args.into_iter()),
            PathBuf::from("runs/ecosystem.yaml")
        );
    }

    #[test]
    fn default_path_without_arguments() {
        assert_eq!(
            config_path(std::iter::empty()),
            PathBuf::from(DEFAULT_CONFIG_PATH)
        );
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let result = load_config(Path::new("does/not/exist.yaml"));
        assert!(matches!(result, Err(EngineError::Config { .. })));
    }
}
