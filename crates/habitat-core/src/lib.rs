//! Simulation driver for Habitat: clock, tick cycle, population, and
//! orchestration of the agent and world crates.
//!
//! Each tick runs eight phases in order: Clock, Environment, Snapshot,
//! Update, Movement, Cleanup, Record, and Birth. Agents see a proximity
//! snapshot taken before any of them moves, and every effect on other
//! agents (kills, offspring) is applied after the update phase.
//!
//! # Modules
//!
//! - [`clock`] -- Tick counter and frame-rate conversion.
//! - [`config`] -- Configuration loading from `habitat-config.yaml` into
//!   strongly-typed structs.
//! - [`population`] -- Id allocation and the agent store.
//! - [`proximity`] -- Start-of-tick neighbor snapshot.
//! - [`recorder`] -- Per-frame snapshot rows and JSON Lines export.
//! - [`report`] -- Population counts over time and per-season means.
//! - [`runner`] -- The run loop with tick and extinction boundaries.
//! - [`scenario`] -- Scenario presets and initial state construction.
//! - [`tick`] -- The single-tick cycle.

pub mod clock;
pub mod config;
pub mod population;
pub mod proximity;
pub mod recorder;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod tick;

pub use config::{ConfigError, ScenarioKind, SimulationConfig};
pub use recorder::{MemoryRecorder, NullRecorder, Recorder};
pub use report::PopulationReport;
pub use runner::{RunnerError, SimulationEndReason, SimulationResult, run_simulation};
pub use scenario::build_state;
pub use tick::{SimulationState, TickError, TickSummary, run_tick};
