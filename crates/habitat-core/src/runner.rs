//! Simulation loop runner.
//!
//! This module provides [`run_simulation`], which drives the tick loop until
//! one of the run boundaries is met:
//!
//! - **Tick limit**: stop after `max_ticks` ticks.
//! - **Extinction**: stop as soon as no animal is left, when enabled.
//!
//! The runner wraps the single-tick [`run_tick`] function and adds the
//! boundaries and a per-tick callback around it.
//!
//! [`run_tick`]: crate::tick::run_tick

use tracing::{info, warn};

use crate::config::RunConfig;
use crate::recorder::Recorder;
use crate::tick::{self, SimulationState, TickError, TickSummary};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationEndReason {
    /// The configured number of ticks ran.
    MaxTicksReached,
    /// No animal was left alive.
    Extinction,
}

impl core::fmt::Display for SimulationEndReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::MaxTicksReached => "max ticks reached",
            Self::Extinction => "extinction",
        })
    }
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
}

/// Callback invoked after each tick completes.
pub trait TickCallback {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, state: &SimulationState);
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _state: &SimulationState) {}
}

/// Logs population counts every `every` ticks and on every season change.
#[derive(Debug, Clone, Copy)]
pub struct ProgressCallback {
    every: u64,
}

impl ProgressCallback {
    /// Log every `every` ticks (0 logs only season changes).
    pub const fn new(every: u64) -> Self {
        Self { every }
    }
}

impl TickCallback for ProgressCallback {
    fn on_tick(&mut self, summary: &TickSummary, state: &SimulationState) {
        let periodic = matches!(summary.tick.checked_rem(self.every), Some(0));
        if periodic || summary.season_changed.is_some() {
            info!(
                tick = summary.tick,
                seconds = state.clock.elapsed_seconds(),
                season = ?summary.season,
                agents_alive = summary.agents_alive,
                counts = ?summary.counts,
                "Progress"
            );
        }
    }
}

/// Run the simulation loop until a termination condition is met.
///
/// Extinction is checked after each tick, then the tick limit. With
/// `max_ticks` of 0 no tick runs.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick execution fails.
pub fn run_simulation(
    state: &mut SimulationState,
    limits: &RunConfig,
    recorder: &mut dyn Recorder,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        max_ticks = limits.max_ticks,
        stop_on_extinction = limits.stop_on_extinction,
        agents = state.population.len(),
        "Simulation starting"
    );

    while total_ticks < limits.max_ticks {
        // --- Execute tick ---
        let summary = tick::run_tick(state, recorder)?;
        total_ticks = total_ticks.saturating_add(1);

        // --- Notify callback ---
        callback.on_tick(&summary, state);

        // --- Check extinction ---
        if limits.stop_on_extinction && summary.animals_alive == 0 {
            info!(tick = summary.tick, "No animals left -- extinction");
            return Ok(SimulationResult {
                end_reason: SimulationEndReason::Extinction,
                final_summary: Some(summary),
                total_ticks,
            });
        }

        last_summary = Some(summary);
    }

    info!(
        tick = state.clock.tick(),
        max_ticks = limits.max_ticks,
        "Tick limit reached"
    );
    Ok(SimulationResult {
        end_reason: SimulationEndReason::MaxTicksReached,
        final_summary: last_summary,
        total_ticks,
    })
}

/// Log the simulation end sequence.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = %result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        final_agents_alive = result.final_summary.as_ref().map(|s| s.agents_alive),
        "Simulation ended"
    );

    if result.end_reason == SimulationEndReason::Extinction {
        warn!("Simulation ended due to extinction -- all animals died");
    }
}
