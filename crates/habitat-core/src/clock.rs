//! Tick clock for the Habitat simulation.
//!
//! The clock is the single source of truth for the tick counter. Agents and
//! the environment read the tick from a [`TickContext`] built by the tick
//! driver; nothing else writes it.
//!
//! Ticks are frames of a fixed-rate loop. The nominal frame rate converts a
//! tick to elapsed simulated seconds for reporting.
//!
//! [`TickContext`]: habitat_agents::TickContext

/// Frames per simulated second when none is configured.
pub const DEFAULT_FRAMES_PER_SECOND: u32 = 60;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// The frame rate is zero.
    #[error("frames per second must be at least 1")]
    ZeroFrameRate,
}

/// Monotonic tick counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimClock {
    /// Current tick (0 before the first tick runs).
    tick: u64,

    /// Nominal frames per simulated second.
    frames_per_second: u32,
}

impl SimClock {
    /// A clock at tick 0.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::ZeroFrameRate`] if `frames_per_second` is 0.
    pub const fn new(frames_per_second: u32) -> Result<Self, ClockError> {
        Self::from_tick(0, frames_per_second)
    }

    /// A clock resumed at `tick` (state restoration and tests).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::ZeroFrameRate`] if `frames_per_second` is 0.
    pub const fn from_tick(tick: u64, frames_per_second: u32) -> Result<Self, ClockError> {
        if frames_per_second == 0 {
            return Err(ClockError::ZeroFrameRate);
        }
        Ok(Self {
            tick,
            frames_per_second,
        })
    }

    /// Advance the clock by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Return the current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Return the nominal frame rate.
    pub const fn frames_per_second(&self) -> u32 {
        self.frames_per_second
    }

    /// Simulated seconds elapsed at the current tick.
    pub fn elapsed_seconds(&self) -> f64 {
        seconds_at(self.tick, self.frames_per_second)
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self {
            tick: 0,
            frames_per_second: DEFAULT_FRAMES_PER_SECOND,
        }
    }
}

/// Simulated seconds at `tick` for a loop running at `frames_per_second`.
#[allow(clippy::cast_precision_loss)]
pub fn seconds_at(tick: u64, frames_per_second: u32) -> f64 {
    tick as f64 / f64::from(frames_per_second.max(1))
}
