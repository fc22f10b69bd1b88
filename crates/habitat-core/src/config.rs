//! Configuration loading and typed config structures for the Habitat simulation.
//!
//! The canonical configuration lives in `habitat-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file.
//!
//! World dimensions, proximity radius, initial population and the per-kind
//! behavior table are optional: whatever the file leaves out is filled in
//! from the selected [`ScenarioKind`] preset when the scenario is built.

use std::path::{Path, PathBuf};

use habitat_agents::{
    AgentError, AggregationConfig, BehaviorTable, EcosystemRules, MovementPolicy,
};
use habitat_world::{PatchConfig, SeasonConfig, SiteSpec, WorldError};
use serde::{Deserialize, Serialize};

use crate::clock::{ClockError, DEFAULT_FRAMES_PER_SECOND};

/// Environment variable that overrides `world.seed`.
pub const SEED_ENV_VAR: &str = "HABITAT_SEED";

/// Errors that can occur when loading configuration or building a scenario
/// from it.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is outside its valid range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },

    /// An agent behavior parameter was rejected.
    #[error("invalid agent behavior: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// An environment parameter was rejected.
    #[error("invalid environment: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The clock could not be created.
    #[error("invalid clock: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `habitat-config.yaml`. Every section has
/// defaults, so an empty file is a valid ecosystem run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings (name, seed, dimensions).
    #[serde(default)]
    pub world: WorldConfig,

    /// Run boundaries.
    #[serde(default)]
    pub run: RunConfig,

    /// Which preset fills in unset values.
    #[serde(default)]
    pub scenario: ScenarioKind,

    /// Initial population overrides.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Site-aggregation settings.
    #[serde(default)]
    pub aggregation: AggregationSection,

    /// Per-kind ecosystem behavior; the preset's table when unset.
    #[serde(default)]
    pub agents: Option<BehaviorTable>,

    /// Seasons, grass patches and timestep gating.
    #[serde(default)]
    pub ecosystem: EcosystemSection,

    /// Logging and recording.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `HABITAT_SEED`, when set, overrides `world.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if the seed override is not an integer.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `HABITAT_SEED` is not a `u64`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.override_seed(std::env::var(SEED_ENV_VAR).ok().as_deref())
    }

    /// Replace the seed with `value` when present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `value` is not a `u64`.
    pub fn override_seed(&mut self, value: Option<&str>) -> Result<(), ConfigError> {
        if let Some(raw) = value {
            self.world.seed = raw.trim().parse().ok().ok_or_else(|| ConfigError::Invalid {
                reason: format!("{SEED_ENV_VAR}={raw} is not an unsigned integer"),
            })?;
        }
        Ok(())
    }

    /// Check ranges and intervals that do not depend on the preset.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world.frames_per_second == 0 {
            return invalid("world.frames_per_second must be at least 1");
        }
        for (name, value) in [
            ("world.width", self.world.width),
            ("world.height", self.world.height),
            ("world.proximity_radius", self.world.proximity_radius),
        ] {
            if let Some(v) = value
                && !(v.is_finite() && v > 0.0)
            {
                return invalid(&format!("{name} must be positive, got {v}"));
            }
        }
        if self.logging.snapshot_interval == 0 {
            return invalid("logging.snapshot_interval must be at least 1");
        }
        if self.ecosystem.rules.timestep_interval == 0 {
            return invalid("ecosystem.rules.timestep_interval must be at least 1");
        }
        if !(self.ecosystem.spawn_offset.is_finite() && self.ecosystem.spawn_offset >= 0.0) {
            return invalid("ecosystem.spawn_offset must be non-negative");
        }
        if !(self.aggregation.site_radius.is_finite() && self.aggregation.site_radius > 0.0) {
            return invalid("aggregation.site_radius must be positive");
        }
        self.aggregation.rules.validate()?;
        self.ecosystem.seasons.validate()?;
        if let Some(table) = &self.agents {
            table.validate()?;
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid {
        reason: reason.to_owned(),
    })
}

/// The scenario presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    /// Site seekers steering as a flock, with no sites to settle on.
    Flocking,
    /// Site seekers settling around a central site.
    Aggregation,
    /// Energy-tracked predators hunting breeding prey.
    PredatorPrey,
    /// Predators, prey and seasonal grass.
    #[default]
    Ecosystem,
}

impl core::fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Flocking => "flocking",
            Self::Aggregation => "aggregation",
            Self::PredatorPrey => "predator_prey",
            Self::Ecosystem => "ecosystem",
        })
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Human-readable simulation name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// World width; the preset's when unset.
    #[serde(default)]
    pub width: Option<f64>,

    /// World height; the preset's when unset.
    #[serde(default)]
    pub height: Option<f64>,

    /// Neighbor query radius; the preset's when unset.
    #[serde(default)]
    pub proximity_radius: Option<f64>,

    /// Nominal frames per simulated second.
    #[serde(default = "default_frames_per_second")]
    pub frames_per_second: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            width: None,
            height: None,
            proximity_radius: None,
            frames_per_second: default_frames_per_second(),
        }
    }
}

/// Run boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Stop after this many ticks.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Stop early once no animal is left.
    #[serde(default = "default_true")]
    pub stop_on_extinction: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_ticks: default_max_ticks(),
            stop_on_extinction: true,
        }
    }
}

/// Initial population overrides, per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Site seekers at start.
    #[serde(default)]
    pub site_seekers: Option<u32>,
    /// Prey at start.
    #[serde(default)]
    pub prey: Option<u32>,
    /// Predators at start.
    #[serde(default)]
    pub predators: Option<u32>,
    /// Grass at start.
    #[serde(default)]
    pub grass: Option<u32>,
}

/// Site-aggregation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationSection {
    /// Explicit sites. Empty means one site at the world center.
    #[serde(default)]
    pub sites: Vec<SiteSpec>,

    /// Radius of the default central site.
    #[serde(default = "default_site_radius")]
    pub site_radius: f64,

    /// Site seeker movement; the preset's when unset.
    #[serde(default)]
    pub movement: Option<MovementPolicy>,

    /// Curves, check interval and leave duration.
    #[serde(default)]
    pub rules: AggregationConfig,
}

impl Default for AggregationSection {
    fn default() -> Self {
        Self {
            sites: Vec::new(),
            site_radius: default_site_radius(),
            movement: None,
            rules: AggregationConfig::default(),
        }
    }
}

/// Ecosystem environment settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcosystemSection {
    /// Timestep gating shared by every ecosystem kind.
    #[serde(default)]
    pub rules: EcosystemRules,

    /// Season cycle. Only the `ecosystem` scenario runs seasons.
    #[serde(default)]
    pub seasons: SeasonConfig,

    /// Grass patch layout. Only the `ecosystem` scenario places patches.
    #[serde(default)]
    pub patches: PatchConfig,

    /// Maximum distance of a newborn from its parent.
    #[serde(default = "default_spawn_offset")]
    pub spawn_offset: f64,
}

impl Default for EcosystemSection {
    fn default() -> Self {
        Self {
            rules: EcosystemRules::default(),
            seasons: SeasonConfig::default(),
            patches: PatchConfig::default(),
            spawn_offset: default_spawn_offset(),
        }
    }
}

/// Logging and recording configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of human-readable ones.
    #[serde(default)]
    pub json: bool,

    /// Record agent rows every N ticks.
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: u64,

    /// Where to write recorded rows as JSON lines; nothing is written when
    /// unset.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            snapshot_interval: default_snapshot_interval(),
            output: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Habitat".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_frames_per_second() -> u32 {
    DEFAULT_FRAMES_PER_SECOND
}

const fn default_max_ticks() -> u64 {
    6000
}

const fn default_true() -> bool {
    true
}

const fn default_site_radius() -> f64 {
    100.0
}

const fn default_spawn_offset() -> f64 {
    8.0
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_snapshot_interval() -> u64 {
    1
}
