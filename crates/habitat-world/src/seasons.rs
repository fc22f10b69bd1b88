//! Seasonal modulation of the grass growth rate.
//!
//! The [`EcosystemScheduler`] owns the season index and the current grow
//! rate. Once per tick the driver calls [`EcosystemScheduler::on_environment_tick`],
//! which advances the season every `length` ticks and rolls one growth draw
//! per grass patch.
//!
//! Season order and multipliers are configuration. The default order is
//! summer, autumn, winter, spring.

use habitat_types::{Season, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::WorldError;
use crate::patches::{GrassPatch, perturbed_point};

/// Growth-rate multiplier for each season.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonMultipliers {
    /// Summer multiplier.
    pub summer: f64,
    /// Autumn multiplier.
    pub autumn: f64,
    /// Winter multiplier.
    pub winter: f64,
    /// Spring multiplier.
    pub spring: f64,
}

impl Default for SeasonMultipliers {
    fn default() -> Self {
        Self {
            summer: 1.5,
            autumn: 1.0,
            winter: 0.25,
            spring: 1.25,
        }
    }
}

impl SeasonMultipliers {
    /// The multiplier for `season`.
    pub const fn for_season(&self, season: Season) -> f64 {
        match season {
            Season::Summer => self.summer,
            Season::Autumn => self.autumn,
            Season::Winter => self.winter,
            Season::Spring => self.spring,
        }
    }
}

/// Season cycle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonConfig {
    /// Ticks per season.
    #[serde(default = "default_length")]
    pub length: u64,
    /// Cyclic order of seasons; the first entry is active at tick 0.
    #[serde(default = "default_order")]
    pub order: Vec<Season>,
    /// Per-season multipliers of the base grow rate.
    #[serde(default)]
    pub multipliers: SeasonMultipliers,
    /// Grow rate before seasonal scaling.
    #[serde(default = "default_base_grow_rate")]
    pub base_grow_rate: f64,
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self {
            length: default_length(),
            order: default_order(),
            multipliers: SeasonMultipliers::default(),
            base_grow_rate: default_base_grow_rate(),
        }
    }
}

const fn default_length() -> u64 {
    1200
}

fn default_order() -> Vec<Season> {
    Season::ALL.to_vec()
}

const fn default_base_grow_rate() -> f64 {
    0.02
}

impl SeasonConfig {
    /// Check the cycle names all four seasons once, seasons have a length,
    /// and every scaled grow rate is a probability.
    pub fn validate(&self) -> Result<(), WorldError> {
        if self.order.is_empty() {
            return Err(WorldError::EmptySeasonOrder);
        }
        let complete = self.order.len() == Season::ALL.len()
            && Season::ALL.iter().all(|season| self.order.contains(season));
        if !complete {
            return Err(WorldError::IncompleteSeasonOrder {
                order: self.order.clone(),
            });
        }
        if self.length == 0 {
            return Err(WorldError::InvalidParameter {
                name: "seasons.length",
                reason: String::from("must be at least 1 tick"),
            });
        }
        for season in &self.order {
            let rate = self.base_grow_rate * self.multipliers.for_season(*season);
            if !(0.0..=1.0).contains(&rate) {
                return Err(WorldError::InvalidParameter {
                    name: "seasons.multipliers",
                    reason: format!("{season} grow rate {rate} is not a probability"),
                });
            }
        }
        Ok(())
    }
}

/// What the environment did during one tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnvironmentTick {
    /// The new season, if the season changed on this tick.
    pub season_changed: Option<Season>,
    /// Positions at which new grass should be spawned.
    pub grass_spawns: Vec<Vec2>,
}

/// Seasonal grow-rate state.
#[derive(Debug, Clone)]
pub struct EcosystemScheduler {
    config: SeasonConfig,
    season_index: usize,
    grow_rate: f64,
}

impl EcosystemScheduler {
    /// Start at the first season of the configured order.
    pub fn new(config: SeasonConfig) -> Result<Self, WorldError> {
        config.validate()?;
        let first = config.order.first().copied().ok_or(WorldError::EmptySeasonOrder)?;
        let grow_rate = config.base_grow_rate * config.multipliers.for_season(first);
        Ok(Self {
            config,
            season_index: 0,
            grow_rate,
        })
    }

    /// Position in the season cycle.
    pub const fn season_index(&self) -> usize {
        self.season_index
    }

    /// The active season.
    pub fn season(&self) -> Season {
        self.config
            .order
            .get(self.season_index)
            .copied()
            .unwrap_or(Season::Summer)
    }

    /// The current chance per patch per tick of spawning grass.
    pub const fn grow_rate(&self) -> f64 {
        self.grow_rate
    }

    /// Override the grow rate until the next season change.
    pub const fn set_grow_rate(&mut self, grow_rate: f64) {
        self.grow_rate = grow_rate;
    }

    /// Advance the season when `tick` is a positive multiple of the season
    /// length. Returns the new season on a change.
    pub fn advance(&mut self, tick: u64) -> Option<Season> {
        if tick == 0 || !matches!(tick.checked_rem(self.config.length), Some(0)) {
            return None;
        }
        let count = self.config.order.len();
        self.season_index = self.season_index.saturating_add(1).checked_rem(count)?;
        let season = self.season();
        self.grow_rate = self.config.base_grow_rate * self.config.multipliers.for_season(season);
        info!(
            tick,
            season = %season,
            grow_rate = self.grow_rate,
            "season changed"
        );
        Some(season)
    }

    /// Roll one growth draw per patch and return the spawn positions.
    pub fn grow(&self, patches: &[GrassPatch], rng: &mut impl Rng) -> Vec<Vec2> {
        let mut spawns = Vec::new();
        for patch in patches {
            if rng.random::<f64>() < self.grow_rate {
                spawns.push(perturbed_point(patch.center, patch.spawn_radius, rng));
            }
        }
        spawns
    }

    /// The once-per-tick environment update: season first, then growth.
    pub fn on_environment_tick(
        &mut self,
        tick: u64,
        patches: &[GrassPatch],
        rng: &mut impl Rng,
    ) -> EnvironmentTick {
        let season_changed = self.advance(tick);
        let grass_spawns = self.grow(patches, rng);
        EnvironmentTick {
            season_changed,
            grass_spawns,
        }
    }
}
