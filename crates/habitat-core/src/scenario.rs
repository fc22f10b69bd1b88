//! Scenario presets and construction of the initial simulation state.
//!
//! | Preset | World | Radius | Population |
//! |--------|-------|--------|------------|
//! | `flocking` | 750 x 750 | 100 | 80 flocking site seekers, no sites |
//! | `aggregation` | 750 x 750 | 25 | 50 site seekers, one central site |
//! | `predator_prey` | 750 x 750 | 50 | 15 energy predators, 110 prey |
//! | `ecosystem` | 960 x 540 | 25 | 15 predators, 35 prey, 40 grass, seasons and patches |
//!
//! Values set in the configuration file take precedence over the preset.

use habitat_agents::{AggregationConfig, BehaviorTable, MovementPolicy};
use habitat_types::{AgentKind, Bounds};
use habitat_world::{EcosystemScheduler, SiteSpec, build_sites, place_patches};
use tracing::info;

use crate::clock::SimClock;
use crate::config::{ConfigError, ScenarioKind, SimulationConfig};
use crate::tick::{SimulationState, random_position};

/// Defaults a scenario supplies for whatever the configuration leaves unset.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioPreset {
    /// World width.
    pub width: f64,
    /// World height.
    pub height: f64,
    /// Neighbor query radius.
    pub proximity_radius: f64,
    /// Initial site seekers.
    pub site_seekers: u32,
    /// Movement of site seekers while not frozen.
    pub seeker_movement: MovementPolicy,
    /// Whether sites are laid out for the site seekers.
    pub sites: bool,
    /// Initial prey.
    pub prey: u32,
    /// Initial predators.
    pub predators: u32,
    /// Initial grass.
    pub grass: u32,
    /// Per-kind behavior.
    pub behaviors: BehaviorTable,
    /// Whether seasons run and grass patches are placed.
    pub seasonal: bool,
}

impl ScenarioPreset {
    /// The preset for `kind`.
    pub fn for_kind(kind: ScenarioKind) -> Self {
        match kind {
            ScenarioKind::Flocking => Self {
                width: 750.0,
                height: 750.0,
                proximity_radius: 100.0,
                site_seekers: 80,
                seeker_movement: MovementPolicy::Flock {
                    velocity: 1.0,
                    alignment: 0.5,
                    cohesion: 0.005,
                    separation: 0.25,
                },
                sites: false,
                prey: 0,
                predators: 0,
                grass: 0,
                behaviors: BehaviorTable::ecosystem(),
                seasonal: false,
            },
            ScenarioKind::Aggregation => Self {
                width: 750.0,
                height: 750.0,
                proximity_radius: 25.0,
                site_seekers: 50,
                seeker_movement: MovementPolicy::wander(),
                sites: true,
                prey: 0,
                predators: 0,
                grass: 0,
                behaviors: BehaviorTable::ecosystem(),
                seasonal: false,
            },
            ScenarioKind::PredatorPrey => Self {
                width: 750.0,
                height: 750.0,
                proximity_radius: 50.0,
                site_seekers: 0,
                seeker_movement: MovementPolicy::wander(),
                sites: true,
                prey: 110,
                predators: 15,
                grass: 0,
                behaviors: BehaviorTable::predator_prey(),
                seasonal: false,
            },
            ScenarioKind::Ecosystem => Self {
                width: 960.0,
                height: 540.0,
                proximity_radius: 25.0,
                site_seekers: 0,
                seeker_movement: MovementPolicy::wander(),
                sites: true,
                prey: 35,
                predators: 15,
                grass: 40,
                behaviors: BehaviorTable::ecosystem(),
                seasonal: true,
            },
        }
    }

    /// This preset with every value set in `config` applied on top.
    pub fn merged_with(mut self, config: &SimulationConfig) -> Self {
        let world = &config.world;
        let population = &config.population;
        self.width = world.width.unwrap_or(self.width);
        self.height = world.height.unwrap_or(self.height);
        self.proximity_radius = world.proximity_radius.unwrap_or(self.proximity_radius);
        self.site_seekers = population.site_seekers.unwrap_or(self.site_seekers);
        self.seeker_movement = config.aggregation.movement.unwrap_or(self.seeker_movement);
        self.prey = population.prey.unwrap_or(self.prey);
        self.predators = population.predators.unwrap_or(self.predators);
        self.grass = population.grass.unwrap_or(self.grass);
        if let Some(table) = &config.agents {
            self.behaviors = table.clone();
        }
        self
    }
}

/// Build the initial state for `config`: validate it, resolve the preset,
/// lay out sites and patches, and spawn the initial population at uniformly
/// random positions.
///
/// # Errors
///
/// Returns [`ConfigError`] if the configuration is invalid or the world
/// cannot be laid out.
pub fn build_state(config: &SimulationConfig) -> Result<SimulationState, ConfigError> {
    config.validate()?;
    let preset = ScenarioPreset::for_kind(config.scenario).merged_with(config);
    preset.behaviors.validate()?;

    let bounds = Bounds::new(preset.width, preset.height);
    let mut state = SimulationState::new(bounds, preset.proximity_radius, config.world.seed);
    state.clock = SimClock::new(config.world.frames_per_second)?;
    state.behaviors = preset.behaviors;
    state.aggregation = AggregationConfig {
        movement: preset.seeker_movement,
        ..config.aggregation.rules
    };
    state.rules = config.ecosystem.rules;
    state.spawn_offset = config.ecosystem.spawn_offset;
    state.snapshot_interval = config.logging.snapshot_interval;

    if preset.sites && preset.site_seekers > 0 {
        let specs = if config.aggregation.sites.is_empty() {
            vec![SiteSpec::centered(bounds, config.aggregation.site_radius)]
        } else {
            config.aggregation.sites.clone()
        };
        state.sites = build_sites(&specs, bounds)?;
    }

    if preset.seasonal {
        state.patches = place_patches(&config.ecosystem.patches, bounds, &mut state.rng)?;
        state.scheduler = Some(EcosystemScheduler::new(config.ecosystem.seasons.clone())?);
    }

    for (kind, count) in [
        (AgentKind::SiteSeeker, preset.site_seekers),
        (AgentKind::Predator, preset.predators),
        (AgentKind::Prey, preset.prey),
        (AgentKind::Grass, preset.grass),
    ] {
        for _ in 0..count {
            let position = random_position(bounds, &mut state.rng);
            state.spawn(kind, position);
        }
    }

    info!(
        scenario = %config.scenario,
        name = %config.world.name,
        seed = config.world.seed,
        width = preset.width,
        height = preset.height,
        agents = state.population.len(),
        sites = state.sites.len(),
        patches = state.patches.len(),
        "Scenario built"
    );
    Ok(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use habitat_types::{Season, SiteId, Vec2};

    use super::*;

    fn config(kind: ScenarioKind) -> SimulationConfig {
        SimulationConfig {
            scenario: kind,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn ecosystem_preset_spawns_three_kinds_with_seasons() {
        let state = build_state(&config(ScenarioKind::Ecosystem)).unwrap();
        assert_eq!(state.population.count_of(AgentKind::Predator), 15);
        assert_eq!(state.population.count_of(AgentKind::Prey), 35);
        assert_eq!(state.population.count_of(AgentKind::Grass), 40);
        assert_eq!(state.patches.len(), 4);
        assert_eq!(state.season(), Some(Season::Summer));
        assert!(state.sites.is_empty());
        assert_eq!(state.bounds, Bounds::new(960.0, 540.0));
        assert!(state.population.iter().all(|a| state.bounds.contains(a.body.position)));
    }

    #[test]
    fn predator_prey_preset_has_energy_predators_only() {
        let state = build_state(&config(ScenarioKind::PredatorPrey)).unwrap();
        assert_eq!(state.population.count_of(AgentKind::Predator), 15);
        assert_eq!(state.population.count_of(AgentKind::Prey), 110);
        assert_eq!(state.proximity_radius, 50.0);
        assert!(state.scheduler.is_none());
        for agent in state.population.iter() {
            match agent.kind {
                AgentKind::Predator => assert_eq!(agent.energy(), Some(100.0)),
                _ => assert_eq!(agent.energy(), None),
            }
        }
    }

    #[test]
    fn aggregation_preset_centers_one_site() {
        let state = build_state(&config(ScenarioKind::Aggregation)).unwrap();
        assert_eq!(state.population.count_of(AgentKind::SiteSeeker), 50);
        assert_eq!(state.sites.len(), 1);
        assert_eq!(state.sites[0].id, SiteId::new(0));
        assert_eq!(state.sites[0].center, Vec2::new(375.0, 375.0));
    }

    #[test]
    fn flocking_preset_has_birds_and_no_sites() {
        let state = build_state(&config(ScenarioKind::Flocking)).unwrap();
        assert_eq!(state.population.count_of(AgentKind::SiteSeeker), 80);
        assert_eq!(state.population.len(), 80);
        assert!(state.sites.is_empty());
        assert!(state.scheduler.is_none());
        assert_eq!(state.proximity_radius, 100.0);
        assert!(matches!(
            state.aggregation.movement,
            MovementPolicy::Flock { velocity, .. } if velocity == 1.0
        ));
        assert!(state.population.iter().all(|a| a.body.speed == 1.0));
    }

    #[test]
    fn configured_seeker_movement_beats_the_preset() {
        let mut cfg = config(ScenarioKind::Flocking);
        cfg.aggregation.movement = Some(MovementPolicy::wander());
        let state = build_state(&cfg).unwrap();
        assert_eq!(state.aggregation.movement, MovementPolicy::wander());
        assert!(state.sites.is_empty());
    }

    #[test]
    fn file_values_override_the_preset() {
        let mut cfg = config(ScenarioKind::PredatorPrey);
        cfg.world.width = Some(300.0);
        cfg.population.prey = Some(4);
        cfg.population.predators = Some(0);
        cfg.logging.snapshot_interval = 6;
        let state = build_state(&cfg).unwrap();
        assert_eq!(state.bounds.width, 300.0);
        assert_eq!(state.bounds.height, 750.0);
        assert_eq!(state.population.len(), 4);
        assert_eq!(state.snapshot_interval, 6);
    }

    #[test]
    fn same_seed_same_layout() {
        let a = build_state(&config(ScenarioKind::Ecosystem)).unwrap();
        let b = build_state(&config(ScenarioKind::Ecosystem)).unwrap();
        let positions = |s: &SimulationState| -> Vec<Vec2> {
            s.population.iter().map(|agent| agent.body.position).collect()
        };
        assert_eq!(positions(&a), positions(&b));
        assert_eq!(a.patches, b.patches);
    }

    #[test]
    fn invalid_behavior_is_rejected() {
        let mut cfg = config(ScenarioKind::Ecosystem);
        let mut table = BehaviorTable::ecosystem();
        table.prey.random_death = habitat_agents::RandomDeath::Constant { chance: 1.5 };
        cfg.agents = Some(table);
        assert!(matches!(build_state(&cfg), Err(ConfigError::Agent { .. })));
    }
}
