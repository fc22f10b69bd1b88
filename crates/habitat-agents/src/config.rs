//! Tunable behavior parameters for every agent variant.
//!
//! Constants such as eat distance, cooldown and the death exponent are not
//! hard-coded: each kind is described by a [`VariantBehavior`] made of small
//! policy objects, and a [`BehaviorTable`] maps kinds to behaviors. Two
//! presets ship with the crate: [`BehaviorTable::predator_prey`] and
//! [`BehaviorTable::ecosystem`].

use habitat_types::{AgentKind, MAX_ENERGY};
use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::probability::{DeathCurve, JoinCurve, LeaveCurve, non_negative, unit_interval};

// ---------------------------------------------------------------------------
// Ecosystem-wide rules
// ---------------------------------------------------------------------------

/// Rules shared by every ecosystem variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcosystemRules {
    /// Ecosystem decisions run only on ticks divisible by this interval
    /// (6 ticks = 0.1 s at 60 fps).
    #[serde(default = "default_timestep_interval")]
    pub timestep_interval: u64,
}

impl Default for EcosystemRules {
    fn default() -> Self {
        Self {
            timestep_interval: default_timestep_interval(),
        }
    }
}

const fn default_timestep_interval() -> u64 {
    6
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// Energy bookkeeping for energy-tracked variants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyConfig {
    /// Energy at spawn.
    pub initial: f64,
    /// Energy lost on every eligible timestep.
    pub drain_per_timestep: f64,
    /// Energy restored by one meal, capped at 100.
    pub feed_gain: f64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            initial: MAX_ENERGY,
            drain_per_timestep: 0.25,
            feed_gain: 30.0,
        }
    }
}

/// What a variant eats and under which conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedingPolicy {
    /// Kinds this variant may consume.
    pub diet: Vec<AgentKind>,
    /// Maximum distance to a consumable neighbor.
    pub eat_distance: f64,
    /// Ticks that must pass after a meal before the next one.
    pub cooldown_ticks: u64,
    /// Chance to reproduce right after a meal.
    pub reproduce_chance: f64,
    /// Speed lost on each timestep for every neighbor passed over without
    /// being eaten. Speed never drops below zero.
    #[serde(default)]
    pub slowdown_per_neighbor: f64,
    /// Speed restored by a meal; `None` leaves the speed alone.
    #[serde(default)]
    pub fed_speed: Option<f64>,
}

impl FeedingPolicy {
    /// Whether a neighbor of `kind` is edible under this policy.
    pub fn can_eat(&self, kind: AgentKind) -> bool {
        self.diet.contains(&kind)
    }
}

/// How a variant dies at random.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RandomDeath {
    /// Never dies at random.
    Never,
    /// Fixed chance per eligible timestep.
    Constant {
        /// Chance of dying.
        chance: f64,
    },
    /// Chance derived from the energy ledger via a [`DeathCurve`].
    EnergyScaled(DeathCurve),
}

/// Movement rule applied after the state update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum MovementPolicy {
    /// Never moves; movement is frozen on every update.
    Stationary,
    /// Straight line with occasional random heading changes.
    Wander {
        /// Starting distance per tick; feeding may change it afterwards.
        speed: f64,
        /// Chance per tick of perturbing the heading.
        jitter_chance: f64,
        /// Maximum per-axis perturbation.
        jitter: f64,
    },
    /// Steers toward the nearest edible neighbor; speed follows energy.
    Seek {
        /// Weight of the unit vector toward the target.
        pull: f64,
        /// Chance per tick of perturbing the heading with no target.
        jitter_chance: f64,
        /// Maximum per-axis perturbation.
        jitter: f64,
        /// Minimum speed.
        speed_floor: f64,
        /// Energy divided by this gives the speed above the floor.
        energy_scale: f64,
    },
    /// Boids: alignment, cohesion and separation.
    Flock {
        /// Distance per tick.
        velocity: f64,
        /// Alignment weight.
        alignment: f64,
        /// Cohesion weight.
        cohesion: f64,
        /// Separation weight.
        separation: f64,
    },
}

impl MovementPolicy {
    /// Wandering at unit speed, jittering 10% of ticks by up to 0.35.
    pub const fn wander() -> Self {
        Self::Wander {
            speed: 1.0,
            jitter_chance: 0.1,
            jitter: 0.35,
        }
    }

    /// Seeking with the energy-dependent speed `max(0.7, energy / 75)`.
    pub const fn seek() -> Self {
        Self::Seek {
            pull: 0.03,
            jitter_chance: 0.01,
            jitter: 0.35,
            speed_floor: 0.7,
            energy_scale: 75.0,
        }
    }

    /// Flocking with the default weights.
    pub const fn flock() -> Self {
        Self::Flock {
            velocity: 2.0,
            alignment: 0.5,
            cohesion: 0.005,
            separation: 0.25,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-variant behavior
// ---------------------------------------------------------------------------

/// The complete behavior of one ecosystem variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantBehavior {
    /// Energy bookkeeping; `None` for variants without a ledger.
    #[serde(default)]
    pub energy: Option<EnergyConfig>,
    /// Feeding rule; `None` for variants that never eat.
    #[serde(default)]
    pub feeding: Option<FeedingPolicy>,
    /// Chance per eligible timestep of reproducing without eating.
    #[serde(default)]
    pub spontaneous_reproduction: Option<f64>,
    /// Random death rule.
    pub random_death: RandomDeath,
    /// Movement rule.
    pub movement: MovementPolicy,
    /// Extra agents of the same kind dropped at random positions each time
    /// this variant reproduces.
    #[serde(default)]
    pub scatter_on_reproduce: u32,
}

impl VariantBehavior {
    /// Validate every probability and distance in this behavior.
    pub fn validate(&self) -> Result<(), AgentError> {
        if let Some(energy) = &self.energy {
            non_negative("energy.drain_per_timestep", energy.drain_per_timestep)?;
            non_negative("energy.feed_gain", energy.feed_gain)?;
            if !(0.0..=MAX_ENERGY).contains(&energy.initial) {
                return Err(AgentError::EnergyOutOfRange {
                    energy: energy.initial,
                });
            }
        }
        if let Some(feeding) = &self.feeding {
            non_negative("feeding.eat_distance", feeding.eat_distance)?;
            unit_interval("feeding.reproduce_chance", feeding.reproduce_chance)?;
            non_negative("feeding.slowdown_per_neighbor", feeding.slowdown_per_neighbor)?;
            if let Some(speed) = feeding.fed_speed {
                non_negative("feeding.fed_speed", speed)?;
            }
        }
        if let Some(chance) = self.spontaneous_reproduction {
            unit_interval("spontaneous_reproduction", chance)?;
        }
        match &self.random_death {
            RandomDeath::Never => {}
            RandomDeath::Constant { chance } => unit_interval("random_death.chance", *chance)?,
            RandomDeath::EnergyScaled(curve) => {
                curve.validate()?;
                if self.energy.is_none() {
                    return Err(AgentError::InvalidParameter {
                        name: "random_death",
                        reason: String::from("energy-scaled death requires an energy ledger"),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Dispatch table from kind to behavior for the ecosystem kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorTable {
    /// Prey behavior.
    pub prey: VariantBehavior,
    /// Predator behavior.
    pub predator: VariantBehavior,
    /// Grass behavior.
    pub grass: VariantBehavior,
}

impl BehaviorTable {
    /// Behavior for an ecosystem kind; `None` for site seekers.
    pub const fn for_kind(&self, kind: AgentKind) -> Option<&VariantBehavior> {
        match kind {
            AgentKind::Prey => Some(&self.prey),
            AgentKind::Predator => Some(&self.predator),
            AgentKind::Grass => Some(&self.grass),
            AgentKind::SiteSeeker => None,
        }
    }

    /// Validate every behavior in the table.
    pub fn validate(&self) -> Result<(), AgentError> {
        self.prey.validate()?;
        self.predator.validate()?;
        self.grass.validate()
    }

    /// Energy-tracked predators that seek prey; prey that only breed.
    pub fn predator_prey() -> Self {
        Self {
            prey: VariantBehavior {
                energy: None,
                feeding: None,
                spontaneous_reproduction: Some(0.008),
                random_death: RandomDeath::Never,
                movement: MovementPolicy::wander(),
                scatter_on_reproduce: 0,
            },
            predator: VariantBehavior {
                energy: Some(EnergyConfig::default()),
                feeding: Some(FeedingPolicy {
                    diet: vec![AgentKind::Prey],
                    eat_distance: 12.0,
                    cooldown_ticks: 20,
                    reproduce_chance: 0.01,
                    slowdown_per_neighbor: 0.0,
                    fed_speed: None,
                }),
                spontaneous_reproduction: None,
                random_death: RandomDeath::EnergyScaled(DeathCurve::default()),
                movement: MovementPolicy::seek(),
                scatter_on_reproduce: 0,
            },
            grass: grass_behavior(),
        }
    }

    /// Predators eat prey, prey eat grass, grass grows. Animals slow down
    /// while passing over neighbors and get their speed back with a meal;
    /// reproducing grass also scatters two more blades across the world.
    pub fn ecosystem() -> Self {
        Self {
            prey: VariantBehavior {
                energy: Some(EnergyConfig::default()),
                feeding: Some(FeedingPolicy {
                    diet: vec![AgentKind::Grass],
                    eat_distance: 12.0,
                    cooldown_ticks: 45,
                    reproduce_chance: 0.5,
                    slowdown_per_neighbor: 0.01,
                    fed_speed: Some(1.0),
                }),
                spontaneous_reproduction: None,
                random_death: RandomDeath::Constant { chance: 0.01 },
                movement: MovementPolicy::wander(),
                scatter_on_reproduce: 0,
            },
            predator: VariantBehavior {
                energy: Some(EnergyConfig::default()),
                feeding: Some(FeedingPolicy {
                    diet: vec![AgentKind::Prey],
                    eat_distance: 12.0,
                    cooldown_ticks: 45,
                    reproduce_chance: 0.5,
                    slowdown_per_neighbor: 0.01,
                    fed_speed: Some(1.0),
                }),
                spontaneous_reproduction: None,
                random_death: RandomDeath::Constant { chance: 0.01 },
                movement: MovementPolicy::wander(),
                scatter_on_reproduce: 0,
            },
            grass: VariantBehavior {
                scatter_on_reproduce: 2,
                ..grass_behavior()
            },
        }
    }
}

impl Default for BehaviorTable {
    fn default() -> Self {
        Self::ecosystem()
    }
}

fn grass_behavior() -> VariantBehavior {
    VariantBehavior {
        energy: None,
        feeding: None,
        spontaneous_reproduction: Some(0.0072),
        random_death: RandomDeath::Never,
        movement: MovementPolicy::Stationary,
        scatter_on_reproduce: 0,
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Parameters of the site-aggregation machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Chance of settling while in `join`.
    #[serde(default)]
    pub join: JoinCurve,
    /// Chance of leaving while `still`.
    #[serde(default)]
    pub leave: LeaveCurve,
    /// Join and leave draws happen on ticks divisible by this interval.
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,
    /// Ticks spent in `leave` before wandering again.
    #[serde(default = "default_leave_duration")]
    pub leave_duration: u64,
    /// Movement while not frozen. Chosen by the scenario rather than read
    /// with the curves.
    #[serde(skip, default = "default_seeker_movement")]
    pub movement: MovementPolicy,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            join: JoinCurve::default(),
            leave: LeaveCurve::default(),
            check_interval: default_check_interval(),
            leave_duration: default_leave_duration(),
            movement: default_seeker_movement(),
        }
    }
}

impl AggregationConfig {
    /// Validate both curves and the intervals.
    pub fn validate(&self) -> Result<(), AgentError> {
        self.join.validate()?;
        self.leave.validate()?;
        if self.check_interval == 0 {
            return Err(AgentError::InvalidParameter {
                name: "check_interval",
                reason: String::from("must be at least 1"),
            });
        }
        Ok(())
    }
}

const fn default_check_interval() -> u64 {
    20
}

const fn default_leave_duration() -> u64 {
    500
}

const fn default_seeker_movement() -> MovementPolicy {
    MovementPolicy::wander()
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        assert!(BehaviorTable::predator_prey().validate().is_ok());
        assert!(BehaviorTable::ecosystem().validate().is_ok());
        assert!(AggregationConfig::default().validate().is_ok());
    }

    #[test]
    fn energy_scaled_death_requires_ledger() {
        let mut table = BehaviorTable::predator_prey();
        table.predator.energy = None;
        assert!(matches!(
            table.validate(),
            Err(AgentError::InvalidParameter {
                name: "random_death",
                ..
            })
        ));
    }

    #[test]
    fn diet_is_a_kind_lookup() {
        let table = BehaviorTable::ecosystem();
        let prey_feeding = table.prey.feeding.as_ref();
        assert!(prey_feeding.is_some_and(|f| f.can_eat(AgentKind::Grass)));
        assert!(prey_feeding.is_some_and(|f| !f.can_eat(AgentKind::Prey)));
        assert!(table.for_kind(AgentKind::SiteSeeker).is_none());
    }

    #[test]
    fn behavior_parses_from_json() {
        let json = r#"{
            "random_death": { "policy": "constant", "chance": 0.02 },
            "movement": { "policy": "stationary" }
        }"#;
        let behavior: Result<VariantBehavior, _> = serde_json::from_str(json);
        let behavior = behavior.ok();
        assert!(behavior.as_ref().is_some_and(|b| b.energy.is_none()));
        assert!(behavior.as_ref().is_some_and(|b| b.scatter_on_reproduce == 0));
        assert!(behavior.is_some_and(|b| b.movement == MovementPolicy::Stationary));
    }

    #[test]
    fn ecosystem_animals_slow_down_and_grass_scatters() {
        let table = BehaviorTable::ecosystem();
        for animal in [&table.prey, &table.predator] {
            let feeding = animal.feeding.as_ref();
            assert!(feeding.is_some_and(|f| (f.slowdown_per_neighbor - 0.01).abs() < 1e-12));
            assert!(feeding.is_some_and(|f| f.fed_speed == Some(1.0)));
        }
        assert_eq!(table.grass.scatter_on_reproduce, 2);

        let plain = BehaviorTable::predator_prey();
        assert!(
            plain
                .predator
                .feeding
                .as_ref()
                .is_some_and(|f| f.slowdown_per_neighbor == 0.0 && f.fed_speed.is_none())
        );
    }

    #[test]
    fn negative_slowdown_is_rejected() {
        let mut table = BehaviorTable::ecosystem();
        if let Some(feeding) = table.prey.feeding.as_mut() {
            feeding.slowdown_per_neighbor = -0.5;
        }
        assert!(matches!(
            table.validate(),
            Err(AgentError::InvalidParameter {
                name: "feeding.slowdown_per_neighbor",
                ..
            })
        ));
    }
}
