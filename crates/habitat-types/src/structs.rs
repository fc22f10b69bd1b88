//! Core entity structs for the Habitat simulation.
//!
//! An [`Agent`] is a kind tag, a [`Body`] (position and motion, owned by the
//! agent) and a [`Mind`] (the per-variant state machine data). The mind is a
//! tagged enum; energy is an optional component of the ecosystem mind rather
//! than a subclass.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::enums::{AgentKind, AggregationState, EcoState, Season};
use crate::geometry::Vec2;
use crate::ids::{AgentId, SiteId};

/// Upper bound of an energy ledger.
pub const MAX_ENERGY: f64 = 100.0;

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// Physical state of an agent. Mutated only by the agent's own update and
/// movement step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Current position in world units.
    pub position: Vec2,
    /// Heading; kept normalized by the movement step.
    pub direction: Vec2,
    /// Distance travelled per tick when moving.
    pub speed: f64,
    /// `false` while movement is frozen.
    pub moving: bool,
}

impl Body {
    /// A moving body at `position` heading along `direction`.
    pub fn new(position: Vec2, direction: Vec2, speed: f64) -> Self {
        Self {
            position,
            direction: direction.normalize(),
            speed,
            moving: true,
        }
    }

    /// A body that never moves (grass).
    pub const fn stationary(position: Vec2) -> Self {
        Self {
            position,
            direction: Vec2::ZERO,
            speed: 0.0,
            moving: false,
        }
    }

    /// Stop moving until [`Body::resume_movement`] is called.
    pub const fn freeze_movement(&mut self) {
        self.moving = false;
    }

    /// Resume moving after a freeze.
    pub const fn resume_movement(&mut self) {
        self.moving = true;
    }
}

// ---------------------------------------------------------------------------
// Minds
// ---------------------------------------------------------------------------

/// State machine data for a site-aggregation agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationMind {
    /// Current state.
    pub state: AggregationState,
    /// Tick at which the agent entered `Leave`; `None` when no leave
    /// period is running.
    pub last_left_tick: Option<u64>,
    /// Site whose zone the agent occupied on its last update.
    pub on_site: Option<SiteId>,
}

impl Default for AggregationMind {
    fn default() -> Self {
        Self {
            state: AggregationState::Wandering,
            last_left_tick: None,
            on_site: None,
        }
    }
}

/// Scalar energy reserve, bounded to `[0, MAX_ENERGY]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyLedger {
    /// Current energy.
    pub energy: f64,
}

impl EnergyLedger {
    /// A ledger holding `energy`, clamped to the valid range.
    pub fn new(energy: f64) -> Self {
        Self {
            energy: energy.clamp(0.0, MAX_ENERGY),
        }
    }

    /// A full ledger.
    pub const fn full() -> Self {
        Self { energy: MAX_ENERGY }
    }

    /// Whether the reserve is exhausted.
    pub fn is_depleted(&self) -> bool {
        self.energy <= 0.0
    }
}

/// State machine data for a predator, prey or grass agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EcoMind {
    /// Current state.
    pub state: EcoState,
    /// Tick of the last meal; `None` when no feeding cooldown is active.
    pub last_fed_tick: Option<u64>,
    /// Energy reserve for energy-tracked variants.
    pub ledger: Option<EnergyLedger>,
}

impl EcoMind {
    /// A living mind with the given optional energy reserve.
    pub const fn new(ledger: Option<EnergyLedger>) -> Self {
        Self {
            state: EcoState::Alive,
            last_fed_tick: None,
            ledger,
        }
    }
}

/// Per-variant state machine data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "machine", rename_all = "snake_case")]
pub enum Mind {
    /// Site-aggregation machine.
    Aggregation(AggregationMind),
    /// Predator-prey-grass machine.
    Ecosystem(EcoMind),
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// A simulated agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique, immutable identifier.
    pub id: AgentId,
    /// Variant tag.
    pub kind: AgentKind,
    /// Tick on which the agent was spawned.
    pub born_at_tick: u64,
    /// Position and motion.
    pub body: Body,
    /// State machine data.
    pub mind: Mind,
}

impl Agent {
    /// Create a site-aggregation agent in the `Wandering` state.
    pub fn seeker(id: AgentId, body: Body, born_at_tick: u64) -> Self {
        Self {
            id,
            kind: AgentKind::SiteSeeker,
            born_at_tick,
            body,
            mind: Mind::Aggregation(AggregationMind::default()),
        }
    }

    /// Create an ecosystem agent of `kind`, optionally energy-tracked.
    pub const fn ecosystem(
        id: AgentId,
        kind: AgentKind,
        body: Body,
        ledger: Option<EnergyLedger>,
        born_at_tick: u64,
    ) -> Self {
        Self {
            id,
            kind,
            born_at_tick,
            body,
            mind: Mind::Ecosystem(EcoMind::new(ledger)),
        }
    }

    /// Whether the agent has died.
    pub const fn is_dead(&self) -> bool {
        matches!(
            self.mind,
            Mind::Ecosystem(EcoMind {
                state: EcoState::Dead,
                ..
            })
        )
    }

    /// Current energy, for energy-tracked agents.
    pub const fn energy(&self) -> Option<f64> {
        match &self.mind {
            Mind::Ecosystem(EcoMind {
                ledger: Some(ledger),
                ..
            }) => Some(ledger.energy),
            _ => None,
        }
    }

    /// The state label written to recorded snapshots.
    pub const fn state_label(&self) -> &'static str {
        match &self.mind {
            Mind::Aggregation(mind) => mind.state.label(),
            Mind::Ecosystem(mind) => mind.state.label(),
        }
    }
}

// ---------------------------------------------------------------------------
// Proximity and sites
// ---------------------------------------------------------------------------

/// One entry of a proximity query: another agent within the query radius,
/// as it was at the start of the tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// The other agent.
    pub id: AgentId,
    /// Its kind tag.
    pub kind: AgentKind,
    /// Distance from the querying agent.
    pub distance: f64,
    /// Its position.
    pub position: Vec2,
    /// Its heading.
    pub direction: Vec2,
}

/// A circular aggregation site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Site identifier.
    pub id: SiteId,
    /// Center of the site.
    pub center: Vec2,
    /// Radius of the site's influence zone.
    pub radius: f64,
}

impl Site {
    /// Whether `point` lies within the influence zone.
    pub fn contains(&self, point: Vec2) -> bool {
        self.center.distance(point) <= self.radius
    }
}

// ---------------------------------------------------------------------------
// Recorded snapshots
// ---------------------------------------------------------------------------

/// One recorded row: an agent's labeled facts at a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    /// Tick on which the row was recorded.
    pub frame: u64,
    /// The agent.
    pub id: AgentId,
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Agent kind, recorded by its label (`Prey`, `Grass`, ...).
    #[serde(
        rename = "type",
        serialize_with = "serialize_kind_label",
        deserialize_with = "deserialize_kind_label"
    )]
    pub kind: AgentKind,
    /// State label.
    pub state: String,
    /// Season during the frame, for seasonal scenarios.
    pub season: Option<Season>,
    /// Occupied site, for aggregation agents.
    pub on_site_id: Option<SiteId>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_kind_label<S>(kind: &AgentKind, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(kind.label())
}

fn deserialize_kind_label<'de, D>(deserializer: D) -> Result<AgentKind, D::Error>
where
    D: Deserializer<'de>,
{
    let label = String::deserialize(deserializer)?;
    AgentKind::from_label(&label)
        .ok_or_else(|| serde::de::Error::custom(format!("unknown agent type `{label}`")))
}
