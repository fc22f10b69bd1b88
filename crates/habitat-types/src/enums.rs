//! Enumeration types for the Habitat simulation.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Agent kinds
// ---------------------------------------------------------------------------

/// The variant tag of an agent.
///
/// Behavior is selected per kind from a dispatch table of policies rather
/// than by inspecting concrete types. Whether a predator tracks energy is a
/// property of its configured policies, not a separate kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Aggregating "cockroach" agent that settles around sites.
    SiteSeeker,
    /// Herbivore: eats grass, is eaten by predators.
    Prey,
    /// Carnivore: eats prey.
    Predator,
    /// Passive, stationary food resource.
    Grass,
}

impl AgentKind {
    /// Label written to the `type` column of recorded snapshots.
    pub const fn label(self) -> &'static str {
        match self {
            Self::SiteSeeker => "SiteSeeker",
            Self::Prey => "Prey",
            Self::Predator => "Predator",
            Self::Grass => "Grass",
        }
    }

    /// The kind whose [`label`](Self::label) is `label`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "SiteSeeker" => Some(Self::SiteSeeker),
            "Prey" => Some(Self::Prey),
            "Predator" => Some(Self::Predator),
            "Grass" => Some(Self::Grass),
            _ => None,
        }
    }

    /// Whether agents of this kind run the site-aggregation state machine.
    pub const fn is_aggregating(self) -> bool {
        matches!(self, Self::SiteSeeker)
    }
}

impl core::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// State sets
// ---------------------------------------------------------------------------

/// States of the site-aggregation machine.
///
/// `wandering -> join -> {still, wandering}`, `still -> leave -> wandering`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationState {
    /// Moving freely; initial state.
    Wandering,
    /// Inside a site's zone, deciding whether to settle.
    Join,
    /// Settled on a site with movement frozen.
    Still,
    /// Walking away from a site; cannot rejoin until the leave period ends.
    Leave,
}

impl AggregationState {
    /// Lowercase label used in recorded snapshots.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Wandering => "wandering",
            Self::Join => "join",
            Self::Still => "still",
            Self::Leave => "leave",
        }
    }
}

/// States of the ecosystem (predator-prey-grass) machine.
///
/// `Eating` and `Reproducing` describe what happened on the agent's last
/// eligible tick; the next update starts from `Alive` again. `Dead` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EcoState {
    /// Alive and not doing anything notable this tick.
    Alive,
    /// Consumed a target this tick.
    Eating,
    /// Produced offspring this tick.
    Reproducing,
    /// Removed from the simulation.
    Dead,
}

impl EcoState {
    /// Lowercase label used in recorded snapshots.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Alive => "alive",
            Self::Eating => "eating",
            Self::Reproducing => "reproducing",
            Self::Dead => "dead",
        }
    }
}

// ---------------------------------------------------------------------------
// Seasons
// ---------------------------------------------------------------------------

/// A recurring phase that scales the grass growth rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    /// Peak growth.
    Summer,
    /// Growth tapering off.
    Autumn,
    /// Minimal growth.
    Winter,
    /// Growth recovering.
    Spring,
}

impl Season {
    /// Every season, in the default cycle order.
    pub const ALL: [Self; 4] = [Self::Summer, Self::Autumn, Self::Winter, Self::Spring];

    /// Lowercase label used in recorded snapshots.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Summer => "summer",
            Self::Autumn => "autumn",
            Self::Winter => "winter",
            Self::Spring => "spring",
        }
    }
}

impl core::fmt::Display for Season {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}
