//! Agent state machines and the rules they consume for the Habitat
//! simulation.
//!
//! This crate holds every per-agent decision and nothing else: it never owns
//! the population, never samples positions, and never touches I/O. The tick
//! driver in `habitat-core` hands each agent its neighbor snapshot and an
//! [`Engine`] to request kills, births and recorded facts.
//!
//! # Modules
//!
//! - [`aggregation`] -- Wandering/join/still/leave machine for site seekers
//! - [`config`] -- Per-variant policies and presets ([`BehaviorTable`])
//! - [`ecosystem`] -- Alive/eating/reproducing/dead machine for predators, prey and grass
//! - [`energy`] -- Energy drain, feeding, starvation and speed ([`DeathCause`])
//! - [`engine`] -- The driver contract ([`Engine`], [`TickContext`], [`Fact`])
//! - [`error`] -- Error types for all agent operations ([`AgentError`])
//! - [`movement`] -- Wander, seek, flock and stationary movement
//! - [`probability`] -- Join, leave and death probability curves

pub mod aggregation;
pub mod config;
pub mod ecosystem;
pub mod energy;
pub mod engine;
pub mod error;
pub mod movement;
pub mod probability;

// Re-export primary types at crate root for convenience.
pub use config::{
    AggregationConfig, BehaviorTable, EcosystemRules, EnergyConfig, FeedingPolicy,
    MovementPolicy, RandomDeath, VariantBehavior,
};
pub use ecosystem::EcoTickResult;
pub use energy::DeathCause;
pub use engine::{Engine, Fact, TickContext};
pub use error::AgentError;
pub use probability::{DeathCurve, JoinCurve, LeaveCurve};
