//! Shared type definitions for the Habitat simulation.
//!
//! This crate is the single source of truth for the data that flows between
//! the agent logic, the environment scheduler, and the tick driver. It holds
//! no behavior beyond small accessors; rules live in `habitat-agents` and
//! `habitat-world`.
//!
//! # Modules
//!
//! - [`ids`] -- Typed identifiers for agents, sites, patches and runs
//! - [`enums`] -- Agent kinds, per-variant state sets, seasons
//! - [`geometry`] -- The [`Vec2`] used for positions and headings
//! - [`structs`] -- Agents, bodies, minds, neighbors, snapshot rows

pub mod enums;
pub mod geometry;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{AgentKind, AggregationState, EcoState, Season};
pub use geometry::{Bounds, Vec2};
pub use ids::{AgentId, PatchId, RunId, SiteId};
pub use structs::{
    Agent, AggregationMind, Body, EcoMind, EnergyLedger, MAX_ENERGY, Mind, Neighbor, Site,
    SnapshotRow,
};
