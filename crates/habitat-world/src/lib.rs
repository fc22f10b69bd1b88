//! Environment for the Habitat simulation: seasons, grass patches, and
//! aggregation sites.
//!
//! Nothing here is an agent. This crate owns the process-wide environment
//! state (season index, grow rate) as explicit values and computes where
//! grass should appear; the tick driver turns those positions into agents.
//!
//! # Modules
//!
//! - [`error`] -- Error types for environment construction ([`WorldError`]).
//! - [`patches`] -- Grass patch placement with a retry budget, and the
//!   center-biased spawn perturbation.
//! - [`seasons`] -- [`EcosystemScheduler`]: season cycle and grow rate.
//! - [`sites`] -- Aggregation site layout.

pub mod error;
pub mod patches;
pub mod seasons;
pub mod sites;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use patches::{GrassPatch, PatchConfig, perturbed_point, place_patches};
pub use seasons::{EcosystemScheduler, EnvironmentTick, SeasonConfig, SeasonMultipliers};
pub use sites::{SiteSpec, build_sites};
