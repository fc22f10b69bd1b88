//! Grass patch centers and perturbed grass spawning.
//!
//! Patches are placed once at initialization. Each patch gets a retry
//! budget to find a center at least `min_distance` from every earlier
//! patch; when the budget runs out the last candidate is kept anyway.

use habitat_types::{Bounds, PatchId, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::WorldError;

/// Patch placement configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatchConfig {
    /// Number of patches.
    #[serde(default = "default_count")]
    pub count: usize,
    /// Maximum distance of spawned grass from its patch center.
    #[serde(default = "default_spawn_radius")]
    pub spawn_radius: f64,
    /// Desired minimum distance between patch centers.
    #[serde(default = "default_min_distance")]
    pub min_distance: f64,
    /// Placement attempts per patch before accepting an overlap.
    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            count: default_count(),
            spawn_radius: default_spawn_radius(),
            min_distance: default_min_distance(),
            retry_budget: default_retry_budget(),
        }
    }
}

const fn default_count() -> usize {
    4
}

const fn default_spawn_radius() -> f64 {
    40.0
}

const fn default_min_distance() -> f64 {
    120.0
}

const fn default_retry_budget() -> u32 {
    100
}

/// A fixed spawn center for grass. Not an agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrassPatch {
    /// Patch identifier.
    pub id: PatchId,
    /// Center point.
    pub center: Vec2,
    /// Maximum perturbation radius for grass spawned here.
    pub spawn_radius: f64,
}

/// Place `config.count` patches inside `bounds`, keeping centers at least
/// `spawn_radius` from the edges.
pub fn place_patches(
    config: &PatchConfig,
    bounds: Bounds,
    rng: &mut impl Rng,
) -> Result<Vec<GrassPatch>, WorldError> {
    if !bounds.is_valid() {
        return Err(WorldError::InvalidBounds {
            width: bounds.width,
            height: bounds.height,
        });
    }
    let margin = config.spawn_radius;
    if !margin.is_finite() || margin < 0.0 || margin * 2.0 >= bounds.width.min(bounds.height) {
        return Err(WorldError::InvalidParameter {
            name: "patches.spawn_radius",
            reason: format!("radius {margin} does not fit in {} x {}", bounds.width, bounds.height),
        });
    }

    let mut patches: Vec<GrassPatch> = Vec::with_capacity(config.count);
    for index in 0..config.count {
        let raw = u32::try_from(index).ok().ok_or(WorldError::TooMany {
            what: "patches",
            count: config.count,
        })?;

        let mut candidate = random_point(bounds, margin, rng);
        let mut attempts: u32 = 1;
        while is_crowded(&patches, candidate, config.min_distance) {
            if attempts >= config.retry_budget.max(1) {
                warn!(
                    patch = index,
                    attempts,
                    min_distance = config.min_distance,
                    "patch placement retries exhausted, accepting overlap"
                );
                break;
            }
            candidate = random_point(bounds, margin, rng);
            attempts = attempts.saturating_add(1);
        }

        debug!(patch = index, x = candidate.x, y = candidate.y, attempts, "placed grass patch");
        patches.push(GrassPatch {
            id: PatchId::new(raw),
            center: candidate,
            spawn_radius: config.spawn_radius,
        });
    }
    Ok(patches)
}

/// A point `center + (cos t, sin t) * r` with `t` uniform in `[0, 2pi)` and
/// `r` uniform in `[0, radius]`.
///
/// Uniform radius concentrates points toward the center; it is not uniform
/// over the disk's area.
pub fn perturbed_point(center: Vec2, radius: f64, rng: &mut impl Rng) -> Vec2 {
    let angle = rng.random::<f64>() * core::f64::consts::TAU;
    let distance = rng.random::<f64>() * radius;
    center + Vec2::from_polar(angle, distance)
}

fn random_point(bounds: Bounds, margin: f64, rng: &mut impl Rng) -> Vec2 {
    Vec2::new(
        rng.random_range(margin..bounds.width - margin),
        rng.random_range(margin..bounds.height - margin),
    )
}

fn is_crowded(patches: &[GrassPatch], candidate: Vec2, min_distance: f64) -> bool {
    patches
        .iter()
        .any(|patch| patch.center.distance(candidate) < min_distance)
}
