//! Aggregation site layout.

use habitat_types::{Bounds, Site, SiteId, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// A configured site: center and influence radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SiteSpec {
    /// Horizontal center.
    pub x: f64,
    /// Vertical center.
    pub y: f64,
    /// Influence radius.
    pub radius: f64,
}

impl SiteSpec {
    /// A site at the center of `bounds`.
    pub fn centered(bounds: Bounds, radius: f64) -> Self {
        let center = bounds.center();
        Self {
            x: center.x,
            y: center.y,
            radius,
        }
    }
}

/// Turn configured sites into numbered [`Site`]s, rejecting centers outside
/// the world and non-positive radii.
pub fn build_sites(specs: &[SiteSpec], bounds: Bounds) -> Result<Vec<Site>, WorldError> {
    specs
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let center = Vec2::new(spec.x, spec.y);
            if !bounds.contains(center) {
                return Err(WorldError::SiteOutOfBounds {
                    index,
                    x: spec.x,
                    y: spec.y,
                });
            }
            if !(spec.radius.is_finite() && spec.radius > 0.0) {
                return Err(WorldError::InvalidParameter {
                    name: "sites.radius",
                    reason: format!("site {index} has radius {}", spec.radius),
                });
            }
            let raw = u32::try_from(index).ok().ok_or(WorldError::TooMany {
                what: "sites",
                count: specs.len(),
            })?;
            Ok(Site {
                id: SiteId::new(raw),
                center,
                radius: spec.radius,
            })
        })
        .collect()
}
