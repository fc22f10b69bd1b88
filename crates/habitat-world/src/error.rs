//! Error types for the `habitat-world` crate.
//!
//! Patch placement never fails because of crowding: an exhausted retry
//! budget is logged and the overlapping candidate is kept. Errors are
//! reserved for configurations that cannot produce a world at all.

use habitat_types::Season;

/// Errors that can occur while building or advancing the environment.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The world has a non-positive or non-finite dimension.
    #[error("invalid world bounds {width} x {height}")]
    InvalidBounds {
        /// Configured width.
        width: f64,
        /// Configured height.
        height: f64,
    },

    /// A tuning parameter is outside its valid range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the parameter.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The season cycle is empty.
    #[error("season order must name at least one season")]
    EmptySeasonOrder,

    /// The season cycle does not name each of the four seasons exactly once.
    #[error("season order {order:?} must name each of the four seasons exactly once")]
    IncompleteSeasonOrder {
        /// The configured order.
        order: Vec<Season>,
    },

    /// A site center lies outside the world.
    #[error("site {index} at ({x}, {y}) lies outside the world")]
    SiteOutOfBounds {
        /// Position of the site in the configured list.
        index: usize,
        /// Horizontal coordinate.
        x: f64,
        /// Vertical coordinate.
        y: f64,
    },

    /// More sites or patches than their identifiers can number.
    #[error("too many {what}: {count}")]
    TooMany {
        /// What was counted.
        what: &'static str,
        /// How many were requested.
        count: usize,
    },
}
