//! Transition probability curves.
//!
//! Pure functions from a scalar input (neighbor count or energy) to a
//! probability. Randomness is drawn by the caller and compared against the
//! returned value, so every curve can be sampled directly in tests.
//!
//! | Curve | Formula | Shape |
//! |-------|---------|-------|
//! | [`JoinCurve`] | `base + gain * (1 - e^(-rate * n))` | rises to `base + gain` |
//! | [`LeaveCurve`] | `scale * e^(-rate * n) + floor` | falls to `floor` |
//! | [`DeathCurve`] | `e^(-exponent * energy)` | falls with energy |

use habitat_types::MAX_ENERGY;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// Saturating curve for the chance that an agent in `join` settles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JoinCurve {
    /// Probability with no neighbors.
    pub base: f64,
    /// Additional probability reached asymptotically.
    pub gain: f64,
    /// How quickly the curve saturates per neighbor.
    pub rate: f64,
}

impl Default for JoinCurve {
    fn default() -> Self {
        Self {
            base: 0.03,
            gain: 0.85,
            rate: 0.5,
        }
    }
}

impl JoinCurve {
    /// Probability of settling given `neighbors` nearby agents.
    pub fn probability(&self, neighbors: u32) -> f64 {
        let n = f64::from(neighbors);
        self.gain.mul_add(1.0 - (-self.rate * n).exp(), self.base)
    }

    /// Check that the curve stays within `[0, 1)`.
    pub fn validate(&self) -> Result<(), AgentError> {
        non_negative("join.base", self.base)?;
        non_negative("join.gain", self.gain)?;
        non_negative("join.rate", self.rate)?;
        if self.base + self.gain > 1.0 {
            return Err(AgentError::InvalidParameter {
                name: "join.gain",
                reason: format!(
                    "base + gain must not exceed 1 (got {})",
                    self.base + self.gain
                ),
            });
        }
        Ok(())
    }
}

/// Decaying curve for the chance that a settled agent leaves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeaveCurve {
    /// Height of the decaying term.
    pub scale: f64,
    /// Decay per neighbor.
    pub rate: f64,
    /// Asymptotic leave chance; never reached from above.
    pub floor: f64,
}

impl Default for LeaveCurve {
    fn default() -> Self {
        Self {
            scale: 0.6,
            rate: 0.7,
            floor: 0.005,
        }
    }
}

impl LeaveCurve {
    /// Probability of leaving given `neighbors` nearby agents.
    pub fn probability(&self, neighbors: u32) -> f64 {
        let n = f64::from(neighbors);
        self.scale.mul_add((-self.rate * n).exp(), self.floor)
    }

    /// Check that the curve stays within `(0, 1]`.
    pub fn validate(&self) -> Result<(), AgentError> {
        non_negative("leave.scale", self.scale)?;
        non_negative("leave.rate", self.rate)?;
        non_negative("leave.floor", self.floor)?;
        if self.floor <= 0.0 {
            return Err(AgentError::InvalidParameter {
                name: "leave.floor",
                reason: String::from("floor must be positive"),
            });
        }
        if self.scale + self.floor > 1.0 {
            return Err(AgentError::InvalidParameter {
                name: "leave.scale",
                reason: format!(
                    "scale + floor must not exceed 1 (got {})",
                    self.scale + self.floor
                ),
            });
        }
        Ok(())
    }
}

/// Decaying curve for the chance of a random death at a given energy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeathCurve {
    /// Steepness; larger values make well-fed agents safer.
    pub exponent: f64,
}

impl Default for DeathCurve {
    fn default() -> Self {
        Self { exponent: 0.4 }
    }
}

impl DeathCurve {
    /// Probability of dying at `energy`.
    ///
    /// Energy outside `[0, 100]` is a programming error and is rejected.
    pub fn probability(&self, energy: f64) -> Result<f64, AgentError> {
        if !(0.0..=MAX_ENERGY).contains(&energy) {
            return Err(AgentError::EnergyOutOfRange { energy });
        }
        Ok((-self.exponent * energy).exp())
    }

    /// Check that the exponent is a non-negative finite number.
    pub fn validate(&self) -> Result<(), AgentError> {
        non_negative("death.exponent", self.exponent)
    }
}

/// Check that a configuration value is a non-negative finite number.
pub(crate) fn non_negative(name: &'static str, value: f64) -> Result<(), AgentError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(AgentError::InvalidParameter {
            name,
            reason: format!("must be a non-negative finite number (got {value})"),
        })
    }
}

/// Check that a configuration value is a probability in `[0, 1]`.
pub(crate) fn unit_interval(name: &'static str, value: f64) -> Result<(), AgentError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(AgentError::InvalidParameter {
            name,
            reason: format!("must lie in [0, 1] (got {value})"),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn join_starts_at_base_and_stays_below_asymptote() {
        let curve = JoinCurve::default();
        assert!((curve.probability(0) - curve.base).abs() < 1e-12);
        for n in 0..30 {
            let p = curve.probability(n);
            assert!(p >= curve.base);
            assert!(p < curve.base + curve.gain);
        }
    }

    #[test]
    fn join_is_non_decreasing() {
        let curve = JoinCurve::default();
        let samples: Vec<f64> = (0..50).map(|n| curve.probability(n)).collect();
        assert!(samples.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn leave_is_non_increasing_and_above_floor() {
        let curve = LeaveCurve::default();
        let samples: Vec<f64> = (0..50).map(|n| curve.probability(n)).collect();
        assert!(samples.windows(2).all(|w| w[0] >= w[1]));
        assert!(samples.iter().all(|p| *p >= curve.floor));
        assert!((curve.probability(0) - (curve.scale + curve.floor)).abs() < 1e-12);
    }

    #[test]
    fn death_decreases_with_energy() {
        let curve = DeathCurve::default();
        assert_eq!(curve.probability(0.0).unwrap(), 1.0);
        let samples: Vec<f64> = (0..=100)
            .map(|e| curve.probability(f64::from(e)).unwrap())
            .collect();
        assert!(samples.windows(2).all(|w| w[0] >= w[1]));
        // e^(-0.4 * 5) = e^-2
        assert!((curve.probability(5.0).unwrap() - (-2.0_f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn death_rejects_out_of_range_energy() {
        let curve = DeathCurve::default();
        assert!(matches!(
            curve.probability(-0.5),
            Err(AgentError::EnergyOutOfRange { .. })
        ));
        assert!(curve.probability(100.5).is_err());
        assert!(curve.probability(f64::NAN).is_err());
    }

    #[test]
    fn validation_rejects_bad_curves() {
        let join = JoinCurve {
            base: 0.5,
            gain: 0.6,
            rate: 1.0,
        };
        assert!(join.validate().is_err());

        let leave = LeaveCurve {
            scale: 0.5,
            rate: 1.0,
            floor: 0.0,
        };
        assert!(leave.validate().is_err());

        let death = DeathCurve { exponent: -1.0 };
        assert!(death.validate().is_err());

        assert!(JoinCurve::default().validate().is_ok());
        assert!(LeaveCurve::default().validate().is_ok());
        assert!(DeathCurve::default().validate().is_ok());
    }
}
