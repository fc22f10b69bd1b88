//! Energy ledger rules: drain, feeding, starvation and energy-driven speed.
//!
//! Energy is bounded to `[0, 100]`. Draining clamps at zero and reports
//! depletion on the same call, so an agent can never be observed with
//! negative energy on a later tick.

use habitat_types::{AgentId, EnergyLedger, MAX_ENERGY};

use crate::config::{EnergyConfig, RandomDeath};
use crate::error::AgentError;

/// Why an ecosystem agent died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeathCause {
    /// Energy drained to zero.
    Starvation,
    /// A random death draw succeeded.
    Random,
}

impl core::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Starvation => write!(f, "starvation"),
            Self::Random => write!(f, "random"),
        }
    }
}

/// Subtract one timestep of drain. Returns `true` when the ledger is
/// depleted afterwards.
pub fn apply_drain(ledger: &mut EnergyLedger, config: &EnergyConfig) -> bool {
    ledger.energy = (ledger.energy - config.drain_per_timestep).max(0.0);
    ledger.is_depleted()
}

/// Restore `gain` energy, capped at the maximum.
pub fn apply_feed(ledger: &mut EnergyLedger, gain: f64) {
    ledger.energy = (ledger.energy + gain).min(MAX_ENERGY);
}

/// Chance that agent `id` dies this timestep under `policy`.
///
/// Energy-scaled policies need a ledger; the other policies ignore it.
pub fn death_chance(
    id: AgentId,
    policy: &RandomDeath,
    ledger: Option<&EnergyLedger>,
) -> Result<Option<f64>, AgentError> {
    match policy {
        RandomDeath::Never => Ok(None),
        RandomDeath::Constant { chance } => Ok(Some(*chance)),
        RandomDeath::EnergyScaled(curve) => {
            let ledger = ledger.ok_or(AgentError::MissingLedger(id))?;
            curve.probability(ledger.energy).map(Some)
        }
    }
}

/// Movement speed derived from energy: `max(floor, energy / scale)`.
pub fn speed_for(ledger: &EnergyLedger, floor: f64, scale: f64) -> f64 {
    if scale <= 0.0 {
        return floor;
    }
    (ledger.energy / scale).max(floor)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use crate::probability::DeathCurve;

    use super::*;

    fn config(drain: f64) -> EnergyConfig {
        EnergyConfig {
            initial: 5.0,
            drain_per_timestep: drain,
            feed_gain: 30.0,
        }
    }

    #[test]
    fn drain_reaches_zero_and_reports_depletion() {
        let mut ledger = EnergyLedger::new(0.5);
        assert!(!apply_drain(&mut ledger, &config(0.25)));
        assert!(apply_drain(&mut ledger, &config(0.25)));
        assert_eq!(ledger.energy, 0.0);
    }

    #[test]
    fn drain_past_zero_clamps() {
        let mut ledger = EnergyLedger::new(0.1);
        assert!(apply_drain(&mut ledger, &config(0.25)));
        assert_eq!(ledger.energy, 0.0);
    }

    #[test]
    fn five_energy_lasts_twenty_timesteps() {
        let mut ledger = EnergyLedger::new(5.0);
        let steps = (1..=100)
            .find(|_| apply_drain(&mut ledger, &config(0.25)))
            .unwrap();
        assert_eq!(steps, 20);
    }

    #[test]
    fn feeding_caps_at_max() {
        let mut ledger = EnergyLedger::new(90.0);
        apply_feed(&mut ledger, 30.0);
        assert_eq!(ledger.energy, MAX_ENERGY);
    }

    #[test]
    fn speed_has_a_floor() {
        assert_eq!(speed_for(&EnergyLedger::new(30.0), 0.7, 75.0), 0.7);
        assert_eq!(speed_for(&EnergyLedger::new(75.0), 0.7, 75.0), 1.0);
    }

    #[test]
    fn death_chance_per_policy() {
        let id = AgentId::new(7);
        let ledger = EnergyLedger::new(0.0);
        assert_eq!(death_chance(id, &RandomDeath::Never, None).unwrap(), None);
        assert_eq!(
            death_chance(id, &RandomDeath::Constant { chance: 0.01 }, None).unwrap(),
            Some(0.01)
        );
        let scaled = RandomDeath::EnergyScaled(DeathCurve::default());
        assert_eq!(death_chance(id, &scaled, Some(&ledger)).unwrap(), Some(1.0));
        assert!(matches!(
            death_chance(id, &scaled, None),
            Err(AgentError::MissingLedger(_))
        ));
    }
}
