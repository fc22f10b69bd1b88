//! Error types for the habitat-agents crate.
//!
//! All operations that can fail return typed errors rather than panicking.
//! A failed probability draw is not an error: it is simply the branch not
//! taken.

use habitat_types::{AgentId, AgentKind};

/// Errors that can occur while updating agents.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// An energy value outside `[0, 100]` was fed to a probability curve.
    #[error("energy {energy} is outside the valid range [0, 100]")]
    EnergyOutOfRange {
        /// The offending value.
        energy: f64,
    },

    /// A tuning parameter is outside its valid range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the parameter.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The agent's mind does not belong to the state machine being run.
    #[error("agent {agent_id} of kind {kind} carries a mind for a different state machine")]
    MindMismatch {
        /// The agent.
        agent_id: AgentId,
        /// Its kind tag.
        kind: AgentKind,
    },

    /// An energy-scaled policy was applied to an agent without a ledger.
    #[error("agent {0} has an energy-scaled death policy but no energy ledger")]
    MissingLedger(AgentId),

    /// An agent in `Leave` has no record of when it left.
    #[error("agent {0} is leaving but has no leave tick recorded")]
    MissingLeaveTick(AgentId),

    /// A dead agent was handed to the state machine.
    #[error("agent {0} is dead and cannot be updated")]
    AlreadyDead(AgentId),
}
