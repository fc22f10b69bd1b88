//! The contract between agent state machines and the tick driver.
//!
//! State machines never own the population. They ask the driver whether a
//! neighbor is still alive, request kills and births, and report labeled
//! facts for the recorder through the [`Engine`] trait. Tick-wide state
//! (the tick number, the current season, the aggregation sites) arrives in a
//! [`TickContext`] instead of process globals.

use habitat_types::{Agent, AgentId, AgentKind, Season, Site, SiteId, Vec2};

/// Tick-wide state handed to every agent update.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    /// The tick being processed.
    pub tick: u64,
    /// Current season, for seasonal scenarios.
    pub season: Option<Season>,
    /// Aggregation sites.
    pub sites: &'a [Site],
}

impl<'a> TickContext<'a> {
    /// Build a context.
    pub const fn new(tick: u64, season: Option<Season>, sites: &'a [Site]) -> Self {
        Self {
            tick,
            season,
            sites,
        }
    }

    /// Whether this tick falls on a multiple of `interval`.
    ///
    /// An interval of zero never fires.
    pub const fn is_timestep(&self, interval: u64) -> bool {
        matches!(self.tick.checked_rem(interval), Some(0))
    }

    /// The first site whose influence zone contains `position`.
    pub fn site_at(&self, position: Vec2) -> Option<SiteId> {
        self.sites
            .iter()
            .find(|site| site.contains(position))
            .map(|site| site.id)
    }
}

/// A labeled fact reported for the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fact {
    /// The agent's kind.
    Kind(AgentKind),
    /// The agent's state label.
    State(&'static str),
    /// The season the agent observed.
    Season(Season),
    /// The site the agent occupies.
    OnSite(Option<SiteId>),
}

/// Operations a state machine may request from the tick driver.
pub trait Engine {
    /// Whether `id` is alive as of now, including kills earlier this tick.
    fn is_alive(&self, id: AgentId) -> bool;

    /// Remove `id`. It stops being updated and stops appearing in neighbor
    /// lists for the rest of the tick.
    fn kill(&mut self, id: AgentId);

    /// Spawn a new agent of the parent's kind near the parent and return its
    /// id. The newborn becomes active from the next tick.
    fn reproduce(&mut self, parent: &Agent) -> AgentId;

    /// Spawn a new agent of `kind` at a uniformly random position and return
    /// its id. The newborn becomes active from the next tick.
    fn scatter(&mut self, kind: AgentKind) -> AgentId;

    /// Attach a labeled fact to `id` for this tick.
    fn record_fact(&mut self, id: AgentId, fact: Fact);
}
