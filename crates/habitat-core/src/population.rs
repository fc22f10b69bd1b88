//! The agent registry.
//!
//! Agents are stored in a `BTreeMap` keyed by id so that iteration order,
//! and with it every seeded run, is reproducible. Ids are handed out by a
//! monotonic counter and never reused.
//!
//! [`AgentFactory`] builds fresh agents for both the initial population and
//! newborns, so a child always starts exactly like a spawned agent of its
//! kind.

use std::collections::BTreeMap;

use habitat_agents::{BehaviorTable, MovementPolicy};
use habitat_types::{Agent, AgentId, AgentKind, Body, EnergyLedger, Vec2};
use rand::Rng;

/// All living agents plus the id allocator.
#[derive(Debug, Clone, Default)]
pub struct Population {
    agents: BTreeMap<AgentId, Agent>,
    next_id: u64,
}

impl Population {
    /// An empty population whose first id is 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next id.
    pub const fn allocate_id(&mut self) -> AgentId {
        let id = AgentId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    /// The id that [`Population::allocate_id`] would return next.
    pub const fn peek_next_id(&self) -> AgentId {
        AgentId::new(self.next_id)
    }

    /// Move the allocator forward to `next` (ids reserved elsewhere this
    /// tick). Never moves it backwards.
    pub fn advance_ids_to(&mut self, next: AgentId) {
        self.next_id = self.next_id.max(next.into_inner());
    }

    /// Add an agent. Returns the agent previously stored under the same id.
    pub fn insert(&mut self, agent: Agent) -> Option<Agent> {
        self.advance_ids_to(AgentId::new(agent.id.into_inner().saturating_add(1)));
        self.agents.insert(agent.id, agent)
    }

    /// Remove an agent.
    pub fn remove(&mut self, id: AgentId) -> Option<Agent> {
        self.agents.remove(&id)
    }

    /// Look up an agent.
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// Look up an agent mutably.
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    /// Whether `id` is present.
    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains_key(&id)
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> Vec<AgentId> {
        self.agents.keys().copied().collect()
    }

    /// Agents in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Number of agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether no agent is left.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Number of agents of `kind`.
    pub fn count_of(&self, kind: AgentKind) -> u32 {
        let count = self.agents.values().filter(|a| a.kind == kind).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Head count per kind. Kinds with no agents are omitted.
    pub fn counts_by_kind(&self) -> BTreeMap<AgentKind, u32> {
        let mut counts = BTreeMap::new();
        for agent in self.agents.values() {
            let entry = counts.entry(agent.kind).or_insert(0_u32);
            *entry = entry.saturating_add(1);
        }
        counts
    }

    /// Number of agents that are not grass.
    pub fn animals(&self) -> u32 {
        let count = self
            .agents
            .values()
            .filter(|a| a.kind != AgentKind::Grass)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

/// Builds new agents from the configured behaviors.
#[derive(Debug, Clone, Copy)]
pub struct AgentFactory<'a> {
    behaviors: &'a BehaviorTable,
    seeker_movement: &'a MovementPolicy,
}

impl<'a> AgentFactory<'a> {
    /// A factory for ecosystem kinds under `behaviors` and site seekers
    /// moving under `seeker_movement`.
    pub const fn new(behaviors: &'a BehaviorTable, seeker_movement: &'a MovementPolicy) -> Self {
        Self {
            behaviors,
            seeker_movement,
        }
    }

    /// A new agent of `kind` at `position`, heading in a random direction.
    ///
    /// Energy-tracked kinds start with their configured initial energy;
    /// stationary kinds start frozen.
    pub fn build(
        &self,
        id: AgentId,
        kind: AgentKind,
        position: Vec2,
        born_at_tick: u64,
        rng: &mut impl Rng,
    ) -> Agent {
        let direction = Vec2::from_polar(rng.random::<f64>() * core::f64::consts::TAU, 1.0);
        match self.behaviors.for_kind(kind) {
            None => Agent::seeker(
                id,
                Body::new(position, direction, initial_speed(self.seeker_movement, None)),
                born_at_tick,
            ),
            Some(behavior) => {
                let ledger = behavior.energy.map(|e| EnergyLedger::new(e.initial));
                let body = if matches!(behavior.movement, MovementPolicy::Stationary) {
                    Body::stationary(position)
                } else {
                    Body::new(
                        position,
                        direction,
                        initial_speed(&behavior.movement, ledger.as_ref()),
                    )
                };
                Agent::ecosystem(id, kind, body, ledger, born_at_tick)
            }
        }
    }
}

fn initial_speed(policy: &MovementPolicy, ledger: Option<&EnergyLedger>) -> f64 {
    match *policy {
        MovementPolicy::Stationary => 0.0,
        MovementPolicy::Wander { speed, .. } => speed,
        MovementPolicy::Seek {
            speed_floor,
            energy_scale,
            ..
        } => ledger.map_or(speed_floor, |l| {
            habitat_agents::energy::speed_for(l, speed_floor, energy_scale)
        }),
        MovementPolicy::Flock { velocity, .. } => velocity,
    }
}
