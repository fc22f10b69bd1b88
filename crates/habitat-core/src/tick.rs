//! Tick cycle: the phase loop that drives the Habitat simulation.
//!
//! Each tick runs through these phases:
//!
//! 1. **Clock** -- advance the tick counter.
//! 2. **Environment** -- advance the season and roll grass growth per patch.
//! 3. **Snapshot** -- compute every agent's neighbor list once.
//! 4. **Update** -- run each agent's state machine in ascending id order.
//!    Kills take effect at once: a killed agent is skipped and filtered out
//!    of later neighbor lists. Births are queued.
//! 5. **Movement** -- move every surviving agent under its movement policy.
//! 6. **Cleanup** -- remove the dead.
//! 7. **Record** -- on recorded frames, turn each survivor's reported facts
//!    into a snapshot row.
//! 8. **Birth** -- materialize queued offspring and grown grass. Newborns are
//!    first updated on the next tick.
//!
//! The cycle is deterministic given the same initial state and seed.

use std::collections::{BTreeMap, BTreeSet};

use habitat_agents::{
    AgentError, AggregationConfig, BehaviorTable, DeathCause, EcosystemRules, Engine, Fact,
    TickContext, aggregation, ecosystem, movement,
};
use habitat_types::{
    Agent, AgentId, AgentKind, Bounds, Neighbor, Season, Site, SiteId, SnapshotRow, Vec2,
};
use habitat_world::{EcosystemScheduler, GrassPatch, perturbed_point};
use rand::{Rng, SeedableRng};
use rand::rngs::SmallRng;
use tracing::debug;

use crate::clock::{ClockError, SimClock};
use crate::population::{AgentFactory, Population};
use crate::proximity::ProximitySnapshot;
use crate::recorder::Recorder;

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// An agent update failed.
    #[error("agent error for {agent_id}: {source}")]
    Agent {
        /// The agent that caused the error.
        agent_id: AgentId,
        /// The underlying agent error.
        source: AgentError,
    },

    /// An ecosystem agent's kind has no behavior in the table.
    #[error("no behavior configured for agent {agent_id} of kind {kind}")]
    NoBehavior {
        /// The agent.
        agent_id: AgentId,
        /// Its kind.
        kind: AgentKind,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// The season during this tick, for seasonal runs.
    pub season: Option<Season>,
    /// The new season, if it changed on this tick.
    pub season_changed: Option<Season>,
    /// Living agents at end of tick.
    pub agents_alive: u32,
    /// Living non-grass agents at end of tick.
    pub animals_alive: u32,
    /// Living agents per kind at end of tick.
    pub counts: BTreeMap<AgentKind, u32>,
    /// Agents eaten this tick.
    pub eaten: u32,
    /// Agents that starved this tick.
    pub starved: u32,
    /// Agents that died at random this tick.
    pub random_deaths: u32,
    /// Offspring materialized this tick.
    pub births: u32,
    /// Grass grown from patches this tick.
    pub grass_grown: u32,
}

impl TickSummary {
    /// All removals this tick.
    pub const fn deaths(&self) -> u32 {
        self.eaten
            .saturating_add(self.starved)
            .saturating_add(self.random_deaths)
    }
}

/// The mutable simulation state passed through the tick cycle.
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// The tick clock.
    pub clock: SimClock,
    /// Every living agent.
    pub population: Population,
    /// World extent; positions wrap at the edges.
    pub bounds: Bounds,
    /// Neighbor query radius.
    pub proximity_radius: f64,
    /// Aggregation sites.
    pub sites: Vec<Site>,
    /// Grass patch centers.
    pub patches: Vec<GrassPatch>,
    /// Season and grow rate; `None` for runs without seasons.
    pub scheduler: Option<EcosystemScheduler>,
    /// Per-kind ecosystem behavior.
    pub behaviors: BehaviorTable,
    /// Site-aggregation parameters.
    pub aggregation: AggregationConfig,
    /// Timestep gating for ecosystem kinds.
    pub rules: EcosystemRules,
    /// Maximum distance of a newborn from its parent.
    pub spawn_offset: f64,
    /// Rows are recorded on ticks divisible by this interval.
    pub snapshot_interval: u64,
    /// The single random source of the run.
    pub rng: SmallRng,
}

impl SimulationState {
    /// An empty world with default rules, no seasons and no sites.
    pub fn new(bounds: Bounds, proximity_radius: f64, seed: u64) -> Self {
        Self {
            clock: SimClock::default(),
            population: Population::new(),
            bounds,
            proximity_radius,
            sites: Vec::new(),
            patches: Vec::new(),
            scheduler: None,
            behaviors: BehaviorTable::default(),
            aggregation: AggregationConfig::default(),
            rules: EcosystemRules::default(),
            spawn_offset: 0.0,
            snapshot_interval: 1,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Build and insert a new agent of `kind` at `position`, born on the
    /// current tick.
    pub fn spawn(&mut self, kind: AgentKind, position: Vec2) -> AgentId {
        let id = self.population.allocate_id();
        let factory = AgentFactory::new(&self.behaviors, &self.aggregation.movement);
        let agent = factory.build(id, kind, position, self.clock.tick(), &mut self.rng);
        self.population.insert(agent);
        id
    }

    /// The active season, for seasonal runs.
    pub fn season(&self) -> Option<Season> {
        self.scheduler.as_ref().map(EcosystemScheduler::season)
    }
}

// ---------------------------------------------------------------------------
// Command buffer
// ---------------------------------------------------------------------------

/// A birth requested during the update phase.
#[derive(Debug, Clone, Copy)]
struct PendingBirth {
    id: AgentId,
    kind: AgentKind,
    /// The parent's position; `None` places the newborn anywhere.
    near: Option<Vec2>,
}

/// Facts reported by one agent during one tick.
#[derive(Debug, Clone, Copy, Default)]
struct FactSheet {
    kind: Option<AgentKind>,
    state: Option<&'static str>,
    season: Option<Season>,
    on_site: Option<SiteId>,
}

/// The tick driver's [`Engine`]: kills are visible at once, births wait for
/// the end of the tick.
#[derive(Debug)]
struct CommandBuffer {
    killed: BTreeSet<AgentId>,
    births: Vec<PendingBirth>,
    facts: BTreeMap<AgentId, FactSheet>,
    next_id: u64,
}

impl CommandBuffer {
    fn new(next_id: AgentId) -> Self {
        Self {
            killed: BTreeSet::new(),
            births: Vec::new(),
            facts: BTreeMap::new(),
            next_id: next_id.into_inner(),
        }
    }

    /// `neighbors` without the agents killed so far.
    fn live_neighbors(&self, neighbors: &[Neighbor]) -> Vec<Neighbor> {
        neighbors
            .iter()
            .filter(|n| !self.killed.contains(&n.id))
            .copied()
            .collect()
    }
}

impl Engine for CommandBuffer {
    fn is_alive(&self, id: AgentId) -> bool {
        !self.killed.contains(&id)
    }

    fn kill(&mut self, id: AgentId) {
        self.killed.insert(id);
    }

    fn reproduce(&mut self, parent: &Agent) -> AgentId {
        let id = AgentId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.births.push(PendingBirth {
            id,
            kind: parent.kind,
            near: Some(parent.body.position),
        });
        id
    }

    fn scatter(&mut self, kind: AgentKind) -> AgentId {
        let id = AgentId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.births.push(PendingBirth {
            id,
            kind,
            near: None,
        });
        id
    }

    fn record_fact(&mut self, id: AgentId, fact: Fact) {
        let sheet = self.facts.entry(id).or_default();
        match fact {
            Fact::Kind(kind) => sheet.kind = Some(kind),
            Fact::State(label) => sheet.state = Some(label),
            Fact::Season(season) => sheet.season = Some(season),
            Fact::OnSite(site) => sheet.on_site = site,
        }
    }
}

// ---------------------------------------------------------------------------
// Tick
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Tally {
    eaten: u32,
    starved: u32,
    random_deaths: u32,
}

/// Execute one complete tick of the simulation.
///
/// # Errors
///
/// Returns [`TickError`] if the clock overflows or an agent update fails.
/// The state is left partially updated in that case.
pub fn run_tick(
    state: &mut SimulationState,
    recorder: &mut dyn Recorder,
) -> Result<TickSummary, TickError> {
    // --- Phase 1: Clock ---
    let tick = state.clock.advance()?;

    // --- Phase 2: Environment ---
    let (season_changed, grass_spawns) = match state.scheduler.as_mut() {
        Some(scheduler) => {
            let env = scheduler.on_environment_tick(tick, &state.patches, &mut state.rng);
            (env.season_changed, env.grass_spawns)
        }
        None => (None, Vec::new()),
    };
    let season = state.season();

    // --- Phase 3: Snapshot ---
    let snapshot = ProximitySnapshot::build(&state.population, state.proximity_radius);
    let ids = state.population.ids();
    let mut commands = CommandBuffer::new(state.population.peek_next_id());
    let mut tally = Tally::default();

    // --- Phase 4: Update ---
    let ctx = TickContext::new(tick, season, &state.sites);
    for &id in &ids {
        if !commands.is_alive(id) {
            continue;
        }
        let Some(agent) = state.population.get_mut(id) else {
            continue;
        };
        let neighbors = commands.live_neighbors(snapshot.neighbors_of(id));

        if agent.kind.is_aggregating() {
            aggregation::update(
                agent,
                &ctx,
                &neighbors,
                &state.aggregation,
                &mut state.rng,
                &mut commands,
            )
            .map_err(|source| TickError::Agent {
                agent_id: id,
                source,
            })?;
        } else {
            let behavior = state
                .behaviors
                .for_kind(agent.kind)
                .ok_or(TickError::NoBehavior {
                    agent_id: id,
                    kind: agent.kind,
                })?;
            let result = ecosystem::update(
                agent,
                &ctx,
                &neighbors,
                behavior,
                &state.rules,
                &mut state.rng,
                &mut commands,
            )
            .map_err(|source| TickError::Agent {
                agent_id: id,
                source,
            })?;
            if result.ate.is_some() {
                tally.eaten = tally.eaten.saturating_add(1);
            }
            match result.death {
                Some(DeathCause::Starvation) => tally.starved = tally.starved.saturating_add(1),
                Some(DeathCause::Random) => {
                    tally.random_deaths = tally.random_deaths.saturating_add(1);
                }
                None => {}
            }
        }
    }

    // --- Phase 5: Movement ---
    for &id in &ids {
        if !commands.is_alive(id) {
            continue;
        }
        let Some(agent) = state.population.get_mut(id) else {
            continue;
        };
        let neighbors = commands.live_neighbors(snapshot.neighbors_of(id));
        match state.behaviors.for_kind(agent.kind) {
            Some(behavior) => movement::step(
                agent,
                &behavior.movement,
                &neighbors,
                behavior.feeding.as_ref(),
                state.bounds,
                &mut state.rng,
            ),
            None => movement::step(
                agent,
                &state.aggregation.movement,
                &neighbors,
                None,
                state.bounds,
                &mut state.rng,
            ),
        }
    }

    // --- Phase 6: Cleanup ---
    for id in &commands.killed {
        state.population.remove(*id);
    }

    // --- Phase 7: Record ---
    if matches!(tick.checked_rem(state.snapshot_interval), Some(0)) {
        for (id, sheet) in &commands.facts {
            if let Some(agent) = state.population.get(*id) {
                recorder.record(snapshot_row(tick, agent, sheet));
            }
        }
    }

    // --- Phase 8: Birth ---
    state.population.advance_ids_to(AgentId::new(commands.next_id));
    let births = materialize_births(state, &commands.births, tick);
    let grass_grown = grow_grass(state, &grass_spawns, tick);

    let counts = state.population.counts_by_kind();
    let agents_alive = u32::try_from(state.population.len()).unwrap_or(u32::MAX);
    let animals_alive = state.population.animals();

    debug!(
        tick,
        season = ?season,
        agents_alive,
        eaten = tally.eaten,
        starved = tally.starved,
        random_deaths = tally.random_deaths,
        births,
        grass_grown,
        "Tick complete"
    );

    Ok(TickSummary {
        tick,
        season,
        season_changed,
        agents_alive,
        animals_alive,
        counts,
        eaten: tally.eaten,
        starved: tally.starved,
        random_deaths: tally.random_deaths,
        births,
        grass_grown,
    })
}

fn snapshot_row(tick: u64, agent: &Agent, sheet: &FactSheet) -> SnapshotRow {
    SnapshotRow {
        frame: tick,
        id: agent.id,
        x: agent.body.position.x,
        y: agent.body.position.y,
        kind: sheet.kind.unwrap_or(agent.kind),
        state: sheet.state.unwrap_or_else(|| agent.state_label()).to_owned(),
        season: sheet.season,
        on_site_id: sheet.on_site,
    }
}

/// Insert queued offspring under the ids handed out during the update
/// phase, each at a perturbed point around its parent or, for scattered
/// births, anywhere in the world.
fn materialize_births(state: &mut SimulationState, births: &[PendingBirth], tick: u64) -> u32 {
    let factory = AgentFactory::new(&state.behaviors, &state.aggregation.movement);
    let mut count: u32 = 0;
    for birth in births {
        let position = match birth.near {
            Some(near) => state
                .bounds
                .wrap(perturbed_point(near, state.spawn_offset, &mut state.rng)),
            None => random_position(state.bounds, &mut state.rng),
        };
        let agent = factory.build(birth.id, birth.kind, position, tick, &mut state.rng);
        state.population.insert(agent);
        count = count.saturating_add(1);
    }
    count
}

/// A uniformly random point inside `bounds`.
pub(crate) fn random_position(bounds: Bounds, rng: &mut impl Rng) -> Vec2 {
    Vec2::new(
        rng.random_range(0.0..bounds.width),
        rng.random_range(0.0..bounds.height),
    )
}

fn grow_grass(state: &mut SimulationState, spawns: &[Vec2], tick: u64) -> u32 {
    let factory = AgentFactory::new(&state.behaviors, &state.aggregation.movement);
    let mut count: u32 = 0;
    for point in spawns {
        let id = state.population.allocate_id();
        let position = state.bounds.wrap(*point);
        let agent = factory.build(id, AgentKind::Grass, position, tick, &mut state.rng);
        state.population.insert(agent);
        count = count.saturating_add(1);
    }
    count
}
