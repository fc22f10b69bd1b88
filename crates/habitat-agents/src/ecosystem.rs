//! State machine for predator, prey and grass agents.
//!
//! Every kind runs the same machine; the differences live in its
//! [`VariantBehavior`]. Decisions happen only on timestep ticks (every
//! `timestep_interval` ticks). On such a tick the order is:
//!
//! 1. Drain energy; a depleted ledger kills the agent on the spot.
//! 2. Expire the feeding cooldown once `tick > last_fed + cooldown`.
//! 3. Eat at most one edible, live neighbor within the eat distance, then
//!    maybe reproduce. Every other neighbor slows the agent down; the meal
//!    restores its speed.
//! 4. Maybe reproduce spontaneously.
//! 5. Maybe die at random.
//!
//! A reproduction may also scatter extra agents of the same kind at random
//! positions (`scatter_on_reproduce`).
//!
//! `eating` and `reproducing` are single-update labels: the next update
//! returns the agent to `alive` before anything else happens.

use habitat_types::{Agent, AgentId, EcoMind, EcoState, Mind, Neighbor};
use rand::Rng;
use tracing::debug;

use crate::config::{EcosystemRules, FeedingPolicy, MovementPolicy, VariantBehavior};
use crate::energy::{self, DeathCause};
use crate::engine::{Engine, Fact, TickContext};
use crate::error::AgentError;

/// What happened to an ecosystem agent during one update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EcoTickResult {
    /// The neighbor eaten this update.
    pub ate: Option<AgentId>,
    /// Ids of offspring requested this update.
    pub offspring: Vec<AgentId>,
    /// If the agent died this update, the cause.
    pub death: Option<DeathCause>,
}

/// Run one update of the ecosystem machine.
pub fn update(
    agent: &mut Agent,
    ctx: &TickContext<'_>,
    neighbors: &[Neighbor],
    behavior: &VariantBehavior,
    rules: &EcosystemRules,
    rng: &mut impl Rng,
    engine: &mut impl Engine,
) -> Result<EcoTickResult, AgentError> {
    let id = agent.id;
    let kind = agent.kind;
    let Mind::Ecosystem(mind) = &mut agent.mind else {
        return Err(AgentError::MindMismatch { agent_id: id, kind });
    };
    if mind.state == EcoState::Dead {
        return Err(AgentError::AlreadyDead(id));
    }

    engine.record_fact(id, Fact::Kind(kind));
    if let Some(season) = ctx.season {
        engine.record_fact(id, Fact::Season(season));
    }

    if matches!(mind.state, EcoState::Eating | EcoState::Reproducing) {
        mind.state = EcoState::Alive;
    }
    if matches!(behavior.movement, MovementPolicy::Stationary) {
        agent.body.freeze_movement();
    }

    let mut result = EcoTickResult::default();
    if ctx.is_timestep(rules.timestep_interval) {
        let mut mind = *mind;
        decide(agent, &mut mind, ctx, neighbors, behavior, rng, engine, &mut result)?;
        agent.mind = Mind::Ecosystem(mind);
        if let Some(feeding) = &behavior.feeding
            && mind.state != EcoState::Dead
        {
            agent.body.speed = pace(agent.body.speed, neighbors, result.ate, feeding);
        }
    }

    engine.record_fact(id, Fact::State(agent.state_label()));
    Ok(result)
}

/// The timestep decisions. `mind` is a working copy written back by the
/// caller, which keeps `agent` free to be handed to `Engine::reproduce`.
#[allow(clippy::too_many_arguments)]
fn decide(
    agent: &Agent,
    mind: &mut EcoMind,
    ctx: &TickContext<'_>,
    neighbors: &[Neighbor],
    behavior: &VariantBehavior,
    rng: &mut impl Rng,
    engine: &mut impl Engine,
    result: &mut EcoTickResult,
) -> Result<(), AgentError> {
    let id = agent.id;

    // 1. Drain
    let starved = match (mind.ledger.as_mut(), behavior.energy.as_ref()) {
        (Some(ledger), Some(energy_config)) => energy::apply_drain(ledger, energy_config),
        _ => false,
    };
    if starved {
        die(mind, id, ctx.tick, DeathCause::Starvation, engine, result);
        return Ok(());
    }

    if let Some(feeding) = &behavior.feeding {
        // 2. Cooldown expiry
        if let Some(fed) = mind.last_fed_tick
            && ctx.tick > fed.saturating_add(feeding.cooldown_ticks)
        {
            mind.last_fed_tick = None;
        }

        // 3. Feeding
        if mind.last_fed_tick.is_none()
            && let Some(prey) = edible_target(neighbors, feeding, &*engine)
        {
            engine.kill(prey);
            if let Some(ledger) = mind.ledger.as_mut() {
                let gain = behavior.energy.as_ref().map_or(0.0, |e| e.feed_gain);
                energy::apply_feed(ledger, gain);
            }
            mind.last_fed_tick = Some(ctx.tick);
            mind.state = EcoState::Eating;
            result.ate = Some(prey);
            debug!(agent_id = %id, prey_id = %prey, tick = ctx.tick, "ate");

            if rng.random::<f64>() < feeding.reproduce_chance {
                spawn(agent, mind, behavior.scatter_on_reproduce, engine, result);
            }
        }
    }

    // 4. Spontaneous reproduction
    if let Some(chance) = behavior.spontaneous_reproduction
        && rng.random::<f64>() < chance
    {
        spawn(agent, mind, behavior.scatter_on_reproduce, engine, result);
    }

    // 5. Random death
    if let Some(chance) = energy::death_chance(id, &behavior.random_death, mind.ledger.as_ref())?
        && rng.random::<f64>() < chance
    {
        die(mind, id, ctx.tick, DeathCause::Random, engine, result);
    }
    Ok(())
}

/// The first live neighbor within eat distance that the diet allows.
fn edible_target(
    neighbors: &[Neighbor],
    feeding: &FeedingPolicy,
    engine: &impl Engine,
) -> Option<AgentId> {
    neighbors
        .iter()
        .find(|n| {
            n.distance <= feeding.eat_distance && feeding.can_eat(n.kind) && engine.is_alive(n.id)
        })
        .map(|n| n.id)
}

/// Speed after a feeding pass over `neighbors`: each neighbor passed over
/// costs `slowdown_per_neighbor`, the one eaten resets it to `fed_speed`.
fn pace(
    speed: f64,
    neighbors: &[Neighbor],
    ate: Option<AgentId>,
    feeding: &FeedingPolicy,
) -> f64 {
    neighbors.iter().fold(speed, |speed, n| {
        if ate == Some(n.id) {
            feeding.fed_speed.unwrap_or(speed)
        } else {
            (speed - feeding.slowdown_per_neighbor).max(0.0)
        }
    })
}

fn spawn(
    agent: &Agent,
    mind: &mut EcoMind,
    scatter: u32,
    engine: &mut impl Engine,
    result: &mut EcoTickResult,
) {
    let child = engine.reproduce(agent);
    mind.state = EcoState::Reproducing;
    result.offspring.push(child);
    for _ in 0..scatter {
        result.offspring.push(engine.scatter(agent.kind));
    }
}

fn die(
    mind: &mut EcoMind,
    id: AgentId,
    tick: u64,
    cause: DeathCause,
    engine: &mut impl Engine,
    result: &mut EcoTickResult,
) {
    mind.state = EcoState::Dead;
    engine.kill(id);
    result.death = Some(cause);
    debug!(agent_id = %id, tick, cause = %cause, "agent died");
}
