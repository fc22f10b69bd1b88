//! State machine for site-aggregation agents.
//!
//! ```text
//! wandering --(enters site)--> join --(r < join(n))--> still
//!     ^                          |                       |
//!     |                   (leaves site)          (r < leave(n))
//!     |                          v                       v
//!     +--------------------- wandering <--(duration)-- leave
//! ```
//!
//! `n` is the number of live site seekers in the agent's neighbor list.
//! Join and leave draws happen only on check-interval ticks.

use habitat_types::{Agent, AgentId, AgentKind, AggregationMind, AggregationState, Mind, Neighbor};
use rand::Rng;
use tracing::debug;

use crate::config::AggregationConfig;
use crate::engine::{Engine, Fact, TickContext};
use crate::error::AgentError;

/// Run one update of the aggregation machine and return the new state.
///
/// Reports the kind, state and occupied site as facts.
pub fn update(
    agent: &mut Agent,
    ctx: &TickContext<'_>,
    neighbors: &[Neighbor],
    config: &AggregationConfig,
    rng: &mut impl Rng,
    engine: &mut impl Engine,
) -> Result<AggregationState, AgentError> {
    let id = agent.id;
    let Mind::Aggregation(mind) = &mut agent.mind else {
        return Err(AgentError::MindMismatch {
            agent_id: id,
            kind: agent.kind,
        });
    };
    engine.record_fact(id, Fact::Kind(agent.kind));

    let on_site = ctx.site_at(agent.body.position);
    mind.on_site = on_site;
    let check = ctx.is_timestep(config.check_interval);
    let previous = mind.state;

    match mind.state {
        AggregationState::Wandering => {
            if on_site.is_some() {
                mind.state = AggregationState::Join;
            }
        }
        AggregationState::Join => {
            if on_site.is_none() {
                mind.state = AggregationState::Wandering;
            } else if check {
                let n = seeker_count(neighbors, &*engine);
                if rng.random::<f64>() < config.join.probability(n) {
                    mind.state = AggregationState::Still;
                    agent.body.freeze_movement();
                }
            }
        }
        AggregationState::Still => {
            agent.body.freeze_movement();
            if check {
                let n = seeker_count(neighbors, &*engine);
                if rng.random::<f64>() < config.leave.probability(n) {
                    mind.state = AggregationState::Leave;
                    mind.last_left_tick = Some(ctx.tick);
                    agent.body.resume_movement();
                }
            }
        }
        AggregationState::Leave => update_leave(mind, id, ctx.tick, config.leave_duration)?,
    }

    if mind.state != previous {
        debug!(
            agent_id = %id,
            tick = ctx.tick,
            from = previous.label(),
            to = mind.state.label(),
            "aggregation transition"
        );
    }

    engine.record_fact(id, Fact::State(mind.state.label()));
    engine.record_fact(id, Fact::OnSite(on_site));
    Ok(mind.state)
}

fn update_leave(
    mind: &mut AggregationMind,
    id: AgentId,
    tick: u64,
    duration: u64,
) -> Result<(), AgentError> {
    let left = mind.last_left_tick.ok_or(AgentError::MissingLeaveTick(id))?;
    if tick.saturating_sub(left) >= duration {
        mind.state = AggregationState::Wandering;
        mind.last_left_tick = None;
    }
    Ok(())
}

/// Number of live site seekers among `neighbors`.
fn seeker_count(neighbors: &[Neighbor], engine: &impl Engine) -> u32 {
    let count = neighbors
        .iter()
        .filter(|n| n.kind == AgentKind::SiteSeeker && engine.is_alive(n.id))
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use habitat_types::{Body, Site, SiteId, Vec2};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::engine::testing::RecordingEngine;
    use crate::probability::{JoinCurve, LeaveCurve};

    fn sites() -> Vec<Site> {
        vec![Site {
            id: SiteId::new(0),
            center: Vec2::new(100.0, 100.0),
            radius: 30.0,
        }]
    }

    fn seeker_at(x: f64, y: f64) -> Agent {
        Agent::seeker(
            AgentId::new(1),
            Body::new(Vec2::new(x, y), Vec2::new(1.0, 0.0), 1.0),
            0,
        )
    }

    /// Join and leave curves that always fire.
    fn certain() -> AggregationConfig {
        AggregationConfig {
            join: JoinCurve {
                base: 1.0,
                gain: 0.0,
                rate: 0.0,
            },
            leave: LeaveCurve {
                scale: 0.0,
                rate: 0.0,
                floor: 1.0,
            },
            check_interval: 1,
            leave_duration: 500,
            ..AggregationConfig::default()
        }
    }

    /// Join and leave curves that never fire.
    fn never() -> AggregationConfig {
        AggregationConfig {
            join: JoinCurve {
                base: 0.0,
                gain: 0.0,
                rate: 0.0,
            },
            leave: LeaveCurve {
                scale: 0.0,
                rate: 0.0,
                floor: 0.0,
            },
            check_interval: 1,
            ..AggregationConfig::default()
        }
    }

    fn state_of(agent: &Agent) -> AggregationState {
        match agent.mind {
            Mind::Aggregation(mind) => mind.state,
            Mind::Ecosystem(_) => AggregationState::Wandering,
        }
    }

    #[test]
    fn wandering_on_site_joins_in_one_update() {
        let sites = sites();
        let ctx = TickContext::new(1, None, &sites);
        let mut agent = seeker_at(100.0, 100.0);
        let mut engine = RecordingEngine::new();
        let mut rng = SmallRng::seed_from_u64(1);

        let state = update(&mut agent, &ctx, &[], &never(), &mut rng, &mut engine).unwrap();
        assert_eq!(state, AggregationState::Join);
        assert_eq!(engine.last_state(agent.id), Some("join"));
        assert!(agent.body.moving);
    }

    #[test]
    fn wandering_off_site_stays_wandering() {
        let sites = sites();
        let ctx = TickContext::new(1, None, &sites);
        let mut agent = seeker_at(0.0, 0.0);
        let mut engine = RecordingEngine::new();
        let mut rng = SmallRng::seed_from_u64(1);

        let state = update(&mut agent, &ctx, &[], &certain(), &mut rng, &mut engine).unwrap();
        assert_eq!(state, AggregationState::Wandering);
    }

    #[test]
    fn join_reverts_when_leaving_the_site() {
        let sites = sites();
        let mut agent = seeker_at(100.0, 100.0);
        let mut engine = RecordingEngine::new();
        let mut rng = SmallRng::seed_from_u64(2);

        update(&mut agent, &TickContext::new(1, None, &sites), &[], &never(), &mut rng, &mut engine)
            .unwrap();
        agent.body.position = Vec2::new(300.0, 300.0);
        let state = update(
            &mut agent,
            &TickContext::new(2, None, &sites),
            &[],
            &certain(),
            &mut rng,
            &mut engine,
        )
        .unwrap();
        assert_eq!(state, AggregationState::Wandering);
    }

    #[test]
    fn full_cycle_through_still_and_leave() {
        let sites = sites();
        let config = certain();
        let mut agent = seeker_at(100.0, 100.0);
        let mut engine = RecordingEngine::new();
        let mut rng = SmallRng::seed_from_u64(3);
        let mut step = |agent: &mut Agent, tick: u64| {
            update(
                agent,
                &TickContext::new(tick, None, &sites),
                &[],
                &config,
                &mut rng,
                &mut engine,
            )
            .unwrap()
        };

        assert_eq!(step(&mut agent, 1), AggregationState::Join);
        assert_eq!(step(&mut agent, 2), AggregationState::Still);
        assert!(!agent.body.moving);
        assert_eq!(step(&mut agent, 3), AggregationState::Leave);
        assert!(agent.body.moving);
        assert_eq!(step(&mut agent, 502), AggregationState::Leave);
        assert_eq!(step(&mut agent, 503), AggregationState::Wandering);
        match agent.mind {
            Mind::Aggregation(mind) => assert_eq!(mind.last_left_tick, None),
            Mind::Ecosystem(_) => unreachable!(),
        }
    }

    #[test]
    fn still_stays_frozen_without_leave_draw() {
        let sites = sites();
        let mut agent = seeker_at(100.0, 100.0);
        agent.mind = Mind::Aggregation(AggregationMind {
            state: AggregationState::Still,
            last_left_tick: None,
            on_site: Some(SiteId::new(0)),
        });
        agent.body.freeze_movement();
        let mut engine = RecordingEngine::new();
        let mut rng = SmallRng::seed_from_u64(4);

        for tick in 1..50 {
            let ctx = TickContext::new(tick, None, &sites);
            update(&mut agent, &ctx, &[], &never(), &mut rng, &mut engine).unwrap();
            assert_eq!(state_of(&agent), AggregationState::Still);
            assert!(!agent.body.moving);
        }
    }

    #[test]
    fn draws_only_on_check_interval() {
        let sites = sites();
        let config = AggregationConfig {
            check_interval: 20,
            ..certain()
        };
        let mut agent = seeker_at(100.0, 100.0);
        let mut engine = RecordingEngine::new();
        let mut rng = SmallRng::seed_from_u64(5);

        for tick in 1..20 {
            let ctx = TickContext::new(tick, None, &sites);
            update(&mut agent, &ctx, &[], &config, &mut rng, &mut engine).unwrap();
            assert_eq!(state_of(&agent), AggregationState::Join);
        }
        let ctx = TickContext::new(20, None, &sites);
        update(&mut agent, &ctx, &[], &config, &mut rng, &mut engine).unwrap();
        assert_eq!(state_of(&agent), AggregationState::Still);
    }

    #[test]
    fn leave_without_tick_is_an_error() {
        let mut agent = seeker_at(0.0, 0.0);
        agent.mind = Mind::Aggregation(AggregationMind {
            state: AggregationState::Leave,
            last_left_tick: None,
            on_site: None,
        });
        let mut engine = RecordingEngine::new();
        let mut rng = SmallRng::seed_from_u64(6);
        let ctx = TickContext::new(1, None, &[]);
        let result = update(&mut agent, &ctx, &[], &never(), &mut rng, &mut engine);
        assert!(matches!(result, Err(AgentError::MissingLeaveTick(_))));
    }

    #[test]
    fn ecosystem_mind_is_rejected() {
        let mut agent = Agent::ecosystem(
            AgentId::new(9),
            AgentKind::Prey,
            Body::stationary(Vec2::ZERO),
            None,
            0,
        );
        let mut engine = RecordingEngine::new();
        let mut rng = SmallRng::seed_from_u64(7);
        let ctx = TickContext::new(1, None, &[]);
        let result = update(&mut agent, &ctx, &[], &never(), &mut rng, &mut engine);
        assert!(matches!(result, Err(AgentError::MindMismatch { .. })));
    }
}
