//! Movement policies applied after each agent's state update.
//!
//! Movement is secondary to the state machines: it only reads the neighbor
//! snapshot and the agent's own energy, and writes the agent's body. Frozen
//! bodies never move. Positions wrap toroidally at the world bounds.

use habitat_types::{Agent, Body, Bounds, EnergyLedger, Neighbor, Vec2};
use rand::Rng;

use crate::config::{FeedingPolicy, MovementPolicy};
use crate::energy::speed_for;

/// Move `agent` one tick under `policy`.
///
/// `neighbors` must already exclude agents killed this tick. `diet` selects
/// seek targets and is ignored by the other policies.
pub fn step(
    agent: &mut Agent,
    policy: &MovementPolicy,
    neighbors: &[Neighbor],
    diet: Option<&FeedingPolicy>,
    bounds: Bounds,
    rng: &mut impl Rng,
) {
    if !agent.body.moving {
        return;
    }
    match *policy {
        MovementPolicy::Stationary => {
            agent.body.freeze_movement();
            return;
        }
        MovementPolicy::Wander {
            jitter_chance,
            jitter,
            ..
        } => {
            if rng.random::<f64>() < jitter_chance {
                perturb(&mut agent.body, jitter, rng);
            }
        }
        MovementPolicy::Seek {
            pull,
            jitter_chance,
            jitter,
            speed_floor,
            energy_scale,
        } => {
            if let Some(energy) = agent.energy() {
                let ledger = EnergyLedger::new(energy);
                agent.body.speed = speed_for(&ledger, speed_floor, energy_scale);
            }
            match nearest_target(neighbors, diet) {
                Some(target) => {
                    let toward = (target.position - agent.body.position).normalize();
                    agent.body.direction = (agent.body.direction + toward * pull).normalize();
                }
                None => {
                    if rng.random::<f64>() < jitter_chance {
                        perturb(&mut agent.body, jitter, rng);
                    }
                }
            }
        }
        MovementPolicy::Flock {
            velocity,
            alignment,
            cohesion,
            separation,
        } => {
            agent.body.speed = velocity;
            let flock: Vec<&Neighbor> = neighbors.iter().filter(|n| n.kind == agent.kind).collect();
            agent.body.direction = flock_heading(
                &agent.body,
                &flock,
                FlockWeights {
                    alignment,
                    cohesion,
                    separation,
                },
            );
        }
    }
    let body = &mut agent.body;
    body.position = bounds.wrap(body.position + body.direction * body.speed);
}

/// Nudge the heading by up to `jitter` per axis and renormalize.
fn perturb(body: &mut Body, jitter: f64, rng: &mut impl Rng) {
    let dx = jitter * 2.0_f64.mul_add(rng.random::<f64>(), -1.0);
    let dy = jitter * 2.0_f64.mul_add(rng.random::<f64>(), -1.0);
    body.direction = (body.direction + Vec2::new(dx, dy)).normalize();
}

/// The closest neighbor the diet allows eating.
fn nearest_target<'a>(
    neighbors: &'a [Neighbor],
    diet: Option<&FeedingPolicy>,
) -> Option<&'a Neighbor> {
    let diet = diet?;
    neighbors
        .iter()
        .filter(|n| diet.can_eat(n.kind))
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

struct FlockWeights {
    alignment: f64,
    cohesion: f64,
    separation: f64,
}

/// Boids heading: own direction plus weighted alignment, separation and
/// cohesion terms, normalized.
fn flock_heading(body: &Body, flock: &[&Neighbor], weights: FlockWeights) -> Vec2 {
    if flock.is_empty() {
        return body.direction;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = flock.len() as f64;

    let mut directions = body.direction;
    let mut apart = Vec2::ZERO;
    let mut positions = Vec2::ZERO;
    for other in flock {
        directions += other.direction;
        apart += body.position - other.position;
        positions += other.position;
    }

    let align = (directions / count).normalize();
    let separate = (apart / count).normalize();
    let cohere = (positions / count - body.position) - body.direction;

    (body.direction + align * weights.alignment + separate * weights.separation
        + cohere * weights.cohesion)
        .normalize()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use habitat_types::{AgentId, AgentKind};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    const BOUNDS: Bounds = Bounds::new(100.0, 100.0);

    fn neighbor(id: u64, kind: AgentKind, position: Vec2, distance: f64) -> Neighbor {
        Neighbor {
            id: AgentId::new(id),
            kind,
            distance,
            position,
            direction: Vec2::new(0.0, 1.0),
        }
    }

    #[test]
    fn frozen_body_does_not_move() {
        let mut agent = Agent::seeker(
            AgentId::new(1),
            Body::new(Vec2::new(10.0, 10.0), Vec2::new(1.0, 0.0), 1.0),
            0,
        );
        agent.body.freeze_movement();
        let mut rng = SmallRng::seed_from_u64(1);
        step(&mut agent, &MovementPolicy::wander(), &[], None, BOUNDS, &mut rng);
        assert_eq!(agent.body.position, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn wander_without_jitter_moves_straight_and_wraps() {
        let mut agent = Agent::seeker(
            AgentId::new(1),
            Body::new(Vec2::new(99.5, 50.0), Vec2::new(1.0, 0.0), 1.0),
            0,
        );
        let policy = MovementPolicy::Wander {
            speed: 1.0,
            jitter_chance: 0.0,
            jitter: 0.35,
        };
        let mut rng = SmallRng::seed_from_u64(2);
        step(&mut agent, &policy, &[], None, BOUNDS, &mut rng);
        assert!((agent.body.position.x - 0.5).abs() < 1e-9);
        assert!((agent.body.position.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn wander_keeps_the_body_speed() {
        let mut agent = Agent::seeker(
            AgentId::new(1),
            Body::new(Vec2::new(10.0, 50.0), Vec2::new(1.0, 0.0), 0.25),
            0,
        );
        let policy = MovementPolicy::Wander {
            speed: 1.0,
            jitter_chance: 0.0,
            jitter: 0.35,
        };
        let mut rng = SmallRng::seed_from_u64(5);
        step(&mut agent, &policy, &[], None, BOUNDS, &mut rng);
        assert_eq!(agent.body.speed, 0.25);
        assert!((agent.body.position.x - 10.25).abs() < 1e-9);
    }

    #[test]
    fn jitter_keeps_heading_normalized() {
        let mut agent = Agent::seeker(
            AgentId::new(1),
            Body::new(Vec2::new(50.0, 50.0), Vec2::new(1.0, 0.0), 1.0),
            0,
        );
        let policy = MovementPolicy::Wander {
            speed: 1.0,
            jitter_chance: 1.0,
            jitter: 0.35,
        };
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..20 {
            step(&mut agent, &policy, &[], None, BOUNDS, &mut rng);
            assert!((agent.body.direction.length() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn seek_turns_toward_nearest_edible_neighbor() {
        let mut agent = Agent::ecosystem(
            AgentId::new(1),
            AgentKind::Predator,
            Body::new(Vec2::new(50.0, 50.0), Vec2::new(1.0, 0.0), 1.0),
            Some(EnergyLedger::new(30.0)),
            0,
        );
        let diet = FeedingPolicy {
            diet: vec![AgentKind::Prey],
            eat_distance: 12.0,
            cooldown_ticks: 20,
            reproduce_chance: 0.0,
            slowdown_per_neighbor: 0.0,
            fed_speed: None,
        };
        let neighbors = [
            neighbor(2, AgentKind::Predator, Vec2::new(50.0, 45.0), 5.0),
            neighbor(3, AgentKind::Prey, Vec2::new(50.0, 70.0), 20.0),
        ];
        let mut rng = SmallRng::seed_from_u64(4);
        step(&mut agent, &MovementPolicy::seek(), &neighbors, Some(&diet), BOUNDS, &mut rng);

        assert!(agent.body.direction.y > 0.0);
        assert_eq!(agent.body.speed, 0.7);
    }

    #[test]
    fn stationary_policy_freezes() {
        let mut agent = Agent::ecosystem(
            AgentId::new(1),
            AgentKind::Grass,
            Body::new(Vec2::new(5.0, 5.0), Vec2::new(1.0, 0.0), 1.0),
            None,
            0,
        );
        let mut rng = SmallRng::seed_from_u64(5);
        step(&mut agent, &MovementPolicy::Stationary, &[], None, BOUNDS, &mut rng);
        assert!(!agent.body.moving);
        assert_eq!(agent.body.position, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn flock_aligns_with_neighbors() {
        let mut agent = Agent::seeker(
            AgentId::new(1),
            Body::new(Vec2::new(50.0, 50.0), Vec2::new(1.0, 0.0), 1.0),
            0,
        );
        let neighbors = [
            neighbor(2, AgentKind::SiteSeeker, Vec2::new(60.0, 50.0), 10.0),
            neighbor(3, AgentKind::SiteSeeker, Vec2::new(40.0, 50.0), 10.0),
        ];
        let mut rng = SmallRng::seed_from_u64(6);
        step(&mut agent, &MovementPolicy::flock(), &neighbors, None, BOUNDS, &mut rng);
        assert!(agent.body.direction.y > 0.0);
        assert!((agent.body.direction.length() - 1.0).abs() < 1e-9);
    }
}
