//! Per-tick neighbor snapshot.
//!
//! Neighbor lists are computed once, at the start of a tick, by a
//! brute-force scan over every pair. Kills and births during the tick do not
//! change the snapshot; the tick driver filters killed neighbors out when it
//! hands a list to an agent.

use std::collections::BTreeMap;

use habitat_types::{AgentId, Neighbor};

use crate::population::Population;

/// Neighbor lists for every agent alive at tick start.
#[derive(Debug, Clone, Default)]
pub struct ProximitySnapshot {
    neighbors: BTreeMap<AgentId, Vec<Neighbor>>,
}

impl ProximitySnapshot {
    /// Scan `population` for every pair within `radius` (inclusive).
    ///
    /// Each list is in ascending neighbor id order and never contains the
    /// agent itself.
    pub fn build(population: &Population, radius: f64) -> Self {
        let agents: Vec<_> = population.iter().collect();
        let mut neighbors = BTreeMap::new();
        for agent in &agents {
            let list: Vec<Neighbor> = agents
                .iter()
                .filter(|other| other.id != agent.id)
                .filter_map(|other| {
                    let distance = agent.body.position.distance(other.body.position);
                    (distance <= radius).then_some(Neighbor {
                        id: other.id,
                        kind: other.kind,
                        distance,
                        position: other.body.position,
                        direction: other.body.direction,
                    })
                })
                .collect();
            neighbors.insert(agent.id, list);
        }
        Self { neighbors }
    }

    /// Neighbors of `id` at tick start; empty for unknown ids.
    pub fn neighbors_of(&self, id: AgentId) -> &[Neighbor] {
        self.neighbors
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
