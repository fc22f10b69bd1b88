//! End-to-end behavior of the ecosystem tick cycle.
//!
//! Each test drives a small, hand-built world through `run_tick` or
//! `run_simulation` and checks an observable outcome: population counts,
//! recorded rows, or season changes.

#![allow(
    clippy::unwrap_used,
    clippy::float_cmp,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::missing_panics_doc
)]

use habitat_agents::{EnergyConfig, FeedingPolicy, MovementPolicy, RandomDeath};
use habitat_core::config::RunConfig;
use habitat_core::population::Population;
use habitat_core::recorder::{MemoryRecorder, NullRecorder, read_jsonl};
use habitat_core::runner::{NoOpCallback, SimulationEndReason, run_simulation};
use habitat_core::{
    PopulationReport, ScenarioKind, SimulationConfig, SimulationState, build_state, run_tick,
};
use habitat_types::{Agent, AgentKind, Bounds, PatchId, Season, Vec2};
use habitat_world::{EcosystemScheduler, GrassPatch, SeasonConfig};

const BOUNDS: Bounds = Bounds::new(200.0, 200.0);

/// A world with no random deaths, no reproduction, and stationary agents.
fn still_world(seed: u64) -> SimulationState {
    let mut state = SimulationState::new(BOUNDS, 30.0, seed);
    for behavior in [
        &mut state.behaviors.prey,
        &mut state.behaviors.predator,
        &mut state.behaviors.grass,
    ] {
        behavior.random_death = RandomDeath::Never;
        behavior.spontaneous_reproduction = None;
        behavior.movement = MovementPolicy::Stationary;
        if let Some(feeding) = behavior.feeding.as_mut() {
            feeding.reproduce_chance = 0.0;
        }
    }
    state
}

#[test]
fn certain_growth_spawns_grass_inside_the_patch() {
    let mut state = still_world(3);
    let center = Vec2::new(100.0, 100.0);
    state.patches = vec![GrassPatch {
        id: PatchId::new(0),
        center,
        spawn_radius: 10.0,
    }];
    let mut scheduler = EcosystemScheduler::new(SeasonConfig::default()).unwrap();
    scheduler.set_grow_rate(1.0);
    state.scheduler = Some(scheduler);

    let summary = run_tick(&mut state, &mut NullRecorder).unwrap();
    assert_eq!(summary.grass_grown, 1);
    assert_eq!(state.population.count_of(AgentKind::Grass), 1);
    let grass = state.population.iter().next().unwrap();
    assert!(grass.body.position.distance(center) <= 10.0 + 1e-9);
    assert_eq!(grass.born_at_tick, 1);
}

#[test]
fn unfed_prey_starves_after_twenty_timesteps() {
    // 5 energy at 0.25 per 6-tick timestep lasts 20 timesteps.
    let mut state = still_world(4);
    state.behaviors.prey.energy = Some(EnergyConfig {
        initial: 5.0,
        drain_per_timestep: 0.25,
        feed_gain: 30.0,
    });
    let prey = state.spawn(AgentKind::Prey, Vec2::new(40.0, 40.0));

    for _ in 0..119 {
        run_tick(&mut state, &mut NullRecorder).unwrap();
    }
    assert!(state.population.contains(prey));

    let summary = run_tick(&mut state, &mut NullRecorder).unwrap();
    assert_eq!(summary.tick, 120);
    assert_eq!(summary.starved, 1);
    assert!(!state.population.contains(prey));
}

#[test]
fn predator_waits_out_its_cooldown_between_meals() {
    let mut state = still_world(5);
    state.behaviors.predator.feeding = Some(FeedingPolicy {
        diet: vec![AgentKind::Prey],
        eat_distance: 12.0,
        cooldown_ticks: 30,
        reproduce_chance: 0.0,
        slowdown_per_neighbor: 0.0,
        fed_speed: None,
    });
    state.spawn(AgentKind::Predator, Vec2::new(100.0, 100.0));
    for offset in [4.0, -4.0, 8.0] {
        state.spawn(AgentKind::Prey, Vec2::new(100.0 + offset, 100.0));
    }

    let mut eaten: u32 = 0;
    for _ in 0..36 {
        let summary = run_tick(&mut state, &mut NullRecorder).unwrap();
        eaten = eaten.saturating_add(summary.eaten);
    }
    // Fed on tick 6; the cooldown holds through tick 36.
    assert_eq!(eaten, 1);
    assert_eq!(state.population.count_of(AgentKind::Prey), 2);

    for _ in 0..6 {
        let summary = run_tick(&mut state, &mut NullRecorder).unwrap();
        eaten = eaten.saturating_add(summary.eaten);
    }
    assert_eq!(eaten, 2);
    assert_eq!(state.population.count_of(AgentKind::Prey), 1);
}

#[test]
fn seasons_cycle_back_to_the_start() {
    let mut state = still_world(6);
    state.scheduler = Some(
        EcosystemScheduler::new(SeasonConfig {
            length: 5,
            ..SeasonConfig::default()
        })
        .unwrap(),
    );

    let mut changes = Vec::new();
    let mut seasons = Vec::new();
    for _ in 0..20 {
        let summary = run_tick(&mut state, &mut NullRecorder).unwrap();
        if let Some(season) = summary.season_changed {
            changes.push((summary.tick, season));
        }
        seasons.push(summary.season);
    }
    assert_eq!(
        changes,
        vec![
            (5, Season::Autumn),
            (10, Season::Winter),
            (15, Season::Spring),
            (20, Season::Summer),
        ]
    );
    assert_eq!(seasons[3], Some(Season::Summer));
    assert_eq!(seasons[4], Some(Season::Autumn));
}

#[test]
fn restored_agents_resume_identically() {
    let mut config = SimulationConfig::default();
    config.world.seed = 11;
    config.world.width = Some(200.0);
    config.world.height = Some(200.0);
    config.population.predators = Some(3);
    config.population.prey = Some(10);
    config.population.grass = Some(20);
    let mut original = build_state(&config).unwrap();
    for _ in 0..60 {
        run_tick(&mut original, &mut NullRecorder).unwrap();
    }

    let json = serde_json::to_string(&original.population.iter().collect::<Vec<_>>()).unwrap();
    let agents: Vec<Agent> = serde_json::from_str(&json).unwrap();
    let mut population = Population::new();
    for agent in agents {
        population.insert(agent);
    }
    population.advance_ids_to(original.population.peek_next_id());
    let mut restored = original.clone();
    restored.population = population;

    let mut first = MemoryRecorder::new();
    let mut second = MemoryRecorder::new();
    for _ in 0..120 {
        let a = run_tick(&mut original, &mut first).unwrap();
        let b = run_tick(&mut restored, &mut second).unwrap();
        assert_eq!(a, b);
    }
    assert_eq!(first.rows(), second.rows());
}

#[test]
fn default_ecosystem_run_produces_a_report() {
    let config = SimulationConfig {
        scenario: ScenarioKind::Ecosystem,
        ..SimulationConfig::default()
    };
    let mut state = build_state(&config).unwrap();
    let limits = RunConfig {
        max_ticks: 600,
        stop_on_extinction: true,
    };
    let mut recorder = MemoryRecorder::new();
    let result = run_simulation(&mut state, &limits, &mut recorder, &mut NoOpCallback).unwrap();
    assert!(result.total_ticks <= 600);
    if result.end_reason == SimulationEndReason::MaxTicksReached {
        assert_eq!(result.total_ticks, 600);
    }

    let report = PopulationReport::from_rows(recorder.rows(), 6, 60);
    assert!(!report.frames.is_empty());
    assert!(report.frames.iter().all(|f| f.frame % 6 == 0));
    assert!(
        report
            .frames
            .iter()
            .all(|f| f.season.is_none_or(|s| s == Season::Summer))
    );

    let mut buffer = Vec::new();
    recorder.write_jsonl(&mut buffer).unwrap();
    let rows = read_jsonl(buffer.as_slice()).unwrap();
    assert_eq!(rows, recorder.rows());
}

#[test]
fn flocking_birds_keep_wandering_without_sites() {
    let mut config = SimulationConfig {
        scenario: ScenarioKind::Flocking,
        ..SimulationConfig::default()
    };
    config.population.site_seekers = Some(20);
    let mut state = build_state(&config).unwrap();
    let start: Vec<Vec2> = state.population.iter().map(|a| a.body.position).collect();

    let mut recorder = MemoryRecorder::new();
    for _ in 0..30 {
        run_tick(&mut state, &mut recorder).unwrap();
    }
    assert_eq!(state.population.count_of(AgentKind::SiteSeeker), 20);
    assert_eq!(recorder.len(), 20 * 30);
    assert!(recorder.rows().iter().all(|row| {
        row.kind == AgentKind::SiteSeeker && row.state == "wandering" && row.on_site_id.is_none()
    }));
    let end: Vec<Vec2> = state.population.iter().map(|a| a.body.position).collect();
    assert!(start.iter().zip(&end).all(|(a, b)| a != b));
}
