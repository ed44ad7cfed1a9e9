use substrate_core::config::LifecycleConfig;
use substrate_core::graph::temporal::now_millis;
use substrate_core::graph::EntityStats;
use substrate_core::traits::Mechanism;
use substrate_core::{Entity, EntityKind, GraphState, StabilityState};
use substrate_lifecycle::{evaluate_transitions, register_entity, LifecycleMechanism};
use test_fixtures::ring_graph;

/// Five emergent entities with fixed, spread-out stats. Qualities are
/// 0.9, 0.7, 0.5, 0.3 and 0.01, so the best has z ≈ 1.35 and the worst
/// z ≈ −1.65 against the cohort.
fn spread_cohort() -> GraphState {
    let now = now_millis();
    let mut state = GraphState::new(now);
    for (i, level) in [0.9, 0.7, 0.5, 0.3, 0.0].iter().enumerate() {
        let mut e = Entity::new(format!("e{i}"), "e", EntityKind::Emergent, now);
        e.stats = EntityStats::uniform(*level);
        state.insert_entity(e).unwrap();
    }
    state
}

#[test]
fn dissolution_waits_for_minimum_age() {
    let mut state = spread_cohort();
    let config = LifecycleConfig::default();

    for cycle in 1..1_000u64 {
        state.begin_cycle(cycle, state.now, 1.0);
        evaluate_transitions(&mut state, &config).unwrap();
        let worst = state.entity("e4").unwrap();
        assert_ne!(worst.stability_state, StabilityState::Dissolved, "cycle {cycle}");
    }
    assert!(state.entity("e4").unwrap().low_quality_streak >= 20);

    state.begin_cycle(1_000, state.now, 1.0);
    let transitions = evaluate_transitions(&mut state, &config).unwrap();
    let worst = state.entity("e4").unwrap();
    assert_eq!(worst.stability_state, StabilityState::Dissolved);
    assert!(worst.temporal.valid_to.is_some());
    assert!(transitions
        .iter()
        .any(|t| t.entity_id == "e4" && t.to == StabilityState::Dissolved && t.age == 1_000));
}

#[test]
fn sustained_quality_promotes_then_matures() {
    let mut state = spread_cohort();
    let config = LifecycleConfig::default();

    for cycle in 1..=10u64 {
        state.begin_cycle(cycle, state.now, 1.0);
        evaluate_transitions(&mut state, &config).unwrap();
    }
    assert_eq!(
        state.entity("e0").unwrap().stability_state,
        StabilityState::Provisional
    );
    assert_eq!(state.signals.transitions.len(), 1);

    for cycle in 11..=99u64 {
        state.begin_cycle(cycle, state.now, 1.0);
        evaluate_transitions(&mut state, &config).unwrap();
    }
    assert_eq!(
        state.entity("e0").unwrap().stability_state,
        StabilityState::Provisional
    );
    state.begin_cycle(100, state.now, 1.0);
    evaluate_transitions(&mut state, &config).unwrap();
    assert_eq!(state.entity("e0").unwrap().stability_state, StabilityState::Mature);
    assert_eq!(state.entity("e2").unwrap().stability_state, StabilityState::Runtime);
}

#[test]
fn functional_entities_survive_ten_thousand_quiet_cycles() {
    let now = now_millis();
    let mut state = ring_graph(10, now);
    let config = LifecycleConfig::default();
    let functional = Entity::new("f", "core", EntityKind::Functional, now)
        .with_member("n0000", 1.0)
        .with_member("n0001", 1.0);
    register_entity(&mut state, functional, &config).unwrap();
    for i in 0..4 {
        let e = Entity::new(format!("e{i}"), "e", EntityKind::Emergent, now)
            .with_member(format!("n000{}", i + 2), 1.0);
        register_entity(&mut state, e, &config).unwrap();
    }

    let mut mechanism = LifecycleMechanism::new(config);
    for cycle in 1..=10_000u64 {
        state.begin_cycle(cycle, now, 1.0);
        mechanism.run(&mut state).unwrap();
        assert!(state.signals.transitions.iter().all(|t| t.entity_id != "f"));
    }
    let f = state.entity("f").unwrap();
    assert_eq!(f.stability_state, StabilityState::Runtime);
    assert_eq!(f.stats, EntityStats::uniform(0.5));
    assert!(f.temporal.valid_to.is_none());
    assert_eq!(f.frames_since_creation, 10_000);
}
