//! Graph builders.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use substrate_core::{Entity, EntityKind, GraphState, Link, LinkKind, Node, NodeContent};

const EMBEDDING_DIMS: usize = 8;

pub fn concept_node(id: &str, energy: f64, now: DateTime<Utc>) -> Node {
    Node::new(
        id,
        id,
        NodeContent::Concept {
            definition: format!("definition of {id}"),
        },
        now,
    )
    .with_energy(energy)
}

fn content_for(i: usize, now: DateTime<Utc>) -> NodeContent {
    match i % 4 {
        0 => NodeContent::Concept {
            definition: format!("concept {i}"),
        },
        1 => NodeContent::Memory {
            occurred_at: now,
            participants: vec!["agent".to_string()],
        },
        2 => NodeContent::Principle {
            principle_statement: format!("principle {i}"),
            why_it_matters: "it holds".to_string(),
        },
        _ => NodeContent::Realization {
            what_i_realized: format!("realization {i}"),
            context_when_discovered: "testing".to_string(),
        },
    }
}

pub fn node_id(i: usize) -> String {
    format!("n{i:04}")
}

/// `n` concept nodes, `n{i} → n{i+1}` wrapping around.
pub fn ring_graph(n: usize, now: DateTime<Utc>) -> GraphState {
    let mut state = GraphState::new(now);
    for i in 0..n {
        state
            .insert_node(concept_node(&node_id(i), 0.0, now))
            .expect("fresh node");
    }
    if n > 1 {
        for i in 0..n {
            let link = Link::new(node_id(i), node_id((i + 1) % n), LinkKind::relates_to(), 0.5, now);
            state.insert_link(link).expect("fresh link");
        }
    }
    state
}

/// A connected, deterministic graph: a ring backbone plus random chords
/// until `links` exist. Energies are uniform in [0, 1) with a handful of
/// nodes lifted well above their peers so some of them start active.
pub fn seeded_graph(nodes: usize, links: usize, seed: u64, now: DateTime<Utc>) -> GraphState {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut state = GraphState::new(now);
    for i in 0..nodes {
        let mut energy: f64 = rng.gen_range(0.0..1.0);
        if i % 20 == 0 {
            energy += 2.0;
        }
        let embedding: Vec<f32> = (0..EMBEDDING_DIMS).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let node = Node::new(node_id(i), format!("node {i}"), content_for(i, now), now)
            .with_energy(energy)
            .with_embedding(embedding);
        state.insert_node(node).expect("fresh node");
    }
    if nodes < 2 {
        return state;
    }

    let mut added = 0;
    for i in 0..nodes.min(links) {
        let link = Link::new(node_id(i), node_id((i + 1) % nodes), LinkKind::relates_to(), 0.5, now);
        state.insert_link(link).expect("fresh link");
        added += 1;
    }
    let mut attempts = 0;
    while added < links && attempts < links * 20 {
        attempts += 1;
        let s = rng.gen_range(0..nodes);
        let t = rng.gen_range(0..nodes);
        if s == t {
            continue;
        }
        let id = Link::logical_id(&node_id(s), &node_id(t), "relates_to");
        if state.link(&id).is_some() {
            continue;
        }
        let affect: f64 = rng.gen_range(0.0..1.0);
        let link = Link::new(node_id(s), node_id(t), LinkKind::relates_to(), affect, now);
        state.insert_link(link).expect("fresh link");
        added += 1;
    }
    state
}

/// `n` nodes whose links have all been expired.
pub fn isolated_graph(n: usize, now: DateTime<Utc>) -> GraphState {
    let mut state = ring_graph(n, now);
    let ids: Vec<String> = state.links().map(|l| l.id.clone()).collect();
    for id in ids {
        state.expire_link(&id, now).expect("live link");
    }
    state.take_retired();
    state
}

/// Add `emergent` emergent entities and `functional` functional ones, each
/// over a contiguous run of five nodes.
pub fn add_entities(state: &mut GraphState, emergent: usize, functional: usize) {
    let now = state.now;
    let node_ids: Vec<String> = state.nodes().map(|n| n.id.clone()).collect();
    if node_ids.is_empty() {
        return;
    }
    let specs = (0..emergent)
        .map(|i| (format!("emergent-{i}"), EntityKind::Emergent))
        .chain((0..functional).map(|i| (format!("functional-{i}"), EntityKind::Functional)));
    for (k, (id, kind)) in specs.enumerate() {
        let mut entity = Entity::new(id.clone(), id, kind, now);
        for j in 0..5 {
            let member = &node_ids[(k * 5 + j) % node_ids.len()];
            entity.add_member(member.clone(), 1.0 - j as f64 * 0.1);
        }
        state.insert_entity(entity).expect("fresh entity");
    }
}
