//! Integration test: whole-graph search properties.
//!
//! Checks every ordered pair of states under both algae conditions against
//! an independent breadth-first search over the raw edge list.

use std::collections::VecDeque;

use hoist_common::consts::STATE_COUNT;
use hoist_common::superstructure::config::SuperstructureConfig;
use hoist_common::superstructure::state::SuperstructureState as S;
use hoist_control_unit::graph::StateGraph;

fn graph() -> StateGraph {
    StateGraph::build(&SuperstructureConfig::default()).unwrap()
}

/// Reference hop count from `start` to `goal`.
fn reference_distance(g: &StateGraph, start: S, goal: S, has_algae: bool) -> Option<usize> {
    let mut dist = [None; STATE_COUNT];
    dist[start.index()] = Some(0usize);
    let mut queue = VecDeque::from([start]);
    while let Some(state) = queue.pop_front() {
        let d = dist[state.index()]?;
        if state == goal {
            return Some(d);
        }
        for e in g.edges().iter().filter(|e| e.from == state) {
            if e.is_allowed(goal, has_algae) && dist[e.to.index()].is_none() {
                dist[e.to.index()] = Some(d + 1);
                queue.push_back(e.to);
            }
        }
    }
    None
}

#[test]
fn hops_follow_allowed_edges_along_shortest_paths() {
    let g = graph();
    for has_algae in [false, true] {
        for start in S::ALL {
            for goal in S::ALL {
                let expected = reference_distance(&g, start, goal, has_algae);
                let hop = g.shortest_hop(start, goal, has_algae);
                assert_eq!(
                    hop.is_some(),
                    expected.is_some(),
                    "{start} -> {goal} (algae={has_algae})"
                );
                let Some(expected) = expected else { continue };

                let mut current = start;
                let mut hops = 0;
                while current != goal {
                    let next = g.shortest_hop(current, goal, has_algae).unwrap();
                    let edge = g
                        .edge(current, next)
                        .unwrap_or_else(|| panic!("{current} -> {next} is not an edge"));
                    assert!(edge.is_allowed(goal, has_algae), "{current} -> {next}");
                    current = next;
                    hops += 1;
                    assert!(hops <= expected, "{start} -> {goal} overshot");
                }
                assert_eq!(hops, expected, "{start} -> {goal} (algae={has_algae})");
                assert_eq!(g.distance(start, goal, has_algae), Some(expected));
            }
        }
    }
}

#[test]
fn already_there_returns_start() {
    let g = graph();
    for s in S::ALL {
        assert_eq!(g.shortest_hop(s, s, false), Some(s));
        assert_eq!(g.shortest_hop(s, s, true), Some(s));
        assert_eq!(g.distance(s, s, true), Some(0));
    }
}

#[test]
fn everything_recovers_to_stow_without_algae() {
    let g = graph();
    for s in S::ALL {
        assert!(
            g.shortest_hop(s, S::Stow, false).is_some(),
            "{s} cannot get back to STOW"
        );
    }
}

#[test]
fn pseudo_states_are_never_targets() {
    let g = graph();
    for pseudo in [S::Start, S::AutoStart, S::Characterization] {
        for has_algae in [false, true] {
            assert_eq!(g.shortest_hop(S::Stow, pseudo, has_algae), None);
        }
    }
}

#[test]
fn restricted_edge_is_final_hop_only() {
    let g = graph();
    assert_eq!(
        g.shortest_hop(S::PostPreProcessor, S::Processed, true),
        Some(S::Processed)
    );
    // PROCESSED is a dead end on the way anywhere else.
    for goal in S::ALL {
        if goal == S::Processed || goal == S::PostPreProcessor {
            continue;
        }
        assert_ne!(g.shortest_hop(S::PostPreProcessor, goal, true), Some(S::Processed));
    }
}

#[test]
fn algae_gating_splits_reachability() {
    let g = graph();
    assert_eq!(g.shortest_hop(S::Stow, S::AlgaeStow, false), None);
    assert_eq!(g.shortest_hop(S::Stow, S::AlgaeStow, true), Some(S::AlgaeStow));
    assert_eq!(g.shortest_hop(S::AlgaeStow, S::Stow, true), None);
    assert_eq!(g.shortest_hop(S::AlgaeStow, S::Stow, false), Some(S::Stow));
}

#[test]
fn construction_is_deterministic() {
    let a = graph();
    let b = graph();
    assert_eq!(a.edges(), b.edges());
    for has_algae in [false, true] {
        for start in S::ALL {
            for goal in S::ALL {
                assert_eq!(
                    a.shortest_hop(start, goal, has_algae),
                    b.shortest_hop(start, goal, has_algae)
                );
            }
        }
    }
}
