//! Superstructure state graph.
//!
//! Vertices are the named states; edges are tagged data pointing at a
//! pre-built task. The graph is built once from the rules in [`rules`] and
//! never mutated. Adjacency lists keep construction order, which the
//! breadth-first search relies on for deterministic tie-breaking.
//!
//! | Query | Cost |
//! |-------|------|
//! | `edge(from, to)` | O(1) table lookup |
//! | `outgoing(state)` | O(1), slice |
//! | `shortest_hop` | O(V + E), no allocation |

pub mod data;
pub mod rules;

use hoist_common::consts::STATE_COUNT;
use hoist_common::superstructure::config::SuperstructureConfig;
use hoist_common::superstructure::state::{AlgaeGate, SuperstructureState};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::task::{Task, TaskId, builder};
use data::StateTable;

/// Errors raised while building the graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// An edge leads into a state without a pose.
    #[error("State {0} has no pose but is the target of an edge")]
    MissingPose(SuperstructureState),

    /// A non-terminal state cannot be left.
    #[error("State {0} has no outgoing edges")]
    NoOutgoingEdges(SuperstructureState),
}

/// Index of an edge in construction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EdgeId(pub u16);

impl EdgeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A directed, gated transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: SuperstructureState,
    pub to: SuperstructureState,
    /// Only usable as the last hop into `to`.
    pub restricted: bool,
    pub gate: AlgaeGate,
    pub task: TaskId,
}

impl Edge {
    /// Feasibility filter used by the search and by re-routing.
    #[inline]
    pub fn is_allowed(&self, goal: SuperstructureState, has_algae: bool) -> bool {
        (!self.restricted || self.to == goal) && self.gate.permits(has_algae)
    }
}

/// The immutable state graph with its edge tasks.
#[derive(Debug, Clone)]
pub struct StateGraph {
    table: StateTable,
    edges: Vec<Edge>,
    tasks: Vec<Task>,
    adjacency: Vec<Vec<EdgeId>>,
    lookup: Vec<Option<EdgeId>>,
}

impl StateGraph {
    /// Build the graph and every edge task from `config`.
    pub fn build(config: &SuperstructureConfig) -> Result<Self, GraphError> {
        let table = StateTable::new(config);
        let defs = rules::superstructure_edges();

        let mut edges = Vec::with_capacity(defs.len());
        let mut tasks = Vec::with_capacity(defs.len());
        let mut adjacency = vec![Vec::new(); STATE_COUNT];
        let mut lookup = vec![None; STATE_COUNT * STATE_COUNT];

        for def in defs {
            let id = EdgeId(edges.len() as u16);
            let task = TaskId(tasks.len() as u16);
            tasks.push(builder::edge_task(def.from, def.to, &table, config)?);
            edges.push(Edge {
                from: def.from,
                to: def.to,
                restricted: def.restricted,
                gate: def.gate,
                task,
            });
            adjacency[def.from.index()].push(id);
            lookup[def.from.index() * STATE_COUNT + def.to.index()] = Some(id);
        }

        if let Some(stuck) = SuperstructureState::ALL
            .into_iter()
            .find(|s| adjacency[s.index()].is_empty())
        {
            return Err(GraphError::NoOutgoingEdges(stuck));
        }

        info!(
            "State graph built: {} states, {} edges",
            STATE_COUNT,
            edges.len()
        );
        Ok(Self {
            table,
            edges,
            tasks,
            adjacency,
            lookup,
        })
    }

    #[inline]
    pub fn edge_id(&self, from: SuperstructureState, to: SuperstructureState) -> Option<EdgeId> {
        self.lookup[from.index() * STATE_COUNT + to.index()]
    }

    pub fn edge(&self, from: SuperstructureState, to: SuperstructureState) -> Option<&Edge> {
        self.edge_id(from, to).map(|id| &self.edges[id.index()])
    }

    pub fn edge_by_id(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    /// Outgoing edges of `state` in construction order.
    pub fn outgoing(&self, state: SuperstructureState) -> impl Iterator<Item = &Edge> {
        self.adjacency[state.index()]
            .iter()
            .map(|id| &self.edges[id.index()])
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn task(&self, id: TaskId) -> &Task {
        &self.tasks[id.index()]
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn table(&self) -> &StateTable {
        &self.table
    }

    /// First hop on a shortest feasible path from `start` to `goal`.
    ///
    /// Returns `Some(start)` when already there and `None` when `goal` is
    /// unreachable under the current gating.
    pub fn shortest_hop(
        &self,
        start: SuperstructureState,
        goal: SuperstructureState,
        has_algae: bool,
    ) -> Option<SuperstructureState> {
        if start == goal {
            return Some(start);
        }

        const UNVISITED: u8 = u8::MAX;
        let mut parent = [UNVISITED; STATE_COUNT];
        let mut queue: heapless::Deque<u8, STATE_COUNT> = heapless::Deque::new();
        parent[start.index()] = start as u8;
        queue.push_back(start as u8).ok()?;

        let mut found = false;
        while let Some(raw) = queue.pop_front() {
            let state = SuperstructureState::from_u8(raw)?;
            if state == goal {
                found = true;
                break;
            }
            for edge in self.outgoing(state) {
                if !edge.is_allowed(goal, has_algae) || parent[edge.to.index()] != UNVISITED {
                    continue;
                }
                parent[edge.to.index()] = raw;
                queue.push_back(edge.to as u8).ok()?;
            }
        }
        if !found {
            return None;
        }

        let mut hop = goal;
        loop {
            let prev = SuperstructureState::from_u8(parent[hop.index()])?;
            if prev == start {
                return Some(hop);
            }
            hop = prev;
        }
    }

    /// Number of hops on a shortest feasible path, `None` if unreachable.
    pub fn distance(
        &self,
        start: SuperstructureState,
        goal: SuperstructureState,
        has_algae: bool,
    ) -> Option<usize> {
        let mut current = start;
        let mut hops = 0;
        while current != goal {
            current = self.shortest_hop(current, goal, has_algae)?;
            hops += 1;
            if hops > STATE_COUNT {
                return None;
            }
        }
        Some(hops)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
