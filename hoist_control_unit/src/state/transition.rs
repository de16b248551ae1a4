//! Transition scheduler.
//!
//! Owns `current`, `next`, `goal` and the active edge, and is their only
//! writer. Every tick it commits a finished hop, searches the graph for the
//! next hop toward the goal and starts that edge's task. Goal changes while
//! a hop is in flight are re-routed without ever stopping at a vertex the
//! graph does not know:
//!
//! | Recomputed hop | Action |
//! |----------------|--------|
//! | unreachable | keep the hop, retry next tick |
//! | equals `next` | keep the hop |
//! | reachable from `next` | cancel, start `current -> hop` |
//! | otherwise | cancel, back out along `next -> current` |
//!
//! Disabling the robot abandons the pending hop and cancels its task;
//! `current` stays at the last committed vertex.

use hoist_common::superstructure::state::SuperstructureState;
use serde::Serialize;
use tracing::{debug, info};

use crate::graph::{EdgeId, StateGraph};
use crate::task::runner::{Actuators, TaskRunner};

/// The scheduler's authoritative position and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionState {
    /// Where the mechanism physically is.
    pub current: SuperstructureState,
    /// Where the in-flight edge is taking it.
    pub next: Option<SuperstructureState>,
    /// Where it should end up.
    pub goal: SuperstructureState,
    /// Always the edge `(current, next)` while a hop is in flight.
    pub active_edge: Option<EdgeId>,
}

impl Default for TransitionState {
    fn default() -> Self {
        Self {
            current: SuperstructureState::Start,
            next: None,
            goal: SuperstructureState::Stow,
            active_edge: None,
        }
    }
}

/// External conditions sampled once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerInputs {
    pub enabled: bool,
    pub characterization: bool,
    pub has_algae: bool,
}

pub struct TransitionScheduler {
    graph: StateGraph,
    runner: TaskRunner,
    state: TransitionState,
    stalled: bool,
}

impl TransitionScheduler {
    pub fn new(graph: StateGraph) -> Self {
        Self {
            graph,
            runner: TaskRunner::new(),
            state: TransitionState::default(),
            stalled: false,
        }
    }

    /// Run one period after the mechanisms have ticked.
    pub fn tick(&mut self, act: &mut impl Actuators, inputs: SchedulerInputs, dt: f64) {
        if inputs.characterization {
            if self.state.current != SuperstructureState::Characterization {
                info!("Entering {}", SuperstructureState::Characterization);
            }
            self.abandon(act);
            self.state.current = SuperstructureState::Characterization;
            return;
        }

        if !inputs.enabled {
            if self.state.next.is_some() {
                info!("Disabled, abandoning hop to {:?}", self.state.next);
            }
            self.abandon(act);
            return;
        }

        if !self.runner.is_running() {
            if let Some(next) = self.state.next.take() {
                info!("State {} -> {}", self.state.current, next);
                self.state.current = next;
                self.state.active_edge = None;
            }
            self.schedule_next(act, inputs.has_algae);
        }

        self.runner.tick(self.graph.tasks(), act, dt);
    }

    fn schedule_next(&mut self, act: &mut impl Actuators, has_algae: bool) {
        let TransitionState { current, goal, .. } = self.state;
        if current == goal {
            self.stalled = false;
            return;
        }
        match self.graph.shortest_hop(current, goal, has_algae) {
            Some(hop) if hop != current => {
                self.stalled = false;
                self.start_edge(current, hop, act);
            }
            _ => {
                if !self.stalled {
                    info!("No feasible path {current} -> {goal} (has_algae={has_algae}), waiting");
                }
                self.stalled = true;
            }
        }
    }

    fn start_edge(
        &mut self,
        from: SuperstructureState,
        to: SuperstructureState,
        act: &mut impl Actuators,
    ) {
        let Some(id) = self.graph.edge_id(from, to) else {
            return;
        };
        self.runner.cancel(act);
        self.runner.start(self.graph.edge_by_id(id).task);
        self.state.next = Some(to);
        self.state.active_edge = Some(id);
        debug!("Edge {from} -> {to} started");
    }

    fn abandon(&mut self, act: &mut impl Actuators) {
        self.runner.cancel(act);
        self.state.next = None;
        self.state.active_edge = None;
    }

    /// Record a new goal and re-route an in-flight hop if that helps.
    pub fn set_goal(
        &mut self,
        goal: SuperstructureState,
        act: &mut impl Actuators,
        has_algae: bool,
    ) {
        if goal == self.state.goal {
            return;
        }
        info!("Goal {} -> {}", self.state.goal, goal);
        self.state.goal = goal;
        self.stalled = false;

        let Some(next) = self.state.next else {
            return;
        };
        let current = self.state.current;
        let reverse_allowed = self
            .graph
            .edge(next, current)
            .is_some_and(|e| e.is_allowed(goal, has_algae));
        if !self.runner.is_running() || !reverse_allowed {
            return;
        }
        let Some(hop) = self.graph.shortest_hop(current, goal, has_algae) else {
            return;
        };

        if hop == next {
            debug!("Re-route: hop to {next} already serves {goal}");
        } else if hop != current && self.graph.edge(next, hop).is_some() {
            info!("Re-route: {current} -> {hop} instead of {next}");
            self.start_edge(current, hop, act);
        } else {
            info!("Re-route: backing out {next} -> {current}");
            self.start_edge(next, current, act);
            self.state.current = next;
        }
    }

    /// Restart from `START`, cancelling any in-flight hop.
    pub fn request_homing(&mut self, act: &mut impl Actuators) {
        info!("Homing requested");
        self.abandon(act);
        self.state.current = SuperstructureState::Start;
    }

    /// Restart from `AUTO_START`, cancelling any in-flight hop.
    pub fn auto_start(&mut self, act: &mut impl Actuators) {
        info!("Autonomous start");
        self.abandon(act);
        self.state.current = SuperstructureState::AutoStart;
    }

    /// Enter characterization immediately, ahead of the next tick.
    pub fn enter_characterization(&mut self, act: &mut impl Actuators) {
        self.abandon(act);
        self.state.current = SuperstructureState::Characterization;
    }

    pub fn state(&self) -> &TransitionState {
        &self.state
    }

    pub fn current(&self) -> SuperstructureState {
        self.state.current
    }

    pub fn next(&self) -> Option<SuperstructureState> {
        self.state.next
    }

    pub fn goal(&self) -> SuperstructureState {
        self.state.goal
    }

    pub fn active_edge(&self) -> Option<EdgeId> {
        self.state.active_edge
    }

    pub fn is_running(&self) -> bool {
        self.runner.is_running()
    }

    /// Settled at the goal with nothing in flight.
    pub fn at_goal(&self) -> bool {
        self.state.current == self.state.goal && self.state.next.is_none()
    }

    pub fn graph(&self) -> &StateGraph {
        &self.graph
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
