//! Declarative edge rules.
//!
//! Edges are produced in a fixed order: dense groups, paired actions,
//! recovery edges, reversed-pivot edges, then the hand-listed extras. When
//! two rules produce the same ordered pair the first one wins; later
//! duplicates are dropped with a debug log. The resulting order is also the
//! breadth-first expansion order, which fixes tie-breaking between
//! equal-length paths.

use hoist_common::consts::STATE_COUNT;
use hoist_common::superstructure::state::{AlgaeGate, SuperstructureState};
use tracing::debug;

use SuperstructureState as S;

/// States free to move between while no algae is held.
pub const FREE_NO_ALGAE: [SuperstructureState; 9] = [
    S::Stow,
    S::GoodbyeCoral,
    S::L1Coral,
    S::L2Coral,
    S::L3Coral,
    S::L4Coral,
    S::AlgaeFloorIntake,
    S::AlgaeL2Intake,
    S::AlgaeL3Intake,
];

/// States free to move between while algae is held.
pub const FREE_ALGAE: [SuperstructureState; 8] = [
    S::AlgaeStow,
    S::AlgaeStowIntake,
    S::AlgaeL2Intake,
    S::AlgaeL3Intake,
    S::Unreversed,
    S::PostPreProcessor,
    S::PreToss,
    S::PreThrown,
];

/// Algae intake postures.
pub const ALGAE_INTAKE: [SuperstructureState; 4] = [
    S::AlgaeStowIntake,
    S::AlgaeFloorIntake,
    S::AlgaeL2Intake,
    S::AlgaeL3Intake,
];

/// States that may be left without algae after losing or scoring it.
pub const RECOVERABLE: [SuperstructureState; 8] = [
    S::AlgaeStow,
    S::PostPreProcessor,
    S::Processed,
    S::Unreversed,
    S::PreThrown,
    S::PreToss,
    S::Toss,
    S::Thrown,
];

/// Scoring postures with the pivot past the pass-through point. Their
/// eject states hang off them through [`PAIRED`] only.
pub const REVERSED: [SuperstructureState; 4] = [
    S::L1CoralReversed,
    S::L2CoralReversed,
    S::L3CoralReversed,
    S::L4CoralReversed,
];

/// Posture / action pairs, linked in both directions.
pub const PAIRED: [(SuperstructureState, SuperstructureState); 13] = [
    (S::Stow, S::Intake),
    (S::GoodbyeCoral, S::GoodbyeCoralEject),
    (S::L1Coral, S::L1CoralEject),
    (S::L2Coral, S::L2CoralEject),
    (S::L3Coral, S::L3CoralEject),
    (S::L4Coral, S::L4CoralEject),
    (S::L1CoralReversed, S::L1CoralReversedEject),
    (S::L2CoralReversed, S::L2CoralReversedEject),
    (S::L3CoralReversed, S::L3CoralReversedEject),
    (S::L4CoralReversed, S::L4CoralReversedEject),
    (S::AlgaeStow, S::PostPreProcessor),
    (S::PreThrown, S::Thrown),
    (S::PreToss, S::Toss),
];

/// Entry edges out of the pseudo-states.
pub const PSEUDO_EXITS: [(SuperstructureState, SuperstructureState); 3] = [
    (S::Start, S::Stow),
    (S::Characterization, S::Stow),
    (S::AutoStart, S::Stow),
];

/// One edge before its task is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeDef {
    pub from: SuperstructureState,
    pub to: SuperstructureState,
    /// Usable only as the final hop into `to`.
    pub restricted: bool,
    pub gate: AlgaeGate,
}

/// Ordered, duplicate-free edge list.
#[derive(Debug)]
pub struct EdgeRules {
    defs: Vec<EdgeDef>,
    present: [[bool; STATE_COUNT]; STATE_COUNT],
}

impl Default for EdgeRules {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeRules {
    pub fn new() -> Self {
        Self {
            defs: Vec::new(),
            present: [[false; STATE_COUNT]; STATE_COUNT],
        }
    }

    /// Add an edge unless the ordered pair already exists.
    pub fn add(
        &mut self,
        from: SuperstructureState,
        to: SuperstructureState,
        restricted: bool,
        gate: AlgaeGate,
    ) {
        if from == to {
            return;
        }
        let slot = &mut self.present[from.index()][to.index()];
        if *slot {
            debug!("Edge {from} -> {to} already present, keeping first");
            return;
        }
        *slot = true;
        self.defs.push(EdgeDef {
            from,
            to,
            restricted,
            gate,
        });
    }

    /// Every ordered pair within `group`; edges leaving an intake
    /// posture carry `intake_gate`.
    pub fn dense_group(&mut self, group: &[SuperstructureState], intake_gate: AlgaeGate) {
        for &from in group {
            let gate = if ALGAE_INTAKE.contains(&from) {
                intake_gate
            } else {
                AlgaeGate::None
            };
            for &to in group {
                self.add(from, to, false, gate);
            }
        }
    }

    /// Both directions of every pair, ungated.
    pub fn pairs(&mut self, pairs: &[(SuperstructureState, SuperstructureState)]) {
        for &(a, b) in pairs {
            self.add(a, b, false, AlgaeGate::None);
            self.add(b, a, false, AlgaeGate::None);
        }
    }

    pub fn into_defs(self) -> Vec<EdgeDef> {
        self.defs
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// The complete superstructure edge list in construction order.
pub fn superstructure_edges() -> Vec<EdgeDef> {
    let mut rules = EdgeRules::new();

    for (from, to) in PSEUDO_EXITS {
        rules.add(from, to, false, AlgaeGate::None);
    }

    rules.dense_group(&FREE_NO_ALGAE, AlgaeGate::NoAlgae);
    rules.dense_group(&FREE_ALGAE, AlgaeGate::Algae);
    rules.dense_group(&ALGAE_INTAKE, AlgaeGate::None);

    rules.pairs(&PAIRED);

    for from in RECOVERABLE {
        for to in FREE_NO_ALGAE {
            rules.add(from, to, false, AlgaeGate::NoAlgae);
        }
    }

    for from in REVERSED {
        rules.add(from, S::Unreversed, false, AlgaeGate::None);
        rules.add(S::Unreversed, from, false, AlgaeGate::None);
        for to in REVERSED {
            rules.add(from, to, false, AlgaeGate::None);
        }
    }

    rules.add(S::PostPreProcessor, S::Processed, true, AlgaeGate::None);
    rules.add(S::Processed, S::PostPreProcessor, false, AlgaeGate::Algae);
    rules.add(S::Thrown, S::AlgaeStow, false, AlgaeGate::Algae);
    rules.add(S::PreToss, S::AlgaeStow, false, AlgaeGate::Algae);
    rules.add(S::Stow, S::AlgaeStow, false, AlgaeGate::Algae);
    rules.add(S::AlgaeStow, S::Stow, false, AlgaeGate::NoAlgae);

    rules.into_defs()
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn find(defs: &[EdgeDef], from: SuperstructureState, to: SuperstructureState) -> Option<EdgeDef> {
        defs.iter().copied().find(|e| e.from == from && e.to == to)
    }

    #[test]
    fn no_duplicate_pairs_or_self_loops() {
        let defs = superstructure_edges();
        let mut seen = std::collections::HashSet::new();
        for e in &defs {
            assert_ne!(e.from, e.to);
            assert!(seen.insert((e.from, e.to)), "{} -> {}", e.from, e.to);
        }
    }

    #[test]
    fn first_writer_wins() {
        let mut rules = EdgeRules::new();
        rules.add(S::Stow, S::L1Coral, false, AlgaeGate::NoAlgae);
        rules.add(S::Stow, S::L1Coral, true, AlgaeGate::Algae);
        let defs = rules.into_defs();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].gate, AlgaeGate::NoAlgae);
        assert!(!defs[0].restricted);
    }

    #[test]
    fn intake_sources_are_gated() {
        let defs = superstructure_edges();
        let e = find(&defs, S::AlgaeFloorIntake, S::Stow).unwrap();
        assert_eq!(e.gate, AlgaeGate::NoAlgae);
        let e = find(&defs, S::Stow, S::AlgaeFloorIntake).unwrap();
        assert_eq!(e.gate, AlgaeGate::None);
        let e = find(&defs, S::AlgaeStowIntake, S::AlgaeStow).unwrap();
        assert_eq!(e.gate, AlgaeGate::Algae);
        // Already written by the no-algae group.
        let e = find(&defs, S::AlgaeL2Intake, S::AlgaeL3Intake).unwrap();
        assert_eq!(e.gate, AlgaeGate::NoAlgae);
    }

    #[test]
    fn recovery_edges_are_one_way() {
        let defs = superstructure_edges();
        let e = find(&defs, S::Thrown, S::L2Coral).unwrap();
        assert_eq!(e.gate, AlgaeGate::NoAlgae);
        assert!(find(&defs, S::L2Coral, S::Thrown).is_none());
    }

    #[test]
    fn reversed_states_link_through_sentinel_only() {
        let defs = superstructure_edges();
        for r in REVERSED {
            assert!(find(&defs, r, S::Unreversed).is_some());
            assert!(find(&defs, S::Unreversed, r).is_some());
            assert!(find(&defs, S::Stow, r).is_none());
            assert!(find(&defs, r, S::Stow).is_none());
        }
        assert!(find(&defs, S::L1CoralReversed, S::L4CoralReversed).is_some());
    }

    #[test]
    fn reversed_ejects_hang_off_their_posture() {
        let defs = superstructure_edges();
        let ejects = [
            (S::L1CoralReversed, S::L1CoralReversedEject),
            (S::L2CoralReversed, S::L2CoralReversedEject),
            (S::L3CoralReversed, S::L3CoralReversedEject),
            (S::L4CoralReversed, S::L4CoralReversedEject),
        ];
        for (posture, eject) in ejects {
            let linked: Vec<_> = defs
                .iter()
                .filter(|e| e.from == eject || e.to == eject)
                .map(|e| if e.from == eject { e.to } else { e.from })
                .collect();
            assert_eq!(linked, vec![posture, posture], "{eject}");
        }
    }

    #[test]
    fn processor_entry_is_restricted() {
        let defs = superstructure_edges();
        assert!(find(&defs, S::PostPreProcessor, S::Processed).unwrap().restricted);
        let back = find(&defs, S::Processed, S::PostPreProcessor).unwrap();
        assert!(!back.restricted);
        assert_eq!(back.gate, AlgaeGate::Algae);
    }

    #[test]
    fn pseudo_states_exit_only_to_stow() {
        let defs = superstructure_edges();
        for pseudo in [S::Start, S::AutoStart, S::Characterization] {
            let out: Vec<_> = defs.iter().filter(|e| e.from == pseudo).collect();
            assert_eq!(out.len(), 1);
            assert_eq!(out[0].to, S::Stow);
            assert!(defs.iter().all(|e| e.to != pseudo));
        }
    }
}
