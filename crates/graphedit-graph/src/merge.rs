//! Two-pick node merge.
//!
//! Arming the machine turns the next two single-node selections into merge
//! picks: the first picked node is folded into the second and then removed.

use graphedit_core::{AttributeField, ElementId};
use graphedit_events::MergeKind;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MergeState {
    #[default]
    Idle,
    ArmedWaitingFirst {
        kind: MergeKind,
    },
    ArmedWaitingSecond {
        kind: MergeKind,
        first: ElementId,
    },
    Merging {
        kind: MergeKind,
        removed: ElementId,
        kept: ElementId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    pub kind: MergeKind,
    pub removed: ElementId,
    pub kept: ElementId,
}

#[derive(Debug, Clone, Default)]
pub struct MergeMachine {
    state: MergeState,
}

impl MergeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &MergeState {
        &self.state
    }

    pub fn is_armed(&self) -> bool {
        !matches!(self.state, MergeState::Idle)
    }

    pub fn arm(&mut self, kind: MergeKind) {
        self.state = MergeState::ArmedWaitingFirst { kind };
    }

    pub fn disarm(&mut self) {
        self.state = MergeState::Idle;
    }

    /// Feeds the nodes of a selection change. Returns a plan once both picks
    /// are known; the caller executes it and then calls [`Self::finish`].
    pub fn on_selection(&mut self, nodes: &[ElementId]) -> Option<MergePlan> {
        if nodes.is_empty() || !self.is_armed() {
            return None;
        }
        let [picked] = nodes else {
            self.state = MergeState::Idle;
            return None;
        };

        match std::mem::take(&mut self.state) {
            MergeState::ArmedWaitingFirst { kind } => {
                self.state = MergeState::ArmedWaitingSecond {
                    kind,
                    first: picked.clone(),
                };
                None
            }
            MergeState::ArmedWaitingSecond { kind, first } if &first == picked => {
                self.state = MergeState::ArmedWaitingSecond { kind, first };
                None
            }
            MergeState::ArmedWaitingSecond { kind, first } => {
                let plan = MergePlan {
                    kind,
                    removed: first,
                    kept: picked.clone(),
                };
                self.state = MergeState::Merging {
                    kind,
                    removed: plan.removed.clone(),
                    kept: plan.kept.clone(),
                };
                Some(plan)
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    pub fn finish(&mut self) {
        self.state = MergeState::Idle;
    }

    /// Drops a first pick that was deleted before the second one arrived.
    pub fn forget(&mut self, id: &ElementId) {
        if let MergeState::ArmedWaitingSecond { kind, first } = &self.state
            && first == id
        {
            self.state = MergeState::ArmedWaitingFirst { kind: *kind };
        }
    }
}

/// Combines the attribute lists of the two merged nodes.
///
/// * `Full` keeps everything; a removed attribute whose key the kept node
///   already has is renamed with `merged_prefix`.
/// * `Left` keeps the kept node's value on collisions.
/// * `Right` keeps the removed node's value on collisions.
pub fn reconcile_attributes(
    kind: MergeKind,
    removed: &[AttributeField],
    kept: &[AttributeField],
    merged_prefix: &str,
) -> Vec<AttributeField> {
    let collides = |field: &AttributeField, others: &[AttributeField]| {
        others.iter().any(|other| other.key == field.key)
    };
    match kind {
        MergeKind::Full => {
            let mut merged = kept.to_vec();
            for field in removed {
                if !collides(field, &merged) {
                    merged.push(field.clone());
                    continue;
                }
                let mut renamed = field.clone();
                while collides(&renamed, &merged) {
                    renamed.key = format!("{merged_prefix}{}", renamed.key);
                    renamed.label = format!("{merged_prefix}{}", renamed.label);
                }
                merged.push(renamed);
            }
            merged
        }
        MergeKind::Left => kept
            .iter()
            .cloned()
            .chain(removed.iter().filter(|f| !collides(f, kept)).cloned())
            .collect(),
        MergeKind::Right => removed
            .iter()
            .cloned()
            .chain(kept.iter().filter(|f| !collides(f, removed)).cloned())
            .collect(),
    }
}
