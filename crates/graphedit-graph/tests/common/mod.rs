#![allow(dead_code)]

use graphedit_core::{
    AttributeField, ElementId, GraphData, Payload, Position, RawElement, StylesheetEntry,
};
use graphedit_events::LayoutAlgorithm;
use graphedit_graph::{Engine, EngineSettings, LayoutNode, RenderHost};
use std::collections::HashMap;

/// Host that records every call so tests can assert on batching and
/// stylesheet pushes.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub batches_started: usize,
    pub batches_ended: usize,
    pub stylesheets: Vec<Vec<StylesheetEntry>>,
    pub zooms: Vec<f64>,
    pub centered: Vec<Vec<ElementId>>,
    pub refreshes: usize,
    /// When set, layout requests are answered by stacking nodes on one column.
    pub runs_layout: bool,
    pub layouts: Vec<LayoutAlgorithm>,
}

impl RenderHost for RecordingHost {
    fn start_batch(&mut self) {
        self.batches_started += 1;
    }

    fn end_batch(&mut self) {
        self.batches_ended += 1;
    }

    fn apply_stylesheet(&mut self, entries: &[StylesheetEntry]) {
        self.stylesheets.push(entries.to_vec());
    }

    fn run_layout(
        &mut self,
        algorithm: LayoutAlgorithm,
        nodes: &[LayoutNode],
    ) -> Option<HashMap<ElementId, Position>> {
        self.layouts.push(algorithm);
        if !self.runs_layout {
            return None;
        }
        let mut ids: Vec<&ElementId> = nodes.iter().map(|node| &node.id).collect();
        ids.sort();
        Some(
            ids.into_iter()
                .enumerate()
                .map(|(i, id)| (id.clone(), Position::new(0.0, i as f64 * 10.0)))
                .collect(),
        )
    }

    fn zoom(&mut self, level: f64) {
        self.zooms.push(level);
    }

    fn center(&mut self, ids: &[ElementId]) {
        self.centered.push(ids.to_vec());
    }

    fn refresh(&mut self) {
        self.refreshes += 1;
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn engine() -> Engine<RecordingHost> {
    init_tracing();
    Engine::new(RecordingHost::default(), EngineSettings::default())
}

pub fn raw_node(id: &str, attributes: &[(&str, &str)]) -> RawElement {
    RawElement {
        id: Some(id.into()),
        payload: Payload {
            label: id.to_uppercase(),
            attributes: attributes
                .iter()
                .map(|(key, value)| AttributeField::new(*key, *value))
                .collect(),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn raw_child(id: &str, parent: &str) -> RawElement {
    RawElement {
        parent: Some(parent.into()),
        ..raw_node(id, &[])
    }
}

pub fn raw_group(id: &str) -> RawElement {
    RawElement {
        kind: Some(graphedit_core::ElementKind::Group),
        ..raw_node(id, &[])
    }
}

pub fn raw_edge(id: &str, source: &str, target: &str) -> RawElement {
    RawElement {
        id: Some(id.into()),
        source: Some(source.into()),
        target: Some(target.into()),
        ..Default::default()
    }
}

/// `team` groups `alice` and `bob`; `carol` stands alone. Alice knows both
/// of the others.
pub fn team_data() -> GraphData {
    GraphData {
        nodes: vec![
            raw_group("team"),
            RawElement {
                parent: Some("team".into()),
                ..raw_node("alice", &[("role", "dev"), ("age", "41")])
            },
            RawElement {
                parent: Some("team".into()),
                ..raw_node("bob", &[("role", "dev"), ("age", "29")])
            },
            raw_node("carol", &[("role", "ops"), ("age", "35")]),
        ],
        edges: vec![
            raw_edge("alice-bob", "alice", "bob"),
            raw_edge("alice-carol", "alice", "carol"),
        ],
    }
}

pub fn id(value: &str) -> ElementId {
    ElementId::from(value)
}
