//! UI-facing projections of element state.
//!
//! The selection and hidden sets are each exposed as four id-keyed maps, one
//! per category. They are derived from the `selected` / `hidden` flags on the
//! elements and are never edited directly: handlers report the ids they
//! touched and [`ElementMaps::patch`] brings the maps back in line.

use crate::document::GraphDocument;
use graphedit_core::{Category, Element, ElementId, ElementKind, Payload};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Read-only snapshot of one element for panels and inspectors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementView {
    pub id: ElementId,
    pub kind: ElementKind,
    pub label: String,
    pub payload: Payload,
    pub classes: Vec<String>,
    pub parent: Option<ElementId>,
    pub source: Option<ElementId>,
    pub target: Option<ElementId>,
    pub child_count: usize,
    pub collapsed: bool,
}

impl ElementView {
    pub fn from_element(doc: &GraphDocument, element: &Element) -> Self {
        let child_count = match element.kind {
            ElementKind::Group => doc.child_count(&element.id),
            ElementKind::EdgeGroup => doc.bundle_members(&element.id).len(),
            _ => 0,
        };
        Self {
            id: element.id.clone(),
            kind: element.kind,
            label: element.display_label.clone(),
            payload: element.payload.clone(),
            classes: element.classes.clone(),
            parent: element.parent.clone(),
            source: element.source.clone(),
            target: element.target.clone(),
            child_count,
            collapsed: element.collapsed,
        }
    }
}

pub type ViewMap = BTreeMap<ElementId, ElementView>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ElementMaps {
    pub nodes: ViewMap,
    pub edges: ViewMap,
    pub node_groups: ViewMap,
    pub edge_groups: ViewMap,
}

impl ElementMaps {
    pub fn collect(doc: &GraphDocument, predicate: impl Fn(&Element) -> bool) -> Self {
        let mut maps = Self::default();
        for element in doc.all().filter(|el| predicate(el)) {
            maps.insert(doc, element);
        }
        maps
    }

    /// Re-derives only the given ids. Returns whether anything changed.
    pub fn patch(
        &mut self,
        doc: &GraphDocument,
        touched: &[ElementId],
        predicate: impl Fn(&Element) -> bool,
    ) -> bool {
        let mut changed = false;
        for id in touched {
            let previous = self.remove(id);
            let current = doc
                .get(id)
                .filter(|el| predicate(el))
                .and_then(|el| self.insert(doc, el));
            changed |= previous != current;
        }
        changed
    }

    fn bucket_mut(&mut self, category: Category) -> &mut ViewMap {
        match category {
            Category::Node => &mut self.nodes,
            Category::Edge => &mut self.edges,
            Category::NodeGroup => &mut self.node_groups,
            Category::EdgeGroup => &mut self.edge_groups,
        }
    }

    fn insert(&mut self, doc: &GraphDocument, element: &Element) -> Option<ElementView> {
        let category = element.category()?;
        let view = ElementView::from_element(doc, element);
        self.bucket_mut(category)
            .insert(element.id.clone(), view.clone());
        Some(view)
    }

    fn remove(&mut self, id: &ElementId) -> Option<ElementView> {
        [
            &mut self.nodes,
            &mut self.edges,
            &mut self.node_groups,
            &mut self.edge_groups,
        ]
        .into_iter()
        .find_map(|bucket| bucket.remove(id))
    }

    pub fn get(&self, id: &ElementId) -> Option<&ElementView> {
        [&self.nodes, &self.edges, &self.node_groups, &self.edge_groups]
            .into_iter()
            .find_map(|bucket| bucket.get(id))
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.nodes.len() + self.edges.len() + self.node_groups.len() + self.edge_groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<ElementId> {
        [&self.nodes, &self.edges, &self.node_groups, &self.edge_groups]
            .into_iter()
            .flat_map(|bucket| bucket.keys().cloned())
            .collect()
    }
}

/// Trailing-edge debounce for selection recomputation: every notification
/// pushes the deadline back, and the work runs once things go quiet.
#[derive(Debug, Clone)]
pub struct SelectionDebouncer {
    window: Duration,
    last_notified: Option<Instant>,
}

impl SelectionDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_notified: None,
        }
    }

    pub fn notify(&mut self, now: Instant) {
        self.last_notified = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.last_notified.is_some()
    }

    /// Consumes the pending notification once the window has elapsed.
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last_notified {
            Some(at) if now.saturating_duration_since(at) >= self.window => {
                self.last_notified = None;
                true
            }
            _ => false,
        }
    }

    /// Consumes the pending notification regardless of the window.
    pub fn flush(&mut self) -> bool {
        self.last_notified.take().is_some()
    }
}
