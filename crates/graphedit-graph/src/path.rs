use crate::document::GraphDocument;
use graphedit_core::{Element, ElementId};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

const DEFAULT_WEIGHT: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct GraphPath {
    /// Nodes from source to target, inclusive.
    pub nodes: Vec<ElementId>,
    /// Edges between consecutive nodes.
    pub edges: Vec<ElementId>,
    pub cost: f64,
}

impl GraphPath {
    pub fn element_ids(&self) -> impl Iterator<Item = &ElementId> {
        self.nodes.iter().chain(self.edges.iter())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Frontier<'a> {
    cost: f64,
    node: &'a ElementId,
}

impl Eq for Frontier<'_> {}

impl PartialOrd for Frontier<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: lower cost first, then lower id.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(self.node))
    }
}

/// Weight of an edge: the named attribute when it parses as a finite,
/// non-negative number, 1 otherwise.
pub fn edge_weight(edge: &Element, weight_attribute: Option<&str>) -> f64 {
    weight_attribute
        .and_then(|key| edge.payload.attribute(key))
        .and_then(|field| field.value.trim().parse::<f64>().ok())
        .filter(|weight| weight.is_finite() && *weight >= 0.0)
        .unwrap_or(DEFAULT_WEIGHT)
}

/// Dijkstra over live edges, ignoring direction.
pub fn shortest_path(
    doc: &GraphDocument,
    source: &ElementId,
    target: &ElementId,
    weight_attribute: Option<&str>,
) -> Option<GraphPath> {
    let is_live_node = |id: &ElementId| doc.get_live(id).is_some_and(|el| el.kind.is_node_like());
    if !is_live_node(source) || !is_live_node(target) {
        return None;
    }

    let mut adjacency: HashMap<&ElementId, Vec<(&ElementId, &ElementId, f64)>> = HashMap::new();
    for edge in doc.live().filter(|el| el.kind.is_edge_like()) {
        let (Some(from), Some(to)) = (&edge.source, &edge.target) else {
            continue;
        };
        let weight = edge_weight(edge, weight_attribute);
        adjacency.entry(from).or_default().push((to, &edge.id, weight));
        adjacency.entry(to).or_default().push((from, &edge.id, weight));
    }

    let mut best: HashMap<&ElementId, f64> = HashMap::from([(source, 0.0)]);
    let mut via: HashMap<&ElementId, (&ElementId, &ElementId)> = HashMap::new();
    let mut heap = BinaryHeap::from([Frontier {
        cost: 0.0,
        node: source,
    }]);

    while let Some(Frontier { cost, node }) = heap.pop() {
        if node == target {
            break;
        }
        if best.get(node).is_some_and(|known| cost > *known) {
            continue;
        }
        for &(next, edge, weight) in adjacency.get(node).into_iter().flatten() {
            let candidate = cost + weight;
            if best.get(next).is_none_or(|known| candidate < *known) {
                best.insert(next, candidate);
                via.insert(next, (node, edge));
                heap.push(Frontier {
                    cost: candidate,
                    node: next,
                });
            }
        }
    }

    let cost = *best.get(target)?;
    let mut nodes = vec![target.clone()];
    let mut edges = Vec::new();
    let mut current = target;
    while current != source {
        let &(previous, edge) = via.get(current)?;
        nodes.push(previous.clone());
        edges.push(edge.clone());
        current = previous;
    }
    nodes.reverse();
    edges.reverse();
    Some(GraphPath { nodes, edges, cost })
}
