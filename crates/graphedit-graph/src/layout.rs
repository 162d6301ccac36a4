use graphedit_core::{ElementId, Position};
use graphedit_events::LayoutAlgorithm;
use std::collections::HashMap;
use std::f64::consts::TAU;

/// A node handed to a layouter.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub id: ElementId,
    pub position: Position,
    pub parent: Option<ElementId>,
}

pub trait Layouter {
    fn execute(&self, nodes: &[LayoutNode]) -> HashMap<ElementId, Position>;
}

/// Row-major square grid, ordered by id so the result is stable.
pub struct GridLayouter {
    pub spacing: f64,
}

impl GridLayouter {
    pub const DEFAULT_SPACING: f64 = 120.0;
}

impl Layouter for GridLayouter {
    fn execute(&self, nodes: &[LayoutNode]) -> HashMap<ElementId, Position> {
        let mut ids: Vec<&ElementId> = nodes.iter().map(|node| &node.id).collect();
        ids.sort();
        let columns = (ids.len() as f64).sqrt().ceil().max(1.0) as usize;
        ids.into_iter()
            .enumerate()
            .map(|(i, id)| {
                let (row, column) = (i / columns, i % columns);
                let position = Position::new(column as f64 * self.spacing, row as f64 * self.spacing);
                (id.clone(), position)
            })
            .collect()
    }
}

/// Nodes evenly spaced on one circle around the current centroid.
pub struct CircleLayouter {
    /// Arc length between neighbours.
    pub spacing: f64,
}

impl Layouter for CircleLayouter {
    fn execute(&self, nodes: &[LayoutNode]) -> HashMap<ElementId, Position> {
        let center = centroid(nodes.iter().map(|node| node.position)).unwrap_or_default();
        if nodes.len() == 1 {
            return HashMap::from([(nodes[0].id.clone(), center)]);
        }
        let mut ids: Vec<&ElementId> = nodes.iter().map(|node| &node.id).collect();
        ids.sort();
        let count = ids.len() as f64;
        let radius = (count * self.spacing / TAU).max(self.spacing);
        ids.into_iter()
            .enumerate()
            .map(|(i, id)| {
                let angle = TAU * i as f64 / count;
                let position = Position::new(
                    center.x + radius * angle.cos(),
                    center.y + radius * angle.sin(),
                );
                (id.clone(), position)
            })
            .collect()
    }
}

/// Fallback used when the host does not run the requested algorithm itself.
pub fn builtin_layouter(algorithm: LayoutAlgorithm, spacing: f64) -> Box<dyn Layouter> {
    match algorithm {
        LayoutAlgorithm::Radial => Box::new(CircleLayouter { spacing }),
        LayoutAlgorithm::ForceDirected | LayoutAlgorithm::Grid | LayoutAlgorithm::Hierarchical => {
            Box::new(GridLayouter { spacing })
        }
    }
}

pub fn centroid(positions: impl IntoIterator<Item = Position>) -> Option<Position> {
    let (sum, count) = positions
        .into_iter()
        .fold((Position::default(), 0usize), |(sum, count), p| {
            (Position::new(sum.x + p.x, sum.y + p.y), count + 1)
        });
    (count > 0).then(|| Position::new(sum.x / count as f64, sum.y / count as f64))
}
