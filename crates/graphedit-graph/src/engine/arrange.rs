use super::{Effects, Engine};
use crate::cluster::partition;
use crate::error::EngineError;
use crate::host::RenderHost;
use crate::layout::{LayoutNode, builtin_layouter, centroid};
use graphedit_core::ElementId;
use graphedit_events::{AlignMode, ClusterBy, LayoutAlgorithm};
use tracing::{debug, info};

impl<H: RenderHost> Engine<H> {
    /// Positions every visible node. The host gets the first chance to run
    /// the algorithm.
    pub(super) fn layout(&mut self, algorithm: LayoutAlgorithm) -> Effects {
        let nodes: Vec<LayoutNode> = self
            .document
            .live()
            .filter(|el| el.kind.is_node_like() && !el.hidden)
            .map(|el| LayoutNode {
                id: el.id.clone(),
                position: el.position,
                parent: el.parent.clone(),
            })
            .collect();
        if nodes.is_empty() {
            return Effects::skip("nothing to lay out");
        }
        let positions = match self.host.run_layout(algorithm, &nodes) {
            Some(positions) => positions,
            None => {
                debug!(?algorithm, "Host declined layout, using built-in layouter");
                builtin_layouter(algorithm, self.settings.grid_spacing).execute(&nodes)
            }
        };

        let mut effects = Effects::default();
        for (id, position) in positions {
            if let Some(element) = self.document.get_live_mut(&id)
                && element.position != position
            {
                element.position = position;
                effects.touch(&id);
            }
        }
        effects
    }

    /// Lines up the selected nodes along one edge or centre line.
    pub(super) fn align(&mut self, mode: AlignMode) -> Effects {
        let selected: Vec<(ElementId, f64, f64)> = self
            .document
            .live()
            .filter(|el| el.kind.is_node_like() && el.selected)
            .map(|el| (el.id.clone(), el.position.x, el.position.y))
            .collect();
        if selected.len() < 2 {
            return Effects::skip("alignment needs two selected nodes");
        }
        let xs = selected.iter().map(|(_, x, _)| *x);
        let ys = selected.iter().map(|(_, _, y)| *y);
        let center = centroid(
            self.document
                .live()
                .filter(|el| el.kind.is_node_like() && el.selected)
                .map(|el| el.position),
        )
        .unwrap_or_default();
        let (x, y) = match mode {
            AlignMode::Left => (Some(xs.fold(f64::INFINITY, f64::min)), None),
            AlignMode::Right => (Some(xs.fold(f64::NEG_INFINITY, f64::max)), None),
            AlignMode::Top => (None, Some(ys.fold(f64::INFINITY, f64::min))),
            AlignMode::Bottom => (None, Some(ys.fold(f64::NEG_INFINITY, f64::max))),
            AlignMode::CenterHorizontal => (Some(center.x), None),
            AlignMode::CenterVertical => (None, Some(center.y)),
        };

        let mut effects = Effects::default();
        for (id, _, _) in &selected {
            let Some(element) = self.document.get_live_mut(id) else {
                continue;
            };
            let before = element.position;
            element.position.x = x.unwrap_or(before.x);
            element.position.y = y.unwrap_or(before.y);
            if element.position != before {
                effects.touch(id);
            }
        }
        effects
    }

    pub(super) fn bring_to_front(&mut self, ids: &[ElementId]) -> Effects {
        let mut z = self.document.max_z_index();
        self.restack(ids, || {
            z += 1;
            z
        })
    }

    pub(super) fn send_to_back(&mut self, ids: &[ElementId]) -> Effects {
        let mut z = self.document.min_z_index();
        self.restack(ids, || {
            z -= 1;
            z
        })
    }

    fn restack(&mut self, ids: &[ElementId], mut next_z: impl FnMut() -> i32) -> Effects {
        let mut effects = Effects::default();
        for id in ids {
            if let Some(element) = self.document.get_mut(id) {
                element.z_index = next_z();
                effects.touch(id);
            }
        }
        effects.or_skip("no matching elements")
    }

    /// Groups visible top-level nodes that share a key.
    pub(super) fn cluster(&mut self, by: &ClusterBy) -> Result<Effects, EngineError> {
        let clusters = partition(&self.document, by, self.settings.min_cluster_size);
        if clusters.is_empty() {
            return Ok(Effects::skip("no cluster reached the minimum size"));
        }
        let mut effects = Effects::default();
        for (n, cluster) in clusters.iter().enumerate() {
            let label = match by {
                ClusterBy::Connectivity => format!("{} {}", self.settings.group_label, n + 1),
                ClusterBy::SystemId | ClusterBy::Attribute { .. } => cluster.key.clone(),
            };
            let group = self.create_group(label, &cluster.members)?;
            effects.created.push(group.clone());
            effects.touch(&group);
            effects.touched.extend(cluster.members.iter().cloned());
        }
        info!(clusters = clusters.len(), ?by, "Clustered nodes");
        Ok(effects)
    }
}
