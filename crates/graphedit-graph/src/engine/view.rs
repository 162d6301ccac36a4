use super::{Effects, Engine};
use crate::classes::{HIDDEN, PATH_HIGHLIGHT};
use crate::host::RenderHost;
use crate::path::shortest_path;
use graphedit_core::{ElementId, ElementKind};
use std::collections::HashSet;
use tracing::{debug, info};

impl<H: RenderHost> Engine<H> {
    /// Hides elements. Hiding a node also hides every edge touching it,
    /// including edges stashed in groups or bundles.
    pub(super) fn hide(&mut self, ids: &[ElementId]) -> Effects {
        let mut effects = Effects::default();
        let mut nodes = HashSet::new();
        for id in ids {
            let Some(element) = self.document.get_mut(id) else {
                continue;
            };
            if element.kind.is_node_like() {
                nodes.insert(id.clone());
            }
            if !element.hidden {
                element.hidden = true;
                element.add_class(HIDDEN);
                effects.touch(id);
            }
        }
        for edge in self.document.all_mut() {
            let incident = edge.kind.is_edge_like()
                && [&edge.source, &edge.target]
                    .into_iter()
                    .flatten()
                    .any(|end| nodes.contains(end));
            if incident && !edge.hidden {
                edge.hidden = true;
                edge.add_class(HIDDEN);
                effects.touched.push(edge.id.clone());
            }
        }
        effects.or_skip("nothing to hide")
    }

    /// Shows elements. Edges of a shown node come back unless their other
    /// end is still hidden.
    pub(super) fn show(&mut self, ids: &[ElementId]) -> Effects {
        let mut effects = Effects::default();
        let mut nodes = HashSet::new();
        for id in ids {
            let Some(element) = self.document.get_mut(id) else {
                continue;
            };
            if element.kind.is_node_like() {
                nodes.insert(id.clone());
            }
            if element.hidden {
                element.hidden = false;
                element.remove_class(HIDDEN);
                effects.touch(id);
            }
        }
        let still_hidden: HashSet<ElementId> = self
            .document
            .all()
            .filter(|el| el.kind.is_node_like() && el.hidden)
            .map(|el| el.id.clone())
            .collect();
        for edge in self.document.all_mut() {
            if !edge.kind.is_edge_like() || !edge.hidden {
                continue;
            }
            let ends: Vec<&ElementId> = [&edge.source, &edge.target].into_iter().flatten().collect();
            let revealed = ends.iter().any(|end| nodes.contains(*end))
                && !ends.iter().any(|end| still_hidden.contains(*end));
            if revealed {
                edge.hidden = false;
                edge.remove_class(HIDDEN);
                effects.touched.push(edge.id.clone());
            }
        }
        effects.or_skip("nothing to show")
    }

    pub(super) fn show_all(&mut self) -> Effects {
        let mut effects = Effects::default();
        for element in self.document.all_mut() {
            if element.hidden {
                element.hidden = false;
                element.remove_class(HIDDEN);
                effects.touched.push(element.id.clone());
            }
        }
        effects.or_skip("nothing is hidden")
    }

    /// Selects live elements. The plain nodes among them also feed the merge
    /// machine when it is armed.
    pub(super) fn select(&mut self, ids: &[ElementId], additive: bool) -> Effects {
        let wanted: HashSet<&ElementId> = ids
            .iter()
            .filter(|id| self.document.is_live(id))
            .collect();
        let mut effects = Effects::default();
        for element in self.document.live_mut() {
            let selected = wanted.contains(&element.id) || (additive && element.selected);
            if element.selected != selected {
                element.selected = selected;
                effects.touched.push(element.id.clone());
            }
        }

        let picks: Vec<ElementId> = wanted
            .iter()
            .filter(|id| {
                self.document
                    .get_live(id)
                    .is_some_and(|el| el.kind == ElementKind::Node)
            })
            .map(|id| (*id).clone())
            .collect();
        if let Some(plan) = self.merge.on_selection(&picks) {
            effects.merge(self.execute_merge(plan));
        }
        effects
    }

    pub(super) fn unselect(&mut self, ids: &[ElementId]) -> Effects {
        let mut effects = Effects::default();
        for id in ids {
            if let Some(element) = self.document.get_live_mut(id)
                && element.selected
            {
                element.selected = false;
                effects.touch(id);
            }
        }
        effects.or_skip("nothing to unselect")
    }

    pub(super) fn select_all(&mut self) -> Effects {
        let mut effects = Effects::default();
        for element in self.document.live_mut() {
            if !element.selected && !element.hidden {
                element.selected = true;
                effects.touched.push(element.id.clone());
            }
        }
        effects.or_skip("everything is selected")
    }

    pub(super) fn zoom(&mut self, level: f64) -> Effects {
        if !level.is_finite() || level <= 0.0 {
            return Effects::skip("zoom level must be positive");
        }
        self.host.zoom(level);
        Effects::default()
    }

    pub(super) fn center(&mut self, ids: &[ElementId]) -> Effects {
        let targets: Vec<ElementId> = ids
            .iter()
            .filter(|id| self.document.is_live(id))
            .cloned()
            .collect();
        if targets.is_empty() {
            return Effects::skip("nothing to center on");
        }
        self.host.center(&targets);
        Effects::default()
    }

    pub(super) fn refresh(&mut self) -> Effects {
        self.host.refresh();
        self.rebuild_projections();
        Effects::default()
    }

    /// Selects exactly the elements of the cheapest path and highlights it.
    pub(super) fn shortest_path(
        &mut self,
        source: &ElementId,
        target: &ElementId,
        weight_attribute: Option<&str>,
    ) -> Effects {
        let Some(path) = shortest_path(&self.document, source, target, weight_attribute) else {
            debug!(%source, %target, "No path between nodes");
            return Effects::skip("no path between the nodes");
        };
        let on_path: HashSet<&ElementId> = path.element_ids().collect();
        let mut effects = Effects::default();
        for element in self.document.live_mut() {
            let wanted = on_path.contains(&element.id);
            if element.selected != wanted || element.has_class(PATH_HIGHLIGHT) != wanted {
                element.selected = wanted;
                element.toggle_class(PATH_HIGHLIGHT, wanted);
                effects.touched.push(element.id.clone());
            }
        }
        info!(
            %source,
            %target,
            hops = path.edges.len(),
            cost = path.cost,
            "Shortest path selected"
        );
        effects
    }
}
