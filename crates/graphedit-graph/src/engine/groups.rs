use super::elements::apply_changes;
use super::{Effects, Engine};
use crate::collapse::{self, with_expanded, with_group_open};
use crate::error::EngineError;
use crate::format::refresh_display_label;
use crate::host::RenderHost;
use crate::layout::centroid;
use graphedit_core::{Element, ElementId, ElementKind, StyleObject};
use graphedit_events::ElementChanges;
use tracing::{debug, warn};
use uuid::Uuid;

impl<H: RenderHost> Engine<H> {
    fn is_group(&self, id: &ElementId) -> bool {
        self.document
            .get(id)
            .is_some_and(|el| el.kind == ElementKind::Group)
    }

    /// Groups the selected, ungrouped nodes.
    pub(super) fn add_node_group(&mut self, label: Option<String>) -> Result<Effects, EngineError> {
        let members = self.groupable_nodes();
        if members.len() < 2 {
            return Ok(Effects::skip("grouping needs two ungrouped selected nodes"));
        }
        let label = label
            .filter(|label| !label.trim().is_empty())
            .unwrap_or_else(|| self.settings.group_label.clone());
        let group = self.create_group(label, &members)?;
        Ok(Effects {
            created: vec![group.clone()],
            touched: std::iter::once(group).chain(members).collect(),
            ..Default::default()
        })
    }

    /// Inserts a new top-level group centred on `members` and moves them in.
    pub(super) fn create_group(
        &mut self,
        label: String,
        members: &[ElementId],
    ) -> Result<ElementId, EngineError> {
        let id = ElementId::new(Uuid::new_v4().to_string());
        let mut group = Element::new(id.clone(), ElementKind::Group);
        group.payload.label = label;
        refresh_display_label(&mut group);
        group.position = centroid(
            members
                .iter()
                .filter_map(|member| self.document.get(member))
                .map(|el| el.position),
        )
        .unwrap_or_default();
        self.document.insert(group)?;
        for member in members {
            if let Some(element) = self.document.get_live_mut(member) {
                element.parent = Some(id.clone());
            }
        }
        Ok(id)
    }

    pub(super) fn change_node_group(
        &mut self,
        id: &ElementId,
        changes: &ElementChanges,
        style: Option<StyleObject>,
    ) -> Effects {
        let Some(group) = self
            .document
            .get_mut(id)
            .filter(|el| el.kind == ElementKind::Group)
        else {
            return Effects::skip("not a group");
        };
        apply_changes(group, changes);
        if let Some(style) = style {
            self.stylesheet.assign_user_style(group, &style);
            group.payload.style = style;
        }
        Effects::touching([id])
    }

    /// Dissolves a group. Its children move up to the group's parent.
    pub(super) fn delete_node_group(&mut self, id: &ElementId) -> Effects {
        if !self.is_group(id) {
            return Effects::skip("not a group");
        }
        let children = with_group_open(&mut self.document, id, |doc| {
            let grandparent = doc.get_live(id).and_then(|el| el.parent.clone());
            let children: Vec<ElementId> = doc.children(id).iter().map(|el| el.id.clone()).collect();
            for child in &children {
                if let Some(element) = doc.get_live_mut(child) {
                    element.parent = grandparent.clone();
                }
            }
            children
        });
        let removal = collapse::delete_nodes(&mut self.document, std::slice::from_ref(id));
        let mut effects = self.absorb_removal(removal);
        effects.touched.extend(children);
        effects
    }

    /// Moves each element one level up, out of its group. Groups left empty
    /// are deleted.
    pub(super) fn remove_from_group(&mut self, ids: &[ElementId]) -> Effects {
        let mut effects = Effects::default();
        let mut emptied = Vec::new();
        for id in ids {
            let Some(group) = self
                .document
                .get(id)
                .filter(|el| el.kind.is_node_like())
                .and_then(|el| el.parent.clone())
            else {
                continue;
            };
            with_group_open(&mut self.document, &group, |doc| {
                let grandparent = doc.get_live(&group).and_then(|el| el.parent.clone());
                if let Some(element) = doc.get_live_mut(id) {
                    element.parent = grandparent;
                }
            });
            effects.touch(id);
            effects.touch(&group);
            if self.document.child_count(&group) == 0 {
                emptied.push(group);
            }
        }
        if !emptied.is_empty() {
            let removal = collapse::delete_nodes(&mut self.document, &emptied);
            effects.merge(self.absorb_removal(removal));
        }
        effects.or_skip("no grouped elements")
    }

    pub(super) fn collapse_group(&mut self, id: &ElementId) -> Effects {
        if !self.is_group(id) {
            return Effects::skip("not a group");
        }
        match with_expanded(&mut self.document, id, |doc| doc.collapse(id)) {
            Ok(true) => Effects::touching([id]),
            Ok(false) => Effects::skip("group already collapsed"),
            Err(err) => {
                debug!(group = %id, error = %err, "Collapse refused");
                Effects::skip("group cannot be collapsed")
            }
        }
    }

    pub(super) fn expand_group(&mut self, id: &ElementId) -> Effects {
        if !self.is_group(id) {
            return Effects::skip("not a group");
        }
        match with_expanded(&mut self.document, id, |doc| doc.expand(id)) {
            Ok(true) => Effects::touching([id]),
            Ok(false) => Effects::skip("group already expanded"),
            Err(err) => {
                debug!(group = %id, error = %err, "Expand refused");
                Effects::skip("group cannot be expanded")
            }
        }
    }

    /// Collapses every visible group, innermost first so nested groups keep
    /// their own stash.
    pub(super) fn collapse_all_groups(&mut self) -> Effects {
        let mut groups: Vec<(usize, ElementId)> = self
            .document
            .live()
            .filter(|el| el.kind == ElementKind::Group && !el.collapsed)
            .map(|el| (self.document.depth(&el.id), el.id.clone()))
            .collect();
        groups.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        let mut effects = Effects::default();
        for (_, group) in groups {
            match self.document.collapse(&group) {
                Ok(true) => effects.touch(&group),
                Ok(false) => {}
                Err(err) => warn!(group = %group, error = %err, "Failed to collapse group"),
            }
        }
        effects.or_skip("no expanded groups")
    }

    pub(super) fn expand_all_groups(&mut self) -> Effects {
        let mut effects = Effects::default();
        loop {
            let next = self
                .document
                .collapsed_groups()
                .into_iter()
                .find(|group| self.document.is_live(group));
            let Some(group) = next else {
                break;
            };
            if let Err(err) = self.document.expand(&group) {
                warn!(group = %group, error = %err, "Failed to expand group");
                break;
            }
            effects.touch(&group);
        }
        effects.or_skip("no collapsed groups")
    }
}
