use super::{Effects, Engine};
use crate::collapse::{self, with_group_open};
use crate::document::GraphDocument;
use crate::error::EngineError;
use crate::format::{format_element, refresh_display_label, set_icon};
use crate::host::RenderHost;
use graphedit_core::{
    DocumentError, Element, ElementId, ElementKind, RawElement, StyleObject,
};
use graphedit_events::ElementChanges;
use tracing::warn;
use uuid::Uuid;

/// Which half of the node/edge action surface a handler serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Family {
    Node,
    Edge,
}

impl Family {
    pub(crate) fn accepts(self, kind: ElementKind) -> bool {
        match self {
            Family::Node => kind.is_node_like(),
            Family::Edge => kind.is_edge_like(),
        }
    }
}

impl<H: RenderHost> Engine<H> {
    pub(super) fn add_element(
        &mut self,
        mut raw: RawElement,
        kind: ElementKind,
    ) -> Result<Effects, EngineError> {
        raw.kind = Some(kind);
        if raw.id.is_none() {
            raw.id = Some(ElementId::new(Uuid::new_v4().to_string()));
        }
        let mut element = format_element(raw, kind)?;
        if self.document.contains(&element.id) {
            return Err(DocumentError::DuplicateId(element.id).into());
        }
        for endpoint in [&element.source, &element.target].into_iter().flatten() {
            let is_node = self
                .document
                .get(endpoint)
                .is_some_and(|el| el.kind.is_node_like());
            if !is_node {
                return Err(DocumentError::MissingEndpoint {
                    edge: element.id.clone(),
                    endpoint: endpoint.clone(),
                }
                .into());
            }
        }
        if let Some(parent) = element.parent.clone()
            && !self
                .document
                .get(&parent)
                .is_some_and(|el| el.kind == ElementKind::Group)
        {
            warn!(element = %element.id, parent = %parent, "Dropping parent reference to a missing group");
            element.parent = None;
        }
        if !element.payload.style.is_empty() {
            let style = element.payload.style.clone();
            self.stylesheet.assign_user_style(&mut element, &style);
        }

        let id = element.id.clone();
        let anchors: Vec<ElementId> = element
            .parent
            .iter()
            .chain(&element.source)
            .chain(&element.target)
            .cloned()
            .collect();
        insert_beside(&mut self.document, &anchors, element)?;

        let mut effects = Effects {
            created: vec![id.clone()],
            ..Default::default()
        };
        effects.touch(&id);
        if let Some(parent) = anchors.first().filter(|_| kind.is_node_like()) {
            effects.touch(parent);
        }
        Ok(effects)
    }

    pub(super) fn change_element(
        &mut self,
        id: &ElementId,
        changes: &ElementChanges,
        family: Family,
    ) -> Effects {
        let Some(element) = self
            .document
            .get_mut(id)
            .filter(|el| family.accepts(el.kind))
        else {
            return Effects::skip("unknown element");
        };
        apply_changes(element, changes);
        Effects::touching([id])
    }

    pub(super) fn change_style(
        &mut self,
        ids: &[ElementId],
        style: &StyleObject,
        family: Family,
        apply_to_type: bool,
    ) -> Effects {
        let targets = self.resolve_targets(ids, family, apply_to_type);
        if targets.is_empty() {
            return Effects::skip("no matching elements");
        }
        for id in &targets {
            if let Some(element) = self.document.get_mut(id) {
                element.payload.style = style.clone();
                self.stylesheet.assign_user_style(element, style);
            }
        }
        self.schedule_recollapse(&targets);
        Effects::touching(&targets)
    }

    /// Deletes nodes, groups (with their subtrees) and drawings.
    pub(super) fn delete_nodes(&mut self, ids: &[ElementId]) -> Effects {
        let targets: Vec<ElementId> = ids
            .iter()
            .filter(|id| {
                self.document
                    .get(id)
                    .is_some_and(|el| !el.kind.is_edge_like())
            })
            .cloned()
            .collect();
        if targets.is_empty() {
            return Effects::skip("no matching nodes");
        }
        let removal = collapse::delete_nodes(&mut self.document, &targets);
        self.absorb_removal(removal)
    }

    pub(super) fn delete_edges(&mut self, ids: &[ElementId]) -> Effects {
        let removal = collapse::delete_edges(&mut self.document, ids);
        if removal.removed.is_empty() {
            return Effects::skip("no matching edges");
        }
        self.absorb_removal(removal)
    }
}

/// Applies a field-level edit and re-derives the display label.
pub(super) fn apply_changes(element: &mut Element, changes: &ElementChanges) {
    if let Some(label) = &changes.label {
        element.payload.label = label.clone();
    }
    if let Some(template) = &changes.label_template {
        element.payload.label_template = Some(template.clone()).filter(|t| !t.trim().is_empty());
    }
    if let Some(system_id) = &changes.system_id {
        element.payload.system_id =
            Some(system_id.trim().to_string()).filter(|system_id| !system_id.is_empty());
    }
    if let Some(icon) = &changes.icon {
        set_icon(element, Some(icon.clone()));
    }
    refresh_display_label(element);
}

/// Inserts `element` while its anchors (parent group, endpoints) are live,
/// so re-collapsing puts it in the same stash as them.
fn insert_beside(
    doc: &mut GraphDocument,
    anchors: &[ElementId],
    element: Element,
) -> Result<(), DocumentError> {
    match anchors.split_first() {
        None => doc.insert(element),
        Some((anchor, rest)) => {
            with_group_open(doc, anchor, |doc| insert_beside(doc, rest, element))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::ICON_PREFIX;

    #[test]
    fn changes_clear_blank_fields() {
        let mut element = Element::new("n1", ElementKind::Node);
        element.payload.label = "old".to_string();
        element.payload.label_template = Some("{{name}}".to_string());
        set_icon(&mut element, Some("user".to_string()));

        apply_changes(
            &mut element,
            &ElementChanges {
                label: Some("new".to_string()),
                label_template: Some(String::new()),
                icon: Some(" ".to_string()),
                system_id: Some(" server ".to_string()),
            },
        );
        assert_eq!(element.display_label, "new");
        assert_eq!(element.payload.label_template, None);
        assert_eq!(element.payload.icon, None);
        assert!(!element.classes.iter().any(|c| c.starts_with(ICON_PREFIX)));
        assert_eq!(element.payload.system_id.as_deref(), Some("server"));
    }

    #[test]
    fn insert_beside_lands_in_the_collapsed_stash() {
        let mut doc = GraphDocument::new();
        doc.insert(Element::new("g", ElementKind::Group)).unwrap();
        let mut child = Element::new("a", ElementKind::Node);
        child.parent = Some("g".into());
        doc.insert(child).unwrap();
        doc.collapse(&"g".into()).unwrap();

        let mut added = Element::new("b", ElementKind::Node);
        added.parent = Some("g".into());
        insert_beside(&mut doc, &["g".into()], added).unwrap();

        assert!(doc.is_collapsed(&"g".into()));
        assert_eq!(doc.child_count(&"g".into()), 2);
        assert!(!doc.is_live(&"b".into()));
    }
}
