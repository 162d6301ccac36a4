//! Mutations that have to reach elements hidden inside collapsed groups.
//!
//! A stashed element is never edited structurally in place: the groups that
//! hide it are expanded outermost-first, the mutation runs against live
//! elements, and whatever groups still exist are re-collapsed innermost-first.

use crate::document::{GraphDocument, Location};
use graphedit_core::{ElementId, ElementKind};
use tracing::warn;

/// Runs `mutate` with every collapsed ancestor of `id` expanded.
pub fn with_expanded<R>(
    doc: &mut GraphDocument,
    id: &ElementId,
    mutate: impl FnOnce(&mut GraphDocument) -> R,
) -> R {
    let chain = doc.collapsed_ancestors(id);
    run_expanded(doc, chain, mutate)
}

/// Like [`with_expanded`], but `group` itself is opened too.
pub fn with_group_open<R>(
    doc: &mut GraphDocument,
    group: &ElementId,
    mutate: impl FnOnce(&mut GraphDocument) -> R,
) -> R {
    let mut chain = doc.collapsed_ancestors(group);
    if doc.is_collapsed(group) {
        chain.push(group.clone());
    }
    run_expanded(doc, chain, mutate)
}

fn run_expanded<R>(
    doc: &mut GraphDocument,
    chain: Vec<ElementId>,
    mutate: impl FnOnce(&mut GraphDocument) -> R,
) -> R {
    for group in &chain {
        if let Err(err) = doc.expand(group) {
            warn!(group = %group, error = %err, "Failed to expand collapsed ancestor");
        }
    }
    let result = mutate(doc);
    for group in chain.iter().rev() {
        if !doc.is_live(group) {
            continue;
        }
        if let Err(err) = doc.collapse(group) {
            warn!(group = %group, error = %err, "Failed to re-collapse group");
        }
    }
    result
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Removal {
    pub removed: Vec<ElementId>,
    /// Groups that lost a child but still have at least one.
    pub shrunk_groups: Vec<ElementId>,
    /// Edge groups that lost a member but still have at least one.
    pub shrunk_bundles: Vec<ElementId>,
}

impl Removal {
    fn settle(mut self, doc: &GraphDocument) -> Self {
        self.shrunk_groups.retain(|group| doc.contains(group));
        self.shrunk_groups.dedup();
        self.shrunk_bundles.retain(|bundle| doc.contains(bundle));
        self.shrunk_bundles.dedup();
        self
    }
}

/// Deletes nodes (and groups with their subtrees) plus every incident edge.
/// A group whose last child goes away is deleted as well, recursively.
pub fn delete_nodes(doc: &mut GraphDocument, ids: &[ElementId]) -> Removal {
    let mut removal = Removal::default();
    for id in ids {
        if !doc.contains(id) {
            continue;
        }
        with_expanded(doc, id, |doc| {
            let parent = doc.get_live(id).and_then(|el| el.parent.clone());
            remove_subtree(doc, id, &mut removal);
            remove_empty_ancestors(doc, parent, &mut removal);
        });
    }
    removal.settle(doc)
}

fn remove_subtree(doc: &mut GraphDocument, id: &ElementId, removal: &mut Removal) {
    let is_group = doc
        .get_live(id)
        .is_some_and(|el| el.kind == ElementKind::Group);
    if is_group {
        if let Err(err) = doc.expand(id) {
            warn!(group = %id, error = %err, "Failed to expand group before deletion");
        }
        let children: Vec<ElementId> = doc.children(id).iter().map(|el| el.id.clone()).collect();
        for child in children {
            remove_subtree(doc, &child, removal);
        }
    }
    remove_incident_edges(doc, id, removal);
    if doc.remove_live(id).is_some() {
        removal.removed.push(id.clone());
    }
}

/// Removes live edges of `node` and the ones stashed in other collapsed
/// groups, so nothing is left pointing at a deleted node.
fn remove_incident_edges(doc: &mut GraphDocument, node: &ElementId, removal: &mut Removal) {
    let mut edges = doc.live_edges_touching(node);
    edges.extend(doc.stashed_edges_touching(node));
    for edge in edges {
        let members: Vec<ElementId> = doc
            .bundle_members(&edge)
            .iter()
            .map(|el| el.id.clone())
            .collect();
        if with_expanded(doc, &edge, |doc| doc.remove_live(&edge)).is_some() {
            removal.removed.push(edge);
            removal.removed.extend(members);
        }
    }
}

fn remove_empty_ancestors(
    doc: &mut GraphDocument,
    parent: Option<ElementId>,
    removal: &mut Removal,
) {
    let mut current = parent;
    while let Some(group) = current {
        if !doc.is_live(&group) {
            break;
        }
        if doc.child_count(&group) > 0 {
            removal.shrunk_groups.push(group);
            break;
        }
        current = doc.get_live(&group).and_then(|el| el.parent.clone());
        remove_incident_edges(doc, &group, removal);
        doc.remove_live(&group);
        removal.removed.push(group);
    }
}

/// Deletes edges wherever they live. Emptied edge groups are deleted too.
pub fn delete_edges(doc: &mut GraphDocument, ids: &[ElementId]) -> Removal {
    let mut removal = Removal::default();
    for id in ids {
        match doc.locate(id) {
            None => continue,
            Some(Location::BundledIn(edge_group)) => {
                let remaining = doc.remove_bundle_member(&edge_group, id);
                removal.removed.push(id.clone());
                if remaining > 0 {
                    removal.shrunk_bundles.push(edge_group);
                    continue;
                }
                with_expanded(doc, &edge_group, |doc| doc.remove_live(&edge_group));
                removal.removed.push(edge_group);
            }
            Some(Location::Live | Location::CollapsedIn(_)) => {
                let is_edge = doc.get(id).is_some_and(|el| el.kind.is_edge_like());
                if !is_edge {
                    warn!(element = %id, "Skipping edge deletion for a non-edge element");
                    continue;
                }
                let members: Vec<ElementId> =
                    doc.bundle_members(id).iter().map(|el| el.id.clone()).collect();
                if with_expanded(doc, id, |doc| doc.remove_live(id)).is_some() {
                    removal.removed.push(id.clone());
                    removal.removed.extend(members);
                }
            }
        }
    }
    removal.settle(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphedit_core::Element;

    fn add(doc: &mut GraphDocument, id: &str, kind: ElementKind, parent: Option<&str>) {
        let mut element = Element::new(id, kind);
        element.parent = parent.map(ElementId::from);
        doc.insert(element).unwrap();
    }

    fn add_edge(doc: &mut GraphDocument, id: &str, source: &str, target: &str) {
        let mut element = Element::new(id, ElementKind::Edge);
        element.source = Some(source.into());
        element.target = Some(target.into());
        doc.insert(element).unwrap();
    }

    fn nested() -> GraphDocument {
        let mut doc = GraphDocument::new();
        add(&mut doc, "outer", ElementKind::Group, None);
        add(&mut doc, "inner", ElementKind::Group, Some("outer"));
        add(&mut doc, "a", ElementKind::Node, Some("inner"));
        add(&mut doc, "b", ElementKind::Node, Some("inner"));
        add(&mut doc, "c", ElementKind::Node, None);
        add_edge(&mut doc, "a-c", "a", "c");
        doc
    }

    #[test]
    fn with_expanded_restores_collapse_state() {
        let mut doc = nested();
        doc.collapse(&"inner".into()).unwrap();
        doc.collapse(&"outer".into()).unwrap();

        let label = with_expanded(&mut doc, &"a".into(), |doc| {
            assert!(doc.is_live(&"a".into()));
            let element = doc.get_live_mut(&"a".into()).unwrap();
            element.display_label = "renamed".to_string();
            element.display_label.clone()
        });

        assert_eq!(label, "renamed");
        assert!(doc.is_collapsed(&"outer".into()));
        assert!(doc.is_collapsed(&"inner".into()));
        assert_eq!(
            doc.locate(&"a".into()),
            Some(Location::CollapsedIn("inner".into()))
        );
        assert_eq!(doc.get(&"a".into()).unwrap().display_label, "renamed");
    }

    #[test]
    fn deleting_child_of_collapsed_group_keeps_it_collapsed() {
        let mut doc = nested();
        doc.collapse(&"inner".into()).unwrap();

        let removal = delete_nodes(&mut doc, &["a".into()]);
        assert_eq!(
            removal.removed,
            vec![ElementId::from("a-c"), ElementId::from("a")]
        );
        assert_eq!(removal.shrunk_groups, vec![ElementId::from("inner")]);
        assert!(doc.is_collapsed(&"inner".into()));
        assert_eq!(doc.child_count(&"inner".into()), 1);
    }

    #[test]
    fn deleting_last_children_cascades_to_groups() {
        let mut doc = nested();
        let removal = delete_nodes(&mut doc, &["a".into(), "b".into()]);
        assert!(removal.removed.contains(&"inner".into()));
        assert!(removal.removed.contains(&"outer".into()));
        assert!(removal.shrunk_groups.is_empty());
        assert!(doc.is_live(&"c".into()));
        assert_eq!(doc.live_count(), 1);
    }

    #[test]
    fn deleting_group_removes_subtree() {
        let mut doc = nested();
        doc.collapse(&"inner".into()).unwrap();
        let removal = delete_nodes(&mut doc, &["outer".into()]);
        for id in ["outer", "inner", "a", "b", "a-c"] {
            assert!(removal.removed.contains(&id.into()), "{id} not removed");
        }
        assert_eq!(doc.live_ids(), vec![ElementId::from("c")]);
    }

    #[test]
    fn deleting_last_bundle_member_deletes_edge_group() {
        let mut doc = nested();
        add_edge(&mut doc, "a-c-2", "a", "c");
        let mut edge_group = Element::new("eg", ElementKind::EdgeGroup);
        edge_group.source = Some("a".into());
        edge_group.target = Some("c".into());
        doc.bundle(edge_group, &["a-c".into(), "a-c-2".into()])
            .unwrap();

        let first = delete_edges(&mut doc, &["a-c".into()]);
        assert_eq!(first.shrunk_bundles, vec![ElementId::from("eg")]);
        let second = delete_edges(&mut doc, &["a-c-2".into()]);
        assert_eq!(
            second.removed,
            vec![ElementId::from("a-c-2"), ElementId::from("eg")]
        );
        assert!(!doc.contains(&"eg".into()));
    }

    #[test]
    fn deleting_node_drops_edges_stashed_in_other_groups() {
        let mut doc = nested();
        doc.collapse(&"inner".into()).unwrap();
        assert_eq!(
            doc.locate(&"a-c".into()),
            Some(Location::CollapsedIn("inner".into()))
        );

        let removal = delete_nodes(&mut doc, &["c".into()]);
        assert_eq!(
            removal.removed,
            vec![ElementId::from("a-c"), ElementId::from("c")]
        );
        assert!(!doc.contains(&"a-c".into()));
        assert!(doc.is_collapsed(&"inner".into()));

        doc.expand(&"inner".into()).unwrap();
        assert!(doc.all().all(|el| !el.touches(&"c".into())));
    }

    #[test]
    fn deleting_edge_inside_collapsed_group() {
        let mut doc = nested();
        doc.collapse(&"outer".into()).unwrap();
        let removal = delete_edges(&mut doc, &["a-c".into()]);
        assert_eq!(removal.removed, vec![ElementId::from("a-c")]);
        assert!(doc.is_collapsed(&"outer".into()));
        assert!(!doc.contains(&"a-c".into()));
    }
}
