use crate::classes;
use graphedit_core::{DocumentError, Element, ElementId, ElementKind};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Where an element currently lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Live,
    /// Stashed inside the given collapsed group.
    CollapsedIn(ElementId),
    /// Member edge of the given edge group.
    BundledIn(ElementId),
}

/// The element arena.
///
/// Live elements are the ones the canvas draws. Collapsing a group moves its
/// descendants and every edge touching them into a side table keyed by the
/// group; bundling parallel edges moves the members into a second side table
/// keyed by the edge group. Both tables are reachable through [`Self::get`]
/// and [`Self::get_mut`], so callers never lose track of hidden elements.
#[derive(Debug, Default, Clone)]
pub struct GraphDocument {
    elements: BTreeMap<ElementId, Element>,
    collapsed: HashMap<ElementId, Vec<Element>>,
    bundles: HashMap<ElementId, Vec<Element>>,
}

impl GraphDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.elements.len()
    }

    /// Total number of elements in any representation.
    pub fn element_count(&self) -> usize {
        self.elements.len()
            + self.collapsed.values().map(Vec::len).sum::<usize>()
            + self.bundles.values().map(Vec::len).sum::<usize>()
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.locate(id).is_some()
    }

    pub fn is_live(&self, id: &ElementId) -> bool {
        self.elements.contains_key(id)
    }

    pub fn locate(&self, id: &ElementId) -> Option<Location> {
        if self.elements.contains_key(id) {
            return Some(Location::Live);
        }
        if let Some(group) = stash_owner(&self.collapsed, id) {
            return Some(Location::CollapsedIn(group));
        }
        stash_owner(&self.bundles, id).map(Location::BundledIn)
    }

    pub fn get(&self, id: &ElementId) -> Option<&Element> {
        if let Some(element) = self.elements.get(id) {
            return Some(element);
        }
        self.collapsed
            .values()
            .chain(self.bundles.values())
            .flatten()
            .find(|el| &el.id == id)
    }

    pub fn get_mut(&mut self, id: &ElementId) -> Option<&mut Element> {
        if self.elements.contains_key(id) {
            return self.elements.get_mut(id);
        }
        self.collapsed
            .values_mut()
            .chain(self.bundles.values_mut())
            .flatten()
            .find(|el| &el.id == id)
    }

    pub fn get_live(&self, id: &ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn get_live_mut(&mut self, id: &ElementId) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }

    /// Inserts a live element after checking the id invariants.
    pub fn insert(&mut self, element: Element) -> Result<(), DocumentError> {
        if element.id.is_empty() {
            return Err(DocumentError::MissingId);
        }
        if self.contains(&element.id) {
            return Err(DocumentError::DuplicateId(element.id));
        }
        self.elements.insert(element.id.clone(), element);
        Ok(())
    }

    /// Removes a live element. A collapsed group's stash goes with it.
    pub fn remove_live(&mut self, id: &ElementId) -> Option<Element> {
        let element = self.elements.remove(id)?;
        self.discard_stash(id);
        Some(element)
    }

    fn discard_stash(&mut self, owner: &ElementId) {
        let stashed = self
            .collapsed
            .remove(owner)
            .into_iter()
            .chain(self.bundles.remove(owner))
            .flatten();
        let nested: Vec<ElementId> = stashed.map(|el| el.id).collect();
        for id in nested {
            self.discard_stash(&id);
        }
    }

    pub fn live(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn live_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.elements.values_mut()
    }

    /// Every element, live or stashed.
    pub fn all(&self) -> impl Iterator<Item = &Element> {
        self.elements
            .values()
            .chain(self.collapsed.values().flatten())
            .chain(self.bundles.values().flatten())
    }

    pub fn all_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.elements
            .values_mut()
            .chain(self.collapsed.values_mut().flatten())
            .chain(self.bundles.values_mut().flatten())
    }

    pub fn live_ids(&self) -> Vec<ElementId> {
        self.elements.keys().cloned().collect()
    }

    pub fn live_edges_touching(&self, node: &ElementId) -> Vec<ElementId> {
        self.elements
            .values()
            .filter(|el| el.kind.is_edge_like() && el.touches(node))
            .map(|el| el.id.clone())
            .collect()
    }

    /// Edges touching `node` that sit in a collapsed group's stash. Bundle
    /// members are left out; their edge group stands in for them.
    pub fn stashed_edges_touching(&self, node: &ElementId) -> Vec<ElementId> {
        let mut edges: Vec<ElementId> = self
            .collapsed
            .values()
            .flatten()
            .filter(|el| el.kind.is_edge_like() && el.touches(node))
            .map(|el| el.id.clone())
            .collect();
        edges.sort();
        edges
    }

    /// Direct children of a group, whether live or stashed under it.
    pub fn children(&self, group: &ElementId) -> Vec<&Element> {
        let stashed = self.collapsed.get(group).into_iter().flatten();
        self.elements
            .values()
            .chain(stashed)
            .filter(|el| el.kind.is_node_like() && el.parent.as_ref() == Some(group))
            .collect()
    }

    pub fn child_count(&self, group: &ElementId) -> usize {
        self.children(group).len()
    }

    fn live_descendants(&self, group: &ElementId) -> Vec<ElementId> {
        let mut found = Vec::new();
        let mut frontier = vec![group.clone()];
        while let Some(current) = frontier.pop() {
            for el in self.elements.values() {
                if el.parent.as_ref() == Some(&current) {
                    found.push(el.id.clone());
                    if el.kind == ElementKind::Group {
                        frontier.push(el.id.clone());
                    }
                }
            }
        }
        found
    }

    pub fn is_collapsed(&self, group: &ElementId) -> bool {
        self.collapsed.contains_key(group)
    }

    pub fn collapsed_groups(&self) -> Vec<ElementId> {
        let mut groups: Vec<ElementId> = self.collapsed.keys().cloned().collect();
        groups.sort();
        groups
    }

    /// Nesting depth of a node-like element; top-level elements are depth 0.
    pub fn depth(&self, id: &ElementId) -> usize {
        let mut depth = 0;
        let mut seen = HashSet::new();
        let mut current = self.get(id).and_then(|el| el.parent.clone());
        while let Some(parent) = current {
            if !seen.insert(parent.clone()) {
                break;
            }
            depth += 1;
            current = self.get(&parent).and_then(|el| el.parent.clone());
        }
        depth
    }

    /// Groups that must be expanded, outermost first, before `id` is live.
    ///
    /// Edge bundles along the way are stepped through, not expanded.
    pub fn collapsed_ancestors(&self, id: &ElementId) -> Vec<ElementId> {
        let mut chain = Vec::new();
        let mut current = id.clone();
        let mut seen = HashSet::new();
        while seen.insert(current.clone()) {
            match self.locate(&current) {
                Some(Location::CollapsedIn(group)) => {
                    chain.push(group.clone());
                    current = group;
                }
                Some(Location::BundledIn(edge_group)) => current = edge_group,
                Some(Location::Live) | None => break,
            }
        }
        chain.reverse();
        chain
    }

    /// Stashes a live group's descendants and their edges. Returns `false`
    /// when the group was already collapsed.
    pub fn collapse(&mut self, group: &ElementId) -> Result<bool, DocumentError> {
        self.require_live_group(group)?;
        if self.collapsed.contains_key(group) {
            return Ok(false);
        }

        let descendants: HashSet<ElementId> = self.live_descendants(group).into_iter().collect();
        let edges: Vec<ElementId> = self
            .elements
            .values()
            .filter(|el| {
                el.kind.is_edge_like()
                    && [&el.source, &el.target]
                        .into_iter()
                        .flatten()
                        .any(|end| descendants.contains(end))
            })
            .map(|el| el.id.clone())
            .collect();

        let mut stash = Vec::with_capacity(descendants.len() + edges.len());
        for id in descendants.iter().chain(edges.iter()) {
            if let Some(element) = self.elements.remove(id) {
                stash.push(element);
            }
        }
        stash.sort_by(|a, b| a.id.cmp(&b.id));
        self.collapsed.insert(group.clone(), stash);

        if let Some(element) = self.elements.get_mut(group) {
            element.collapsed = true;
            element.add_class(classes::COLLAPSED_GROUP);
            if !classes::is_filtered_out(&element.classes) {
                element.add_class(classes::BADGE_CONNECTIONS);
            }
        }
        Ok(true)
    }

    /// Restores a collapsed group's stash. Returns `false` when it was not
    /// collapsed.
    pub fn expand(&mut self, group: &ElementId) -> Result<bool, DocumentError> {
        self.require_live_group(group)?;
        let Some(stash) = self.collapsed.remove(group) else {
            return Ok(false);
        };
        for element in stash {
            self.elements.insert(element.id.clone(), element);
        }
        if let Some(element) = self.elements.get_mut(group) {
            element.collapsed = false;
            element.remove_class(classes::COLLAPSED_GROUP);
            element.remove_class(classes::BADGE_CONNECTIONS);
        }
        Ok(true)
    }

    fn require_live_group(&self, group: &ElementId) -> Result<(), DocumentError> {
        match self.elements.get(group) {
            Some(el) if el.kind == ElementKind::Group => Ok(()),
            Some(_) => Err(DocumentError::NotAGroup(group.clone())),
            None => Err(DocumentError::UnknownElement(group.clone())),
        }
    }

    /// Inserts an edge group and moves the given live edges under it.
    pub fn bundle(
        &mut self,
        edge_group: Element,
        members: &[ElementId],
    ) -> Result<(), DocumentError> {
        let owner = edge_group.id.clone();
        self.insert(edge_group)?;
        let stash: Vec<Element> = members
            .iter()
            .filter_map(|id| self.elements.remove(id))
            .collect();
        self.bundles.insert(owner, stash);
        Ok(())
    }

    /// Removes a live edge group and restores its members.
    pub fn unbundle(&mut self, edge_group: &ElementId) -> Option<Vec<ElementId>> {
        let members = self.bundles.remove(edge_group)?;
        self.elements.remove(edge_group);
        let ids = members.iter().map(|el| el.id.clone()).collect();
        for member in members {
            self.elements.insert(member.id.clone(), member);
        }
        Some(ids)
    }

    pub fn bundle_members(&self, edge_group: &ElementId) -> &[Element] {
        self.bundles
            .get(edge_group)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn bundle_members_mut(&mut self, edge_group: &ElementId) -> Option<&mut Vec<Element>> {
        self.bundles.get_mut(edge_group)
    }

    /// Drops one member edge from a bundle; returns how many remain.
    pub fn remove_bundle_member(&mut self, edge_group: &ElementId, edge: &ElementId) -> usize {
        match self.bundles.get_mut(edge_group) {
            Some(members) => {
                members.retain(|el| &el.id != edge);
                members.len()
            }
            None => 0,
        }
    }

    pub fn max_z_index(&self) -> i32 {
        self.all().map(|el| el.z_index).max().unwrap_or(0)
    }

    pub fn min_z_index(&self) -> i32 {
        self.all().map(|el| el.z_index).min().unwrap_or(0)
    }
}

fn stash_owner(table: &HashMap<ElementId, Vec<Element>>, id: &ElementId) -> Option<ElementId> {
    table
        .iter()
        .find(|(_, stashed)| stashed.iter().any(|el| &el.id == id))
        .map(|(owner, _)| owner.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphedit_core::Element;

    fn node(id: &str, parent: Option<&str>) -> Element {
        let mut element = Element::new(id, ElementKind::Node);
        element.parent = parent.map(ElementId::from);
        element
    }

    fn group(id: &str, parent: Option<&str>) -> Element {
        let mut element = Element::new(id, ElementKind::Group);
        element.parent = parent.map(ElementId::from);
        element
    }

    fn edge(id: &str, source: &str, target: &str) -> Element {
        let mut element = Element::new(id, ElementKind::Edge);
        element.source = Some(source.into());
        element.target = Some(target.into());
        element
    }

    fn sample() -> GraphDocument {
        let mut doc = GraphDocument::new();
        doc.insert(group("outer", None)).unwrap();
        doc.insert(group("inner", Some("outer"))).unwrap();
        doc.insert(node("a", Some("inner"))).unwrap();
        doc.insert(node("b", Some("outer"))).unwrap();
        doc.insert(node("c", None)).unwrap();
        doc.insert(edge("a-c", "a", "c")).unwrap();
        doc.insert(edge("b-c", "b", "c")).unwrap();
        doc
    }

    #[test]
    fn insert_rejects_duplicates_and_blank_ids() {
        let mut doc = sample();
        assert_eq!(
            doc.insert(node("a", None)),
            Err(DocumentError::DuplicateId("a".into()))
        );
        assert_eq!(doc.insert(node(" ", None)), Err(DocumentError::MissingId));
    }

    #[test]
    fn collapse_stashes_descendants_and_incident_edges() {
        let mut doc = sample();
        assert!(doc.collapse(&"outer".into()).unwrap());
        assert!(!doc.collapse(&"outer".into()).unwrap());

        assert!(doc.is_live(&"outer".into()));
        assert!(doc.is_live(&"c".into()));
        for id in ["inner", "a", "b", "a-c", "b-c"] {
            assert_eq!(
                doc.locate(&id.into()),
                Some(Location::CollapsedIn("outer".into())),
                "{id} should be stashed"
            );
        }
        assert_eq!(doc.child_count(&"outer".into()), 2);
        let outer = doc.get(&"outer".into()).unwrap();
        assert!(outer.collapsed);
        assert!(outer.has_class(classes::COLLAPSED_GROUP));
        assert!(outer.has_class(classes::BADGE_CONNECTIONS));

        assert!(doc.expand(&"outer".into()).unwrap());
        assert_eq!(doc.live_count(), 7);
        assert!(!doc.get(&"outer".into()).unwrap().collapsed);
    }

    #[test]
    fn nested_collapse_reports_outermost_first() {
        let mut doc = sample();
        doc.collapse(&"inner".into()).unwrap();
        doc.collapse(&"outer".into()).unwrap();
        assert_eq!(
            doc.collapsed_ancestors(&"a".into()),
            vec![ElementId::from("outer"), ElementId::from("inner")]
        );
        assert!(doc.collapsed_ancestors(&"c".into()).is_empty());
        assert_eq!(doc.depth(&"a".into()), 2);
    }

    #[test]
    fn removing_collapsed_group_discards_its_stash() {
        let mut doc = sample();
        doc.collapse(&"inner".into()).unwrap();
        doc.collapse(&"outer".into()).unwrap();
        doc.remove_live(&"outer".into());
        assert!(!doc.contains(&"a".into()));
        assert!(!doc.contains(&"inner".into()));
        assert!(doc.collapsed_groups().is_empty());
    }

    #[test]
    fn bundles_round_trip() {
        let mut doc = sample();
        doc.insert(edge("a-c-2", "a", "c")).unwrap();
        let mut edge_group = Element::new("eg", ElementKind::EdgeGroup);
        edge_group.source = Some("a".into());
        edge_group.target = Some("c".into());
        doc.bundle(edge_group, &["a-c".into(), "a-c-2".into()])
            .unwrap();

        assert_eq!(
            doc.locate(&"a-c-2".into()),
            Some(Location::BundledIn("eg".into()))
        );
        assert_eq!(doc.bundle_members(&"eg".into()).len(), 2);
        assert_eq!(doc.remove_bundle_member(&"eg".into(), &"a-c".into()), 1);

        let restored = doc.unbundle(&"eg".into()).unwrap();
        assert_eq!(restored, vec![ElementId::from("a-c-2")]);
        assert!(!doc.contains(&"eg".into()));
        assert!(doc.is_live(&"a-c-2".into()));
    }

    #[test]
    fn collapse_rejects_plain_nodes() {
        let mut doc = sample();
        assert_eq!(
            doc.collapse(&"c".into()),
            Err(DocumentError::NotAGroup("c".into()))
        );
    }
}
