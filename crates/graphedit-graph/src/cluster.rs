use crate::document::GraphDocument;
use graphedit_core::{Element, ElementId, ElementKind};
use graphedit_events::ClusterBy;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// Shared value; becomes the group label.
    pub key: String,
    pub members: Vec<ElementId>,
}

/// Visible, ungrouped plain nodes. Only these are clustered.
pub fn candidates(doc: &GraphDocument) -> Vec<&Element> {
    doc.live()
        .filter(|el| el.kind == ElementKind::Node && el.parent.is_none() && !el.hidden)
        .collect()
}

/// Partitions the candidates and keeps clusters of at least `min_size`
/// members, ordered by key.
pub fn partition(doc: &GraphDocument, by: &ClusterBy, min_size: usize) -> Vec<Cluster> {
    let nodes = candidates(doc);
    let mut buckets: BTreeMap<String, Vec<ElementId>> = BTreeMap::new();
    match by {
        ClusterBy::SystemId => {
            for node in &nodes {
                if let Some(system_id) = node.payload.system_id.as_deref() {
                    bucket(&mut buckets, system_id, &node.id);
                }
            }
        }
        ClusterBy::Attribute { key } => {
            for node in &nodes {
                if let Some(field) = node.payload.attribute(key) {
                    bucket(&mut buckets, &field.value, &node.id);
                }
            }
        }
        ClusterBy::Connectivity => {
            let mut components = UnionFind::new(nodes.iter().map(|node| node.id.clone()));
            for edge in doc.live().filter(|el| el.kind.is_edge_like()) {
                if let (Some(source), Some(target)) = (&edge.source, &edge.target) {
                    components.union(source, target);
                }
            }
            for node in &nodes {
                if let Some(root) = components.find(&node.id) {
                    buckets.entry(root.0).or_default().push(node.id.clone());
                }
            }
        }
    }
    buckets
        .into_iter()
        .filter(|(_, members)| members.len() >= min_size.max(2))
        .map(|(key, mut members)| {
            members.sort();
            Cluster { key, members }
        })
        .collect()
}

fn bucket(buckets: &mut BTreeMap<String, Vec<ElementId>>, value: &str, id: &ElementId) {
    let value = value.trim();
    if !value.is_empty() {
        buckets.entry(value.to_string()).or_default().push(id.clone());
    }
}

/// Disjoint sets keyed by element id; the smallest id is the root so
/// component keys are stable.
struct UnionFind {
    parent: HashMap<ElementId, ElementId>,
}

impl UnionFind {
    fn new(ids: impl IntoIterator<Item = ElementId>) -> Self {
        Self {
            parent: ids.into_iter().map(|id| (id.clone(), id)).collect(),
        }
    }

    fn find(&mut self, id: &ElementId) -> Option<ElementId> {
        let mut root = self.parent.get(id)?.clone();
        while let Some(next) = self.parent.get(&root).filter(|next| *next != &root) {
            root = next.clone();
        }
        let mut current = id.clone();
        while current != root {
            let Some(next) = self.parent.insert(current, root.clone()) else {
                break;
            };
            current = next;
        }
        Some(root)
    }

    /// Unknown ids (nodes outside the candidate set) are ignored.
    fn union(&mut self, a: &ElementId, b: &ElementId) {
        let (Some(a), Some(b)) = (self.find(a), self.find(b)) else {
            return;
        };
        if a == b {
            return;
        }
        let (root, child) = if a < b { (a, b) } else { (b, a) };
        self.parent.insert(child, root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphedit_core::AttributeField;

    fn node(doc: &mut GraphDocument, id: &str, system_id: Option<&str>, team: &str) {
        let mut element = Element::new(id, ElementKind::Node);
        element.payload.system_id = system_id.map(str::to_string);
        element
            .payload
            .attributes
            .push(AttributeField::new("team", team));
        doc.insert(element).unwrap();
    }

    fn edge(doc: &mut GraphDocument, source: &str, target: &str) {
        let mut element = Element::new(format!("{source}-{target}"), ElementKind::Edge);
        element.source = Some(source.into());
        element.target = Some(target.into());
        doc.insert(element).unwrap();
    }

    fn sample() -> GraphDocument {
        let mut doc = GraphDocument::new();
        node(&mut doc, "a", Some("server"), "red");
        node(&mut doc, "b", Some("server"), " red ");
        node(&mut doc, "c", Some("client"), "blue");
        node(&mut doc, "d", None, "blue");
        node(&mut doc, "e", Some("client"), "");
        edge(&mut doc, "a", "c");
        edge(&mut doc, "d", "e");
        doc
    }

    fn keys(clusters: &[Cluster]) -> Vec<&str> {
        clusters.iter().map(|c| c.key.as_str()).collect()
    }

    #[test]
    fn by_system_id() {
        let clusters = partition(&sample(), &ClusterBy::SystemId, 2);
        assert_eq!(keys(&clusters), vec!["client", "server"]);
        assert_eq!(
            clusters[0].members,
            vec![ElementId::from("c"), ElementId::from("e")]
        );
    }

    #[test]
    fn by_attribute_trims_and_skips_blank() {
        let clusters = partition(
            &sample(),
            &ClusterBy::Attribute {
                key: "team".to_string(),
            },
            2,
        );
        assert_eq!(keys(&clusters), vec!["blue", "red"]);
        assert_eq!(clusters[1].members.len(), 2);
    }

    #[test]
    fn by_connectivity() {
        let clusters = partition(&sample(), &ClusterBy::Connectivity, 2);
        let members: Vec<Vec<ElementId>> = clusters.into_iter().map(|c| c.members).collect();
        assert_eq!(
            members,
            vec![
                vec![ElementId::from("a"), ElementId::from("c")],
                vec![ElementId::from("d"), ElementId::from("e")],
            ]
        );
    }

    #[test]
    fn singletons_are_never_clusters() {
        let clusters = partition(&sample(), &ClusterBy::SystemId, 0);
        assert!(clusters.iter().all(|c| c.members.len() >= 2));
    }
}
