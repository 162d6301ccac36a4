use crate::document::GraphDocument;
use graphedit_core::{AttributeField, ElementId};
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub type ValueIndex = BTreeMap<String, BTreeSet<String>>;

/// Cross-reference of every attribute key and value in the document, used by
/// filter and style editors to offer completions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeIndex {
    pub node_keys: ValueIndex,
    pub edge_keys: ValueIndex,
    pub meta_keys: ValueIndex,
    pub system_ids: BTreeSet<String>,
    pub icons: BTreeSet<String>,
    label_inputs: HashMap<ElementId, Vec<(String, String)>>,
}

impl AttributeIndex {
    /// Indexes live and stashed elements alike.
    pub fn build(doc: &GraphDocument) -> Self {
        let mut index = Self::default();
        for element in doc.all() {
            let keys = if element.kind.is_node_like() {
                &mut index.node_keys
            } else if element.kind.is_edge_like() {
                &mut index.edge_keys
            } else {
                continue;
            };

            let mut inputs = Vec::with_capacity(element.payload.attributes.len());
            for field in &element.payload.attributes {
                keys.entry(field.key.clone())
                    .or_default()
                    .insert(field.value.clone());
                for meta_field in &field.meta_fields {
                    index
                        .meta_keys
                        .entry(meta_field.clone())
                        .or_default()
                        .insert(field.value.clone());
                }
                inputs.push((field.key.clone(), field.display_value().to_string()));
            }
            index.label_inputs.insert(element.id.clone(), inputs);

            if let Some(system_id) = &element.payload.system_id {
                index.system_ids.insert(system_id.clone());
            }
            if let Some(icon) = &element.payload.icon {
                index.icons.insert(icon.clone());
            }
        }
        index
    }

    pub fn node_values(&self, key: &str) -> Option<&BTreeSet<String>> {
        self.node_keys.get(key)
    }

    pub fn edge_values(&self, key: &str) -> Option<&BTreeSet<String>> {
        self.edge_keys.get(key)
    }

    /// Attribute fields sufficient to re-render an element's label template.
    pub fn label_inputs(&self, id: &ElementId) -> Vec<AttributeField> {
        self.label_inputs
            .get(id)
            .into_iter()
            .flatten()
            .map(|(key, value)| AttributeField::new(key.clone(), value.clone()))
            .collect()
    }
}
