use crate::classes::{EDGE_GROUP_WIDE, is_filtered_out};
use crate::document::GraphDocument;
use crate::filter::sync_badges;
use graphedit_core::{Element, ElementId, ElementKind};

/// Numeric values of `attribute` across the given edges. Values that do not
/// parse as finite numbers are skipped.
pub fn attribute_values(members: &[Element], attribute: &str) -> Vec<f64> {
    members
        .iter()
        .filter_map(|edge| edge.payload.attribute(attribute))
        .filter_map(|field| field.value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .collect()
}

/// Recomputes an edge group's aggregation values from its members and
/// updates the width and badge classes. Returns `false` if `id` is not an
/// edge group.
pub fn refresh_edge_group(doc: &mut GraphDocument, id: &ElementId) -> bool {
    if !doc
        .get(id)
        .is_some_and(|el| el.kind == ElementKind::EdgeGroup)
    {
        return false;
    }
    let members = doc.bundle_members(id).to_vec();
    let Some(edge_group) = doc.get_mut(id) else {
        return false;
    };
    for aggregation in &mut edge_group.payload.aggregations {
        let values = attribute_values(&members, &aggregation.attribute);
        aggregation.value = aggregation.function.apply(&values);
    }
    let wide = edge_group
        .payload
        .aggregations
        .iter()
        .any(|aggregation| aggregation.exceeds_threshold());
    edge_group.toggle_class(EDGE_GROUP_WIDE, wide);
    let visible = !is_filtered_out(&edge_group.classes);
    sync_badges(edge_group, visible);
    true
}
