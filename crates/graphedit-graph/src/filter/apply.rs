use super::CompiledFilter;
use crate::classes::{
    BADGE_AGGREGATION, BADGE_CONNECTIONS, FILTERED_HIDDEN, FILTERED_TRANSLUCENT, FILTERED_VISIBLE,
};
use crate::document::GraphDocument;
use graphedit_core::{Element, ElementId, ElementKind, Filter};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSummary {
    pub passed: usize,
    pub failed: usize,
    pub touched: Vec<ElementId>,
}

/// Tags every node, group and edge (live or stashed) with a filter class.
///
/// Nodes are judged on their own attributes, groups pass when any descendant
/// node passes, and edges pass only when both endpoints pass. Failing
/// elements lose their badges so nothing draws on top of a faded element.
pub fn apply_filters(doc: &mut GraphDocument, filters: &[Filter]) -> FilterSummary {
    let compiled: Vec<CompiledFilter> = filters
        .iter()
        .map(CompiledFilter::compile)
        .filter(|filter| !filter.is_empty())
        .collect();
    if compiled.is_empty() {
        let touched = clear_filters(doc);
        return FilterSummary {
            touched,
            ..Default::default()
        };
    }

    let failed_class = if compiled.iter().any(|filter| filter.hide_filtered) {
        FILTERED_HIDDEN
    } else {
        FILTERED_TRANSLUCENT
    };
    let verdicts = verdicts(doc, &compiled);

    let mut summary = FilterSummary::default();
    for element in doc.all_mut() {
        let Some(&passed) = verdicts.get(&element.id) else {
            continue;
        };
        set_filter_class(element, if passed { FILTERED_VISIBLE } else { failed_class });
        sync_badges(element, passed);
        if passed {
            summary.passed += 1;
        } else {
            summary.failed += 1;
        }
        summary.touched.push(element.id.clone());
    }
    summary
}

/// Removes every filter class and restores badges. Returns the ids whose
/// classes changed.
pub fn clear_filters(doc: &mut GraphDocument) -> Vec<ElementId> {
    let mut touched = Vec::new();
    for element in doc.all_mut() {
        let before = element.classes.len();
        set_filter_class(element, "");
        if before != element.classes.len() {
            sync_badges(element, true);
            touched.push(element.id.clone());
        }
    }
    touched
}

fn verdicts(doc: &GraphDocument, compiled: &[CompiledFilter]) -> HashMap<ElementId, bool> {
    let passes = |element: &Element| compiled.iter().all(|filter| filter.matches_element(element));

    let mut verdicts: HashMap<ElementId, bool> = doc
        .all()
        .filter(|el| el.kind == ElementKind::Node)
        .map(|el| (el.id.clone(), passes(el)))
        .collect();

    // Deepest groups first, so a parent sees its nested groups' verdicts.
    let mut groups: Vec<(usize, &Element)> = doc
        .all()
        .filter(|el| el.kind == ElementKind::Group)
        .map(|el| (doc.depth(&el.id), el))
        .collect();
    groups.sort_by(|a, b| b.0.cmp(&a.0));
    for (_, group) in groups {
        let children = doc.children(&group.id);
        let passed = if children.is_empty() {
            passes(group)
        } else {
            children
                .iter()
                .any(|child| verdicts.get(&child.id).copied().unwrap_or(false))
        };
        verdicts.insert(group.id.clone(), passed);
    }

    let edge_verdicts: Vec<(ElementId, bool)> = doc
        .all()
        .filter(|el| el.kind.is_edge_like())
        .map(|edge| {
            let endpoint_passes = |end: &Option<ElementId>| {
                end.as_ref()
                    .and_then(|id| verdicts.get(id))
                    .copied()
                    .unwrap_or(true)
            };
            let passed = endpoint_passes(&edge.source) && endpoint_passes(&edge.target);
            (edge.id.clone(), passed)
        })
        .collect();
    verdicts.extend(edge_verdicts);
    verdicts
}

fn set_filter_class(element: &mut Element, class: &str) {
    element.classes.retain(|existing| {
        existing != FILTERED_VISIBLE && existing != FILTERED_TRANSLUCENT && existing != FILTERED_HIDDEN
    });
    if !class.is_empty() {
        element.add_class(class);
    }
}

/// Badges an element is entitled to in its current state.
pub fn sync_badges(element: &mut Element, visible: bool) {
    let aggregation = visible
        && element.kind == ElementKind::EdgeGroup
        && !element.payload.aggregations.is_empty();
    let connections = visible && element.kind == ElementKind::Group && element.collapsed;
    element.toggle_class(BADGE_AGGREGATION, aggregation);
    element.toggle_class(BADGE_CONNECTIONS, connections);
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphedit_core::{AttributeField, AttributeRule, Condition};

    fn person(doc: &mut GraphDocument, id: &str, age: &str, parent: Option<&str>) {
        let mut element = Element::new(id, ElementKind::Node);
        element.parent = parent.map(ElementId::from);
        element
            .payload
            .attributes
            .push(AttributeField::new("age", age));
        doc.insert(element).unwrap();
    }

    fn link(doc: &mut GraphDocument, id: &str, source: &str, target: &str) {
        let mut element = Element::new(id, ElementKind::Edge);
        element.source = Some(source.into());
        element.target = Some(target.into());
        doc.insert(element).unwrap();
    }

    fn over_thirty(hide: bool) -> Filter {
        Filter {
            attributes: vec![AttributeRule::new(
                "age",
                Condition::NumGt {
                    value: "30".to_string(),
                },
            )],
            hide_filtered: hide,
            ..Default::default()
        }
    }

    fn sample() -> GraphDocument {
        let mut doc = GraphDocument::new();
        doc.insert(Element::new("team", ElementKind::Group)).unwrap();
        person(&mut doc, "old", "40", Some("team"));
        person(&mut doc, "young", "20", Some("team"));
        person(&mut doc, "kid", "5", None);
        link(&mut doc, "old-young", "old", "young");
        link(&mut doc, "old-old", "old", "old");
        doc
    }

    fn has(doc: &GraphDocument, id: &str, class: &str) -> bool {
        doc.get(&id.into()).unwrap().has_class(class)
    }

    #[test]
    fn failing_elements_turn_translucent() {
        let mut doc = sample();
        let summary = apply_filters(&mut doc, &[over_thirty(false)]);
        assert_eq!(summary.passed, 3);
        assert_eq!(summary.failed, 3);

        assert!(has(&doc, "old", FILTERED_VISIBLE));
        assert!(has(&doc, "young", FILTERED_TRANSLUCENT));
        assert!(has(&doc, "team", FILTERED_VISIBLE));
        assert!(has(&doc, "kid", FILTERED_TRANSLUCENT));
        assert!(has(&doc, "old-young", FILTERED_TRANSLUCENT));
        assert!(has(&doc, "old-old", FILTERED_VISIBLE));
    }

    #[test]
    fn hide_filtered_uses_hidden_class_and_drops_badges() {
        let mut doc = sample();
        doc.insert(Element::new("kids", ElementKind::Group)).unwrap();
        doc.get_mut(&"kid".into()).unwrap().parent = Some("kids".into());
        doc.collapse(&"kids".into()).unwrap();
        assert!(has(&doc, "kids", BADGE_CONNECTIONS));

        apply_filters(&mut doc, &[over_thirty(true)]);
        assert!(has(&doc, "kids", FILTERED_HIDDEN));
        assert!(has(&doc, "kid", FILTERED_HIDDEN));
        assert!(!has(&doc, "kids", BADGE_CONNECTIONS));

        let touched = clear_filters(&mut doc);
        assert_eq!(touched.len(), 7);
        assert!(has(&doc, "kids", BADGE_CONNECTIONS));
        assert!(!has(&doc, "kid", FILTERED_HIDDEN));
    }

    #[test]
    fn empty_filters_clear() {
        let mut doc = sample();
        apply_filters(&mut doc, &[over_thirty(false)]);
        let summary = apply_filters(&mut doc, &[Filter::default()]);
        assert_eq!(summary.passed + summary.failed, 0);
        assert_eq!(summary.touched.len(), 6);
        assert!(doc.all().all(|el| el.classes.is_empty()));
    }
}
