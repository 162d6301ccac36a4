use super::{Effects, Engine};
use crate::collapse::{self, with_expanded};
use crate::document::GraphDocument;
use crate::format::refresh_display_label;
use crate::host::RenderHost;
use crate::merge::{MergePlan, reconcile_attributes};
use graphedit_core::{AttributeField, ElementId, ElementKind};
use graphedit_events::MergeKind;
use tracing::{info, warn};

impl<H: RenderHost> Engine<H> {
    /// Folds `plan.removed` into `plan.kept`: attributes and label are
    /// reconciled, every edge of the removed node is re-pointed at the kept
    /// one, and the removed node is deleted.
    pub(super) fn execute_merge(&mut self, plan: MergePlan) -> Effects {
        let MergePlan {
            kind,
            removed,
            kept,
        } = plan;
        let node = |id: &ElementId| {
            self.document
                .get(id)
                .filter(|el| el.kind == ElementKind::Node)
                .map(|el| (el.payload.label.clone(), el.payload.attributes.clone()))
        };
        let (Some((removed_label, removed_attrs)), Some((kept_label, kept_attrs))) =
            (node(&removed), node(&kept))
        else {
            warn!(%removed, %kept, "Merge picks are no longer plain nodes");
            self.merge.finish();
            return Effects::skip("merge picks are no longer plain nodes");
        };

        let prefix = self.settings.merged_prefix.clone();
        let mut attributes = reconcile_attributes(kind, &removed_attrs, &kept_attrs, &prefix);
        let label = match kind {
            MergeKind::Full => {
                if !removed_label.is_empty() && removed_label != kept_label {
                    let mut field = AttributeField::new(format!("{prefix}label"), removed_label);
                    while attributes.iter().any(|existing| existing.key == field.key) {
                        field.key = format!("{prefix}{}", field.key);
                    }
                    field.label = field.key.clone();
                    attributes.push(field);
                }
                kept_label
            }
            MergeKind::Left => kept_label,
            MergeKind::Right => removed_label,
        };
        if let Some(element) = self.document.get_mut(&kept) {
            element.payload.attributes = attributes;
            element.payload.label = label;
            refresh_display_label(element);
        }

        let (repointed, removal) = with_expanded(&mut self.document, &removed, |doc| {
            with_expanded(doc, &kept, |doc| rewire(doc, &removed, &kept))
        });
        self.merge.finish();

        let mut effects = self.absorb_removal(removal);
        effects.created.push(kept.clone());
        effects.touch(&kept);
        effects.touched.extend(repointed);
        info!(%removed, %kept, ?kind, "Merged nodes");
        effects
    }
}

/// Re-points the removed node's edges at the kept node, drops the ones that
/// turn into self loops, then deletes the removed node.
fn rewire(
    doc: &mut GraphDocument,
    removed: &ElementId,
    kept: &ElementId,
) -> (Vec<ElementId>, collapse::Removal) {
    let mut repointed = Vec::new();
    let mut loops = Vec::new();
    for edge in doc.all_mut() {
        if !edge.kind.is_edge_like() || !edge.touches(removed) {
            continue;
        }
        for end in [&mut edge.source, &mut edge.target].into_iter().flatten() {
            if end == removed {
                *end = kept.clone();
            }
        }
        if edge.source == edge.target {
            loops.push(edge.id.clone());
        } else {
            repointed.push(edge.id.clone());
        }
    }
    let mut removal = collapse::delete_edges(doc, &loops);
    let node_removal = collapse::delete_nodes(doc, std::slice::from_ref(removed));
    removal.removed.extend(node_removal.removed);
    removal.shrunk_groups.extend(node_removal.shrunk_groups);
    removal.shrunk_bundles.extend(node_removal.shrunk_bundles);
    (repointed, removal)
}

#[cfg(test)]
mod tests {
    use crate::document::GraphDocument;
    use crate::engine::Engine;
    use crate::host::NullHost;
    use crate::merge::MergeState;
    use crate::settings::EngineSettings;
    use graphedit_core::{AttributeField, Element, ElementKind};
    use graphedit_events::{Action, MergeKind};

    fn engine() -> Engine {
        let mut doc = GraphDocument::new();
        for (id, label, value) in [("a", "Alice", "1"), ("b", "Bob", "2"), ("c", "Carol", "3")] {
            let mut element = Element::new(id, ElementKind::Node);
            element.payload.label = label.to_string();
            element
                .payload
                .attributes
                .push(AttributeField::new("id", value));
            doc.insert(element).unwrap();
        }
        for (id, source, target) in [("ab", "a", "b"), ("ac", "a", "c")] {
            let mut edge = Element::new(id, ElementKind::Edge);
            edge.source = Some(source.into());
            edge.target = Some(target.into());
            doc.insert(edge).unwrap();
        }
        let mut engine = Engine::new(NullHost, EngineSettings::default());
        engine.initialize(doc).unwrap();
        engine
    }

    fn pick(engine: &mut Engine, id: &str) {
        engine
            .dispatch(Action::Select {
                ids: vec![id.into()],
                additive: false,
            })
            .unwrap();
    }

    #[test]
    fn full_merge_rewires_edges_and_keeps_both_labels() {
        let mut engine = engine();
        engine
            .dispatch(Action::ArmMerge {
                kind: MergeKind::Full,
            })
            .unwrap();
        pick(&mut engine, "a");
        pick(&mut engine, "b");

        let doc = engine.document();
        assert!(!doc.contains(&"a".into()));
        assert!(!doc.contains(&"ab".into()), "a-b became a self loop");
        let ac = doc.get(&"ac".into()).unwrap();
        assert_eq!(ac.source, Some("b".into()));

        let kept = doc.get(&"b".into()).unwrap();
        assert_eq!(kept.display_label, "Bob");
        let keys: Vec<&str> = kept
            .payload
            .attributes
            .iter()
            .map(|f| f.key.as_str())
            .collect();
        assert_eq!(keys, vec!["id", "_merged_id", "_merged_label"]);
        assert_eq!(engine.merge_state(), &MergeState::Idle);
    }

    #[test]
    fn right_merge_takes_the_removed_label() {
        let mut engine = engine();
        engine
            .dispatch(Action::ArmMerge {
                kind: MergeKind::Right,
            })
            .unwrap();
        pick(&mut engine, "c");
        pick(&mut engine, "b");
        let kept = engine.document().get(&"b".into()).unwrap();
        assert_eq!(kept.payload.label, "Carol");
        assert_eq!(kept.payload.attributes[0].value, "3");
    }
}
