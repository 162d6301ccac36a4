use super::{Effects, Engine, Family};
use crate::aggregate::refresh_edge_group;
use crate::document::Location;
use crate::format::refresh_display_label;
use crate::host::RenderHost;
use graphedit_core::{AttributeField, Element, ElementId};
use tracing::debug;

impl<H: RenderHost> Engine<H> {
    /// Adds the attribute to every target that does not have the key yet.
    pub(super) fn add_attribute(
        &mut self,
        ids: &[ElementId],
        field: AttributeField,
        family: Family,
        apply_to_type: bool,
    ) -> Effects {
        if field.key.trim().is_empty() {
            return Effects::skip("attribute key is blank");
        }
        self.edit_attributes(ids, family, apply_to_type, |element| {
            if element.payload.attribute(&field.key).is_some() {
                debug!(element = %element.id, key = %field.key, "Attribute already present");
                return false;
            }
            element.payload.attributes.push(field.clone());
            true
        })
        .or_skip("no target accepted the attribute")
    }

    /// Replaces the attribute named `key`. The replacement may rename it as
    /// long as the new key is free.
    pub(super) fn change_attribute(
        &mut self,
        ids: &[ElementId],
        key: &str,
        field: AttributeField,
        family: Family,
        apply_to_type: bool,
    ) -> Effects {
        if field.key.trim().is_empty() {
            return Effects::skip("attribute key is blank");
        }
        self.edit_attributes(ids, family, apply_to_type, |element| {
            let renamed = field.key != key;
            if renamed && element.payload.attribute(&field.key).is_some() {
                debug!(element = %element.id, key = %field.key, "Attribute rename collides");
                return false;
            }
            match element.payload.attribute_mut(key) {
                Some(existing) => {
                    *existing = field.clone();
                    true
                }
                None => false,
            }
        })
        .or_skip("no target has the attribute")
    }

    pub(super) fn delete_attribute(
        &mut self,
        ids: &[ElementId],
        key: &str,
        family: Family,
        apply_to_type: bool,
    ) -> Effects {
        self.edit_attributes(ids, family, apply_to_type, |element| {
            let before = element.payload.attributes.len();
            element.payload.attributes.retain(|field| field.key != key);
            before != element.payload.attributes.len()
        })
        .or_skip("no target has the attribute")
    }

    /// Runs `edit` on each target, re-rendering labels of the ones it
    /// changed and re-aggregating edge groups whose members changed.
    fn edit_attributes(
        &mut self,
        ids: &[ElementId],
        family: Family,
        apply_to_type: bool,
        mut edit: impl FnMut(&mut Element) -> bool,
    ) -> Effects {
        let targets = self.resolve_targets(ids, family, apply_to_type);
        let mut effects = Effects::default();
        for id in &targets {
            let Some(element) = self.document.get_mut(id) else {
                continue;
            };
            if edit(element) {
                refresh_display_label(element);
                effects.touch(id);
            }
        }

        let mut bundles: Vec<ElementId> = effects
            .touched
            .iter()
            .filter_map(|id| match self.document.locate(id) {
                Some(Location::BundledIn(edge_group)) => Some(edge_group),
                _ => None,
            })
            .collect();
        bundles.sort();
        bundles.dedup();
        for edge_group in bundles {
            refresh_edge_group(&mut self.document, &edge_group);
            effects.touch(&edge_group);
        }
        self.schedule_recollapse(&effects.touched);
        effects
    }
}
