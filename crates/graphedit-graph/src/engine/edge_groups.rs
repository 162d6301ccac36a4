use super::{Effects, Engine};
use crate::aggregate::refresh_edge_group;
use crate::collapse::with_expanded;
use crate::error::EngineError;
use crate::host::RenderHost;
use graphedit_core::{Aggregation, Element, ElementId, ElementKind};
use tracing::debug;
use uuid::Uuid;

impl<H: RenderHost> Engine<H> {
    fn is_edge_group(&self, id: &ElementId) -> bool {
        self.document
            .get(id)
            .is_some_and(|el| el.kind == ElementKind::EdgeGroup)
    }

    /// Bundles every live plain edge between `source` and `target`, in either
    /// direction, under a new edge group.
    pub(super) fn add_edge_group(
        &mut self,
        source: &ElementId,
        target: &ElementId,
        aggregations: Vec<Aggregation>,
    ) -> Result<Effects, EngineError> {
        let connects = |el: &Element| {
            let (Some(s), Some(t)) = (&el.source, &el.target) else {
                return false;
            };
            (s == source && t == target) || (s == target && t == source)
        };
        let members: Vec<ElementId> = self
            .document
            .live()
            .filter(|el| el.kind == ElementKind::Edge && connects(el))
            .map(|el| el.id.clone())
            .collect();
        if members.len() < 2 {
            return Ok(Effects::skip("an edge group needs two parallel edges"));
        }

        let id = ElementId::new(Uuid::new_v4().to_string());
        let mut edge_group = Element::new(id.clone(), ElementKind::EdgeGroup);
        edge_group.source = Some(source.clone());
        edge_group.target = Some(target.clone());
        edge_group.payload.aggregations = aggregations;
        self.document.bundle(edge_group, &members)?;
        refresh_edge_group(&mut self.document, &id);
        debug!(edge_group = %id, members = members.len(), "Bundled parallel edges");

        Ok(Effects {
            created: vec![id.clone()],
            touched: std::iter::once(id).chain(members).collect(),
            ..Default::default()
        })
    }

    pub(super) fn change_edge_group(
        &mut self,
        id: &ElementId,
        aggregations: Vec<Aggregation>,
    ) -> Effects {
        let Some(edge_group) = self
            .document
            .get_mut(id)
            .filter(|el| el.kind == ElementKind::EdgeGroup)
        else {
            return Effects::skip("not an edge group");
        };
        edge_group.payload.aggregations = aggregations;
        refresh_edge_group(&mut self.document, id);
        Effects::touching([id])
    }

    /// Dissolves an edge group, restoring its members where it lived.
    pub(super) fn delete_edge_group(&mut self, id: &ElementId) -> Effects {
        if !self.is_edge_group(id) {
            return Effects::skip("not an edge group");
        }
        match with_expanded(&mut self.document, id, |doc| doc.unbundle(id)) {
            Some(members) => Effects {
                touched: members,
                removed: vec![id.clone()],
                ..Default::default()
            },
            None => Effects::skip("edge group has no member table"),
        }
    }
}
