use crate::classes;
use crate::document::GraphDocument;
use crate::template::render_label;
use graphedit_core::{DocumentError, Element, ElementId, ElementKind, GraphData, Payload, RawElement};
use tracing::warn;

/// The label drawn on canvas: the rendered template when one is set, the
/// plain label otherwise.
pub fn derive_display_label(payload: &Payload) -> String {
    match payload.label_template.as_deref() {
        Some(template) if !template.trim().is_empty() => {
            render_label(template, &payload.attributes)
        }
        _ => payload.label.clone(),
    }
}

pub fn refresh_display_label(element: &mut Element) {
    element.display_label = derive_display_label(&element.payload);
}

/// Replaces the icon and its `icon-*` class together.
pub fn set_icon(element: &mut Element, icon: Option<String>) {
    element
        .classes
        .retain(|class| !class.starts_with(classes::ICON_PREFIX));
    let icon = icon.filter(|icon| !icon.trim().is_empty());
    if let Some(icon) = icon.as_deref() {
        element.add_class(&classes::icon_class(icon.trim()));
    }
    element.payload.icon = icon;
}

pub fn format_element(
    raw: RawElement,
    default_kind: ElementKind,
) -> Result<Element, DocumentError> {
    let id = raw
        .id
        .filter(|id| !id.is_empty())
        .ok_or(DocumentError::MissingId)?;
    let kind = raw.kind.unwrap_or(default_kind);
    if kind.is_edge_like() {
        for endpoint in [&raw.source, &raw.target] {
            if endpoint.as_ref().is_none_or(ElementId::is_empty) {
                return Err(DocumentError::MissingEndpoint {
                    edge: id,
                    endpoint: endpoint.clone().unwrap_or_default(),
                });
            }
        }
    }

    let mut element = Element::new(id, kind);
    for class in &raw.classes {
        element.add_class(class);
    }
    element.position = raw.position.unwrap_or_default();
    if kind.is_node_like() {
        element.parent = raw.parent.filter(|parent| !parent.is_empty());
    }
    if kind.is_edge_like() {
        element.source = raw.source;
        element.target = raw.target;
    }
    let icon = raw.payload.icon.clone();
    element.payload = raw.payload;
    set_icon(&mut element, icon);
    refresh_display_label(&mut element);
    Ok(element)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub id: Option<ElementId>,
    pub error: DocumentError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, id: Option<ElementId>, result: Result<(), DocumentError>) {
        match result {
            Ok(()) => self.loaded += 1,
            Err(error) => {
                warn!(element = ?id, error = %error, "Skipping element that failed to load");
                self.failures.push(LoadFailure { id, error });
            }
        }
    }
}

/// Builds a document from raw data. One bad element never aborts the load;
/// it is logged and reported instead.
pub fn load_document(data: GraphData) -> (GraphDocument, LoadReport) {
    let mut doc = GraphDocument::new();
    let mut report = LoadReport::default();

    for raw in data.nodes {
        let id = raw.id.clone();
        let result = format_element(raw, ElementKind::Node).and_then(|el| doc.insert(el));
        report.record(id, result);
    }

    let orphaned: Vec<ElementId> = doc
        .live()
        .filter(|el| {
            el.parent.as_ref().is_some_and(|parent| {
                !doc
                    .get_live(parent)
                    .is_some_and(|group| group.kind == ElementKind::Group)
            })
        })
        .map(|el| el.id.clone())
        .collect();
    for id in orphaned {
        warn!(element = %id, "Dropping parent reference to a missing group");
        if let Some(element) = doc.get_live_mut(&id) {
            element.parent = None;
        }
    }

    for raw in data.edges {
        let id = raw.id.clone();
        let result = format_element(raw, ElementKind::Edge).and_then(|edge| {
            for endpoint in [&edge.source, &edge.target].into_iter().flatten() {
                let is_node = doc
                    .get_live(endpoint)
                    .is_some_and(|el| el.kind.is_node_like());
                if !is_node {
                    return Err(DocumentError::MissingEndpoint {
                        edge: edge.id.clone(),
                        endpoint: endpoint.clone(),
                    });
                }
            }
            doc.insert(edge)
        });
        report.record(id, result);
    }

    (doc, report)
}
