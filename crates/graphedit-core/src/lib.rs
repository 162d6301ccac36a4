use serde::{Deserialize, Serialize};
use std::fmt;

pub mod aggregation;
pub mod attribute;
pub mod error;
pub mod filter;
pub mod style;

pub use aggregation::{Aggregation, AggregationFn};
pub use attribute::{AttributeField, FormatVariant};
pub use error::{DocumentError, FilterError};
pub use filter::{
    AttributeRule, Condition, ConditionStyle, DashboardField, DashboardFilter, DashboardRule,
    Filter,
};
pub use style::{StyleObject, StylesheetEntry};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ElementId(pub String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ElementId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Node,
    Edge,
    /// Compound node that owns other nodes.
    Group,
    /// Edge that stands in for a bundle of parallel edges.
    EdgeGroup,
    /// Free-form annotation; never part of selection or filter projections.
    Drawing,
}

impl ElementKind {
    pub fn is_node_like(self) -> bool {
        matches!(self, ElementKind::Node | ElementKind::Group)
    }

    pub fn is_edge_like(self) -> bool {
        matches!(self, ElementKind::Edge | ElementKind::EdgeGroup)
    }

    pub fn category(self) -> Option<Category> {
        match self {
            ElementKind::Node => Some(Category::Node),
            ElementKind::Edge => Some(Category::Edge),
            ElementKind::Group => Some(Category::NodeGroup),
            ElementKind::EdgeGroup => Some(Category::EdgeGroup),
            ElementKind::Drawing => None,
        }
    }
}

/// The four buckets the UI-facing selection and hidden maps are split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Node,
    Edge,
    NodeGroup,
    EdgeGroup,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Domain attributes of an element, as authored by the user or the data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payload {
    pub label: String,
    pub label_template: Option<String>,
    /// Type id shared by elements of the same kind ("system id").
    pub system_id: Option<String>,
    pub attributes: Vec<AttributeField>,
    /// User style overrides; interned into the stylesheet on write.
    pub style: StyleObject,
    pub icon: Option<String>,
    pub aggregations: Vec<Aggregation>,
}

impl Payload {
    pub fn attribute(&self, key: &str) -> Option<&AttributeField> {
        self.attributes.iter().find(|field| field.key == key)
    }

    pub fn attribute_mut(&mut self, key: &str) -> Option<&mut AttributeField> {
        self.attributes.iter_mut().find(|field| field.key == key)
    }

    pub fn has_template(&self) -> bool {
        self.label_template
            .as_deref()
            .is_some_and(|template| !template.trim().is_empty())
    }
}

/// A live document element: domain payload plus presentation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    pub payload: Payload,
    /// Label shown on canvas; derived from the template when one is set.
    pub display_label: String,
    pub classes: Vec<String>,
    pub position: Position,
    pub z_index: i32,
    pub parent: Option<ElementId>,
    pub source: Option<ElementId>,
    pub target: Option<ElementId>,
    pub selected: bool,
    pub hidden: bool,
    pub collapsed: bool,
}

impl Element {
    pub fn new(id: impl Into<ElementId>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            kind,
            payload: Payload::default(),
            display_label: String::new(),
            classes: Vec::new(),
            position: Position::default(),
            z_index: 0,
            parent: None,
            source: None,
            target: None,
            selected: false,
            hidden: false,
            collapsed: false,
        }
    }

    pub fn category(&self) -> Option<Category> {
        self.kind.category()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Adds a class once; returns whether it was newly added.
    pub fn add_class(&mut self, class: &str) -> bool {
        if self.has_class(class) {
            return false;
        }
        self.classes.push(class.to_string());
        true
    }

    pub fn remove_class(&mut self, class: &str) -> bool {
        let before = self.classes.len();
        self.classes.retain(|c| c != class);
        before != self.classes.len()
    }

    pub fn toggle_class(&mut self, class: &str, on: bool) {
        if on {
            self.add_class(class);
        } else {
            self.remove_class(class);
        }
    }

    pub fn touches(&self, node: &ElementId) -> bool {
        self.source.as_ref() == Some(node) || self.target.as_ref() == Some(node)
    }
}

/// Unformatted element as it arrives from a data source or an add action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawElement {
    pub id: Option<ElementId>,
    pub kind: Option<ElementKind>,
    pub payload: Payload,
    pub position: Option<Position>,
    pub parent: Option<ElementId>,
    pub source: Option<ElementId>,
    pub target: Option<ElementId>,
    pub classes: Vec<String>,
}

/// Input for document initialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphData {
    pub nodes: Vec<RawElement>,
    pub edges: Vec<RawElement>,
}
