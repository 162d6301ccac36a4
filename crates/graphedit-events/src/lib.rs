use graphedit_core::{
    Aggregation, AttributeField, ConditionStyle, ElementId, Filter, RawElement, StyleObject,
};
use serde::{Deserialize, Serialize};

pub mod queue;
pub mod telemetry;

pub use queue::{ActionCallback, ActionEnvelope, ActionListener, ActionQueue, DispatchOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LayoutAlgorithm {
    #[default]
    ForceDirected,
    Radial,
    Grid,
    Hierarchical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignMode {
    Left,
    Right,
    Top,
    Bottom,
    CenterHorizontal,
    CenterVertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeKind {
    /// Keep everything; colliding keys of the removed node are renamed.
    Full,
    /// The kept node wins collisions.
    Left,
    /// The removed node wins collisions.
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterBy {
    SystemId,
    Attribute { key: String },
    Connectivity,
}

/// Field-level edit of an element's payload. `None` leaves a field untouched;
/// an empty `label_template` clears the template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementChanges {
    pub label: Option<String>,
    pub label_template: Option<String>,
    pub icon: Option<String>,
    pub system_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Action {
    // ========================================================================
    // Nodes
    // ========================================================================
    AddNode {
        element: RawElement,
    },
    ChangeNode {
        id: ElementId,
        changes: ElementChanges,
    },
    ChangeNodeStyle {
        ids: Vec<ElementId>,
        style: StyleObject,
        /// Also restyle every node sharing the type id of the targets.
        apply_to_type: bool,
    },
    DeleteNodes {
        ids: Vec<ElementId>,
    },
    AddNodeAttribute {
        ids: Vec<ElementId>,
        field: AttributeField,
        apply_to_type: bool,
    },
    ChangeNodeAttribute {
        ids: Vec<ElementId>,
        key: String,
        field: AttributeField,
        apply_to_type: bool,
    },
    DeleteNodeAttribute {
        ids: Vec<ElementId>,
        key: String,
        apply_to_type: bool,
    },

    // ========================================================================
    // Edges
    // ========================================================================
    AddEdge {
        element: RawElement,
    },
    ChangeEdge {
        id: ElementId,
        changes: ElementChanges,
    },
    ChangeEdgeStyle {
        ids: Vec<ElementId>,
        style: StyleObject,
        apply_to_type: bool,
    },
    DeleteEdges {
        ids: Vec<ElementId>,
    },
    AddEdgeAttribute {
        ids: Vec<ElementId>,
        field: AttributeField,
        apply_to_type: bool,
    },
    ChangeEdgeAttribute {
        ids: Vec<ElementId>,
        key: String,
        field: AttributeField,
        apply_to_type: bool,
    },
    DeleteEdgeAttribute {
        ids: Vec<ElementId>,
        key: String,
        apply_to_type: bool,
    },

    // ========================================================================
    // Node groups
    // ========================================================================
    /// Groups the currently selected, ungrouped nodes.
    AddNodeGroup {
        label: Option<String>,
    },
    ChangeNodeGroup {
        id: ElementId,
        changes: ElementChanges,
        style: Option<StyleObject>,
    },
    /// Dissolves the group; children move to the group's parent.
    DeleteNodeGroup {
        id: ElementId,
    },
    RemoveFromGroup {
        ids: Vec<ElementId>,
    },
    CollapseNodeGroup {
        id: ElementId,
    },
    ExpandNodeGroup {
        id: ElementId,
    },
    CollapseAllGroups,
    ExpandAllGroups,

    // ========================================================================
    // Edge groups
    // ========================================================================
    AddEdgeGroup {
        source: ElementId,
        target: ElementId,
        aggregations: Vec<Aggregation>,
    },
    ChangeEdgeGroup {
        id: ElementId,
        aggregations: Vec<Aggregation>,
    },
    DeleteEdgeGroup {
        id: ElementId,
    },

    AddDrawing {
        element: RawElement,
    },

    // ========================================================================
    // Filters and condition styles
    // ========================================================================
    ApplyFilters {
        filters: Vec<Filter>,
    },
    ClearFilters,
    ApplyConditionStyle {
        style: ConditionStyle,
    },
    ChangeConditionStyle {
        selector: String,
        style: ConditionStyle,
    },
    DeleteConditionStyle {
        selector: String,
    },

    // ========================================================================
    // Arrangement
    // ========================================================================
    Layout {
        algorithm: LayoutAlgorithm,
    },
    Align {
        mode: AlignMode,
    },
    BringToFront {
        ids: Vec<ElementId>,
    },
    SendToBack {
        ids: Vec<ElementId>,
    },
    Cluster {
        by: ClusterBy,
    },

    // ========================================================================
    // Visibility and selection
    // ========================================================================
    Hide {
        ids: Vec<ElementId>,
    },
    Show {
        ids: Vec<ElementId>,
    },
    ShowAll,
    Select {
        ids: Vec<ElementId>,
        additive: bool,
    },
    Unselect {
        ids: Vec<ElementId>,
    },
    SelectAll,

    // ========================================================================
    // Viewport and analysis (read-only)
    // ========================================================================
    Zoom {
        level: f64,
    },
    Center {
        ids: Vec<ElementId>,
    },
    Refresh,
    ShortestPath {
        source: ElementId,
        target: ElementId,
        weight_attribute: Option<String>,
    },

    // ========================================================================
    // Merge mode
    // ========================================================================
    ArmMerge {
        kind: MergeKind,
    },
    DisarmMerge,
}

impl Action {
    /// Stable name used in telemetry.
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddNode { .. } => "AddNode",
            Action::ChangeNode { .. } => "ChangeNode",
            Action::ChangeNodeStyle { .. } => "ChangeNodeStyle",
            Action::DeleteNodes { .. } => "DeleteNodes",
            Action::AddNodeAttribute { .. } => "AddNodeAttribute",
            Action::ChangeNodeAttribute { .. } => "ChangeNodeAttribute",
            Action::DeleteNodeAttribute { .. } => "DeleteNodeAttribute",
            Action::AddEdge { .. } => "AddEdge",
            Action::ChangeEdge { .. } => "ChangeEdge",
            Action::ChangeEdgeStyle { .. } => "ChangeEdgeStyle",
            Action::DeleteEdges { .. } => "DeleteEdges",
            Action::AddEdgeAttribute { .. } => "AddEdgeAttribute",
            Action::ChangeEdgeAttribute { .. } => "ChangeEdgeAttribute",
            Action::DeleteEdgeAttribute { .. } => "DeleteEdgeAttribute",
            Action::AddNodeGroup { .. } => "AddNodeGroup",
            Action::ChangeNodeGroup { .. } => "ChangeNodeGroup",
            Action::DeleteNodeGroup { .. } => "DeleteNodeGroup",
            Action::RemoveFromGroup { .. } => "RemoveFromGroup",
            Action::CollapseNodeGroup { .. } => "CollapseNodeGroup",
            Action::ExpandNodeGroup { .. } => "ExpandNodeGroup",
            Action::CollapseAllGroups => "CollapseAllGroups",
            Action::ExpandAllGroups => "ExpandAllGroups",
            Action::AddEdgeGroup { .. } => "AddEdgeGroup",
            Action::ChangeEdgeGroup { .. } => "ChangeEdgeGroup",
            Action::DeleteEdgeGroup { .. } => "DeleteEdgeGroup",
            Action::AddDrawing { .. } => "AddDrawing",
            Action::ApplyFilters { .. } => "ApplyFilters",
            Action::ClearFilters => "ClearFilters",
            Action::ApplyConditionStyle { .. } => "ApplyConditionStyle",
            Action::ChangeConditionStyle { .. } => "ChangeConditionStyle",
            Action::DeleteConditionStyle { .. } => "DeleteConditionStyle",
            Action::Layout { .. } => "Layout",
            Action::Align { .. } => "Align",
            Action::BringToFront { .. } => "BringToFront",
            Action::SendToBack { .. } => "SendToBack",
            Action::Cluster { .. } => "Cluster",
            Action::Hide { .. } => "Hide",
            Action::Show { .. } => "Show",
            Action::ShowAll => "ShowAll",
            Action::Select { .. } => "Select",
            Action::Unselect { .. } => "Unselect",
            Action::SelectAll => "SelectAll",
            Action::Zoom { .. } => "Zoom",
            Action::Center { .. } => "Center",
            Action::Refresh => "Refresh",
            Action::ShortestPath { .. } => "ShortestPath",
            Action::ArmMerge { .. } => "ArmMerge",
            Action::DisarmMerge => "DisarmMerge",
        }
    }

    /// Actions that never mark the document as having unsaved changes.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Action::Refresh
                | Action::Center { .. }
                | Action::SelectAll
                | Action::Zoom { .. }
                | Action::ShortestPath { .. }
        )
    }
}
