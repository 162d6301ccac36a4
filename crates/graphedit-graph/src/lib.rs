pub mod aggregate;
pub mod classes;
pub mod cluster;
pub mod collapse;
pub mod document;
pub mod engine;
pub mod error;
pub mod filter;
pub mod format;
pub mod frame;
pub mod host;
pub mod index;
pub mod layout;
pub mod merge;
pub mod path;
pub mod selection;
pub mod settings;
pub mod stylesheet;
pub mod template;

pub use cluster::{Cluster, partition};
pub use collapse::{Removal, with_expanded, with_group_open};
pub use document::{GraphDocument, Location};
pub use engine::{Engine, EngineSnapshot};
pub use error::EngineError;
pub use filter::{CompiledFilter, ElementAttributes, FilterSummary, apply_filters, clear_filters};
pub use format::{LoadFailure, LoadReport, format_element, load_document};
pub use frame::{DeferredTask, FrameQueue};
pub use host::{NullHost, RenderHost};
pub use index::AttributeIndex;
pub use layout::{CircleLayouter, GridLayouter, LayoutNode, Layouter, builtin_layouter};
pub use merge::{MergeMachine, MergePlan, MergeState, reconcile_attributes};
pub use path::{GraphPath, shortest_path};
pub use selection::{ElementMaps, ElementView, SelectionDebouncer};
pub use settings::EngineSettings;
pub use stylesheet::{Interned, StylesheetRegistry};
pub use template::render_label;
