use crate::layout::LayoutNode;
use graphedit_core::{ElementId, Position, StylesheetEntry};
use graphedit_events::LayoutAlgorithm;
use std::collections::HashMap;

/// The rendering side of the editor. The engine owns document state; the host
/// draws it. Every method has a no-op default so headless hosts stay small.
pub trait RenderHost {
    /// Opens a batch; the host should defer redraws until [`Self::end_batch`].
    fn start_batch(&mut self) {}

    fn end_batch(&mut self) {}

    /// Installs the complete stylesheet, replacing the previous one.
    fn apply_stylesheet(&mut self, _entries: &[StylesheetEntry]) {}

    /// Runs a layout. `None` means the host does not implement the algorithm
    /// and the engine should fall back to a built-in one.
    fn run_layout(
        &mut self,
        _algorithm: LayoutAlgorithm,
        _nodes: &[LayoutNode],
    ) -> Option<HashMap<ElementId, Position>> {
        None
    }

    fn zoom(&mut self, _level: f64) {}

    fn center(&mut self, _ids: &[ElementId]) {}

    fn refresh(&mut self) {}
}

/// Host for headless use.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHost;

impl RenderHost for NullHost {}
