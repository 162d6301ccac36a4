//! The action dispatcher.
//!
//! Every edit to the graph arrives as an [`Action`] and runs synchronously to
//! completion inside a host batch. Actions dispatched before the document is
//! installed wait in an [`ActionQueue`] and replay in order on
//! [`Engine::initialize`]. After each handler the engine brings the derived
//! state back in line: filter and condition-style classes, the selection and
//! hidden maps, the attribute index and the stylesheet.

mod arrange;
mod attributes;
mod edge_groups;
mod elements;
mod filters;
mod groups;
mod merging;
mod view;

use crate::aggregate::refresh_edge_group;
use crate::collapse::Removal;
use crate::document::{GraphDocument, Location};
use crate::error::EngineError;
use crate::filter::{apply_filters, clear_filters};
use crate::format::{LoadReport, load_document};
use crate::frame::{DeferredTask, FrameQueue};
use crate::host::{NullHost, RenderHost};
use crate::index::AttributeIndex;
use crate::merge::{MergeMachine, MergeState};
use crate::selection::{ElementMaps, SelectionDebouncer};
use crate::settings::EngineSettings;
use crate::stylesheet::StylesheetRegistry;
use graphedit_core::{
    Condition, ConditionStyle, DashboardFilter, ElementId, ElementKind, Filter, FilterError,
    GraphData, StylesheetEntry,
};
use graphedit_events::{
    Action, ActionEnvelope, ActionListener, ActionQueue, DispatchOutcome, telemetry,
};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{error, info, warn};

use elements::Family;

/// What a handler changed. `skipped` carries the reason when a precondition
/// did not hold and nothing was done.
#[derive(Debug, Default)]
pub(crate) struct Effects {
    created: Vec<ElementId>,
    touched: Vec<ElementId>,
    removed: Vec<ElementId>,
    /// Filter classes must be recomputed even if nothing else changed.
    refilter: bool,
    skipped: Option<&'static str>,
}

impl Effects {
    fn skip(reason: &'static str) -> Self {
        Self {
            skipped: Some(reason),
            ..Default::default()
        }
    }

    fn touching<'a>(ids: impl IntoIterator<Item = &'a ElementId>) -> Self {
        Self {
            touched: ids.into_iter().cloned().collect(),
            ..Default::default()
        }
    }

    fn touch(&mut self, id: &ElementId) {
        self.touched.push(id.clone());
    }

    fn has_changes(&self) -> bool {
        !(self.created.is_empty() && self.touched.is_empty() && self.removed.is_empty())
    }

    fn or_skip(mut self, reason: &'static str) -> Self {
        if !self.has_changes() && !self.refilter {
            self.skipped = Some(reason);
        }
        self
    }

    fn merge(&mut self, other: Effects) {
        self.created.extend(other.created);
        self.touched.extend(other.touched);
        self.removed.extend(other.removed);
        self.refilter |= other.refilter;
    }

    fn dedup(&mut self) {
        for list in [&mut self.created, &mut self.touched, &mut self.removed] {
            let mut seen = HashSet::new();
            list.retain(|id| seen.insert(id.clone()));
        }
        let removed: HashSet<ElementId> = self.removed.iter().cloned().collect();
        self.touched.retain(|id| !removed.contains(id));
    }
}

/// Borrowed read-only view for panels and inspectors.
#[derive(Debug)]
pub struct EngineSnapshot<'a> {
    pub selection: &'a ElementMaps,
    pub hidden: &'a ElementMaps,
    pub stylesheet: Vec<StylesheetEntry>,
    pub index: &'a AttributeIndex,
    pub merge_state: &'a MergeState,
    pub groupable_selection: bool,
    pub unsaved_changes: bool,
}

pub struct Engine<H: RenderHost = NullHost> {
    host: H,
    settings: EngineSettings,
    document: GraphDocument,
    ready: bool,
    queue: ActionQueue,
    stylesheet: StylesheetRegistry,
    selection: ElementMaps,
    hidden: ElementMaps,
    index: AttributeIndex,
    merge: MergeMachine,
    frames: FrameQueue,
    debounce: SelectionDebouncer,
    active_filters: Vec<Filter>,
    condition_styles: Vec<ConditionStyle>,
    groupable_selection: bool,
    unsaved: bool,
}

impl<H: RenderHost> Engine<H> {
    pub fn new(host: H, settings: EngineSettings) -> Self {
        Self {
            stylesheet: StylesheetRegistry::new(settings.user_style_prefix.clone()),
            debounce: SelectionDebouncer::new(settings.selection_debounce()),
            host,
            settings,
            document: GraphDocument::new(),
            ready: false,
            queue: ActionQueue::new(),
            selection: ElementMaps::default(),
            hidden: ElementMaps::default(),
            index: AttributeIndex::default(),
            merge: MergeMachine::new(),
            frames: FrameQueue::new(),
            active_filters: Vec::new(),
            condition_styles: Vec::new(),
            groupable_selection: false,
            unsaved: false,
        }
    }

    /// Installs the document and replays queued actions in arrival order.
    /// Returns the number of replayed actions.
    ///
    /// More queued actions than `max_pending_actions` means the document was
    /// never going to arrive in time: the queue is discarded and nothing is
    /// installed.
    pub fn initialize(&mut self, document: GraphDocument) -> Result<usize, EngineError> {
        let pending = self.queue.len();
        let limit = self.settings.max_pending_actions;
        if pending > limit {
            let discarded = self.queue.clear();
            error!(pending, limit, discarded, "Action queue overflowed before initialization");
            return Err(EngineError::QueueOverflow { pending, limit });
        }

        self.document = document;
        self.merge = MergeMachine::new();
        self.frames = FrameQueue::new();
        self.intern_document_styles();
        self.rebuild_projections();
        self.ready = true;
        info!(
            elements = self.document.element_count(),
            pending, "Graph document initialized"
        );

        let queue = self.queue.clone();
        Ok(queue.drain_to(self, limit))
    }

    /// Formats raw data into a document, then initializes with it.
    pub fn initialize_from_data(&mut self, data: GraphData) -> Result<LoadReport, EngineError> {
        let (document, report) = load_document(data);
        if !report.is_clean() {
            warn!(
                loaded = report.loaded,
                failed = report.failures.len(),
                "Some elements failed to load"
            );
        }
        self.initialize(document)?;
        Ok(report)
    }

    /// Runs the action now, or queues it when the document is not ready yet
    /// (returning `Ok(None)`).
    pub fn dispatch(
        &mut self,
        envelope: impl Into<ActionEnvelope>,
    ) -> Result<Option<DispatchOutcome>, EngineError> {
        let envelope = envelope.into();
        if !self.ready {
            telemetry::action_queued(
                envelope.action.name(),
                &envelope.correlation_id,
                self.queue.len() + 1,
            );
            self.queue.push(envelope);
            return Ok(None);
        }
        self.run(envelope).map(Some)
    }

    fn run(&mut self, envelope: ActionEnvelope) -> Result<DispatchOutcome, EngineError> {
        let ActionEnvelope {
            correlation_id,
            action,
            callback,
        } = envelope;
        let name = action.name();
        let read_only = action.is_read_only();
        let defers_selection = matches!(
            action,
            Action::Select { .. }
                | Action::Unselect { .. }
                | Action::SelectAll
                | Action::ShortestPath { .. }
        );

        telemetry::action_start(name, &correlation_id);
        let started = Instant::now();
        self.host.start_batch();
        let result = self
            .apply(action)
            .map(|effects| self.settle(effects, defers_selection));
        self.host.end_batch();

        let effects = match result {
            Ok(effects) => effects,
            Err(err) => {
                telemetry::action_failure(name, &correlation_id, Some(err.to_string()));
                return Err(err);
            }
        };
        if let Some(reason) = effects.skipped {
            telemetry::precondition_skipped(name, &correlation_id, reason);
        }
        if !read_only {
            self.unsaved = true;
        }
        telemetry::action_success(
            name,
            &correlation_id,
            Some(started.elapsed().as_micros()),
        );

        let outcome = DispatchOutcome {
            action: name,
            correlation_id,
            created: effects.created,
            touched: effects.touched,
        };
        if let Some(callback) = callback {
            callback(&outcome);
        }
        Ok(outcome)
    }

    fn apply(&mut self, action: Action) -> Result<Effects, EngineError> {
        let effects = match action {
            Action::AddNode { element } => self.add_element(element, ElementKind::Node)?,
            Action::ChangeNode { id, changes } => {
                self.change_element(&id, &changes, Family::Node)
            }
            Action::ChangeNodeStyle {
                ids,
                style,
                apply_to_type,
            } => self.change_style(&ids, &style, Family::Node, apply_to_type),
            Action::DeleteNodes { ids } => self.delete_nodes(&ids),
            Action::AddNodeAttribute {
                ids,
                field,
                apply_to_type,
            } => self.add_attribute(&ids, field, Family::Node, apply_to_type),
            Action::ChangeNodeAttribute {
                ids,
                key,
                field,
                apply_to_type,
            } => self.change_attribute(&ids, &key, field, Family::Node, apply_to_type),
            Action::DeleteNodeAttribute {
                ids,
                key,
                apply_to_type,
            } => self.delete_attribute(&ids, &key, Family::Node, apply_to_type),

            Action::AddEdge { element } => self.add_element(element, ElementKind::Edge)?,
            Action::ChangeEdge { id, changes } => {
                self.change_element(&id, &changes, Family::Edge)
            }
            Action::ChangeEdgeStyle {
                ids,
                style,
                apply_to_type,
            } => self.change_style(&ids, &style, Family::Edge, apply_to_type),
            Action::DeleteEdges { ids } => self.delete_edges(&ids),
            Action::AddEdgeAttribute {
                ids,
                field,
                apply_to_type,
            } => self.add_attribute(&ids, field, Family::Edge, apply_to_type),
            Action::ChangeEdgeAttribute {
                ids,
                key,
                field,
                apply_to_type,
            } => self.change_attribute(&ids, &key, field, Family::Edge, apply_to_type),
            Action::DeleteEdgeAttribute {
                ids,
                key,
                apply_to_type,
            } => self.delete_attribute(&ids, &key, Family::Edge, apply_to_type),

            Action::AddNodeGroup { label } => self.add_node_group(label)?,
            Action::ChangeNodeGroup { id, changes, style } => {
                self.change_node_group(&id, &changes, style)
            }
            Action::DeleteNodeGroup { id } => self.delete_node_group(&id),
            Action::RemoveFromGroup { ids } => self.remove_from_group(&ids),
            Action::CollapseNodeGroup { id } => self.collapse_group(&id),
            Action::ExpandNodeGroup { id } => self.expand_group(&id),
            Action::CollapseAllGroups => self.collapse_all_groups(),
            Action::ExpandAllGroups => self.expand_all_groups(),

            Action::AddEdgeGroup {
                source,
                target,
                aggregations,
            } => self.add_edge_group(&source, &target, aggregations)?,
            Action::ChangeEdgeGroup { id, aggregations } => {
                self.change_edge_group(&id, aggregations)
            }
            Action::DeleteEdgeGroup { id } => self.delete_edge_group(&id),
            Action::AddDrawing { element } => {
                self.add_element(element, ElementKind::Drawing)?
            }

            Action::ApplyFilters { filters } => self.apply_filter_set(filters),
            Action::ClearFilters => self.clear_filter_set(),
            Action::ApplyConditionStyle { style } => self.apply_condition_style(style),
            Action::ChangeConditionStyle { selector, style } => {
                self.change_condition_style(&selector, style)
            }
            Action::DeleteConditionStyle { selector } => self.delete_condition_style(&selector),

            Action::Layout { algorithm } => self.layout(algorithm),
            Action::Align { mode } => self.align(mode),
            Action::BringToFront { ids } => self.bring_to_front(&ids),
            Action::SendToBack { ids } => self.send_to_back(&ids),
            Action::Cluster { by } => self.cluster(&by)?,

            Action::Hide { ids } => self.hide(&ids),
            Action::Show { ids } => self.show(&ids),
            Action::ShowAll => self.show_all(),
            Action::Select { ids, additive } => self.select(&ids, additive),
            Action::Unselect { ids } => self.unselect(&ids),
            Action::SelectAll => self.select_all(),

            Action::Zoom { level } => self.zoom(level),
            Action::Center { ids } => self.center(&ids),
            Action::Refresh => self.refresh(),
            Action::ShortestPath {
                source,
                target,
                weight_attribute,
            } => self.shortest_path(&source, &target, weight_attribute.as_deref()),

            Action::ArmMerge { kind } => {
                self.merge.arm(kind);
                Effects::default()
            }
            Action::DisarmMerge => {
                self.merge.disarm();
                Effects::default()
            }
        };
        Ok(effects)
    }

    /// Re-derives everything that depends on the elements a handler changed.
    fn settle(&mut self, mut effects: Effects, defers_selection: bool) -> Effects {
        effects.dedup();
        for id in &effects.removed {
            self.merge.forget(id);
        }

        let mut dirty: Vec<ElementId> = effects
            .created
            .iter()
            .chain(&effects.touched)
            .chain(&effects.removed)
            .cloned()
            .collect();

        let reshaped = effects.has_changes();
        if effects.refilter || (reshaped && !self.active_filters.is_empty()) {
            let filtered = self.run_filters();
            if effects.refilter {
                effects.touched.extend(filtered.iter().cloned());
                self.schedule_recollapse_all();
            }
            dirty.extend(filtered);
        }
        if reshaped {
            dirty.extend(self.refresh_condition_classes());
        }

        if defers_selection {
            self.debounce.notify(Instant::now());
            self.selection
                .patch(&self.document, &effects.removed, |el| el.selected);
        } else {
            self.selection.patch(&self.document, &dirty, |el| el.selected);
        }
        self.hidden.patch(&self.document, &dirty, |el| el.hidden);
        if reshaped {
            self.index = AttributeIndex::build(&self.document);
        }
        self.groupable_selection = self.groupable_nodes().len() >= 2;
        self.push_stylesheet(false);
        effects.dedup();
        effects
    }

    fn run_filters(&mut self) -> Vec<ElementId> {
        if self.active_filters.is_empty() {
            clear_filters(&mut self.document)
        } else {
            apply_filters(&mut self.document, &self.active_filters).touched
        }
    }

    fn intern_document_styles(&mut self) {
        for element in self.document.all_mut() {
            if !element.payload.style.is_empty() {
                let style = element.payload.style.clone();
                self.stylesheet.assign_user_style(element, &style);
            }
        }
    }

    fn rebuild_projections(&mut self) {
        if !self.active_filters.is_empty() {
            apply_filters(&mut self.document, &self.active_filters);
        }
        self.refresh_condition_classes();
        self.selection = ElementMaps::collect(&self.document, |el| el.selected);
        self.hidden = ElementMaps::collect(&self.document, |el| el.hidden);
        self.index = AttributeIndex::build(&self.document);
        self.groupable_selection = self.groupable_nodes().len() >= 2;
        self.push_stylesheet(true);
    }

    fn push_stylesheet(&mut self, force: bool) {
        if self.stylesheet.take_dirty() || force {
            self.host.apply_stylesheet(&self.stylesheet.entries());
        }
    }

    /// Shared tail of every delete path.
    fn absorb_removal(&mut self, removal: Removal) -> Effects {
        for group in &removal.shrunk_groups {
            if self.document.is_live(group) && !self.document.is_collapsed(group) {
                self.frames
                    .schedule(DeferredTask::RoundTripGroup(group.clone()));
            }
        }
        for bundle in &removal.shrunk_bundles {
            refresh_edge_group(&mut self.document, bundle);
        }
        Effects {
            touched: removal
                .shrunk_groups
                .into_iter()
                .chain(removal.shrunk_bundles)
                .collect(),
            removed: removal.removed,
            ..Default::default()
        }
    }

    /// Collapsed groups that hid elements of a bulk pass get refreshed on the
    /// next frame.
    fn schedule_recollapse(&mut self, ids: &[ElementId]) {
        let mut groups: Vec<ElementId> = ids
            .iter()
            .filter(|id| matches!(self.document.locate(id), Some(Location::CollapsedIn(_))))
            .filter_map(|id| self.document.collapsed_ancestors(id).into_iter().next())
            .collect();
        groups.sort();
        groups.dedup();
        if !groups.is_empty() {
            self.frames.schedule(DeferredTask::Recollapse(groups));
        }
    }

    fn schedule_recollapse_all(&mut self) {
        let groups: Vec<ElementId> = self
            .document
            .collapsed_groups()
            .into_iter()
            .filter(|group| self.document.is_live(group))
            .collect();
        if !groups.is_empty() {
            self.frames.schedule(DeferredTask::Recollapse(groups));
        }
    }

    /// Visible, ungrouped, selected plain nodes.
    fn groupable_nodes(&self) -> Vec<ElementId> {
        self.document
            .live()
            .filter(|el| {
                el.kind == ElementKind::Node && el.selected && el.parent.is_none() && !el.hidden
            })
            .map(|el| el.id.clone())
            .collect()
    }

    /// The explicit ids that exist and belong to `family`, plus every element
    /// sharing one of their type ids when `apply_to_type` is set.
    fn resolve_targets(
        &self,
        ids: &[ElementId],
        family: Family,
        apply_to_type: bool,
    ) -> Vec<ElementId> {
        let mut seen = HashSet::new();
        let mut targets: Vec<ElementId> = ids
            .iter()
            .filter(|id| {
                self.document
                    .get(id)
                    .is_some_and(|el| family.accepts(el.kind))
            })
            .filter(|id| seen.insert((*id).clone()))
            .cloned()
            .collect();
        if !apply_to_type {
            return targets;
        }
        let system_ids: HashSet<&str> = targets
            .iter()
            .filter_map(|id| self.document.get(id)?.payload.system_id.as_deref())
            .collect();
        for element in self.document.all() {
            let same_type = element
                .payload
                .system_id
                .as_deref()
                .is_some_and(|system_id| system_ids.contains(system_id));
            if same_type && family.accepts(element.kind) && seen.insert(element.id.clone()) {
                targets.push(element.id.clone());
            }
        }
        targets
    }

    /// Recomputes selection maps once the debounce window has passed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.debounce.ready(now) {
            return false;
        }
        self.selection = ElementMaps::collect(&self.document, |el| el.selected);
        true
    }

    /// Recomputes pending selection maps without waiting.
    pub fn flush_selection(&mut self) -> bool {
        if !self.debounce.flush() {
            return false;
        }
        self.selection = ElementMaps::collect(&self.document, |el| el.selected);
        true
    }

    /// Runs work deferred to after the host's frame. Returns how many tasks ran.
    pub fn run_frame(&mut self) -> usize {
        let tasks = self.frames.take_all();
        if tasks.is_empty() {
            return 0;
        }
        let mut touched = Vec::new();
        self.host.start_batch();
        for task in &tasks {
            match task {
                DeferredTask::RoundTripGroup(group) => {
                    if self.document.is_live(group) && !self.document.is_collapsed(group) {
                        self.toggle_twice(group, true);
                        touched.push(group.clone());
                    }
                }
                DeferredTask::Recollapse(groups) => {
                    for group in groups {
                        if self.document.is_live(group) && self.document.is_collapsed(group) {
                            self.toggle_twice(group, false);
                            touched.push(group.clone());
                        }
                    }
                }
            }
        }
        self.host.end_batch();
        self.selection
            .patch(&self.document, &touched, |el| el.selected);
        self.hidden.patch(&self.document, &touched, |el| el.hidden);
        tasks.len()
    }

    fn toggle_twice(&mut self, group: &ElementId, collapse_first: bool) {
        let (first, second) = if collapse_first {
            (self.document.collapse(group), self.document.expand(group))
        } else {
            (self.document.expand(group), self.document.collapse(group))
        };
        if let Err(err) = first.and(second) {
            warn!(group = %group, error = %err, "Deferred group refresh failed");
        }
    }

    /// Converts a dashboard filter, filling in fuzzy thresholds it omits.
    pub fn filter_from_dashboard(&self, dashboard: &DashboardFilter) -> Result<Filter, FilterError> {
        let mut filter = Filter::try_from(dashboard)?;
        let fallback = self.settings.default_fuzzy_threshold;
        for rule in filter
            .attributes
            .iter_mut()
            .chain(filter.meta_attributes.iter_mut())
        {
            if let Condition::StrFuzzy { threshold, .. } = &mut rule.condition
                && threshold.is_nan()
            {
                *threshold = fallback;
            }
        }
        Ok(filter)
    }

    pub fn snapshot(&self) -> EngineSnapshot<'_> {
        EngineSnapshot {
            selection: &self.selection,
            hidden: &self.hidden,
            stylesheet: self.stylesheet.entries(),
            index: &self.index,
            merge_state: self.merge.state(),
            groupable_selection: self.groupable_selection,
            unsaved_changes: self.unsaved,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn pending_actions(&self) -> usize {
        self.queue.len()
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    pub fn mark_saved(&mut self) {
        self.unsaved = false;
    }

    pub fn document(&self) -> &GraphDocument {
        &self.document
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn selection(&self) -> &ElementMaps {
        &self.selection
    }

    pub fn hidden(&self) -> &ElementMaps {
        &self.hidden
    }

    pub fn index(&self) -> &AttributeIndex {
        &self.index
    }

    pub fn stylesheet(&self) -> Vec<StylesheetEntry> {
        self.stylesheet.entries()
    }

    pub fn merge_state(&self) -> &MergeState {
        self.merge.state()
    }

    pub fn is_groupable(&self) -> bool {
        self.groupable_selection
    }

    pub fn active_filters(&self) -> &[Filter] {
        &self.active_filters
    }

    pub fn condition_styles(&self) -> &[ConditionStyle] {
        &self.condition_styles
    }
}

impl<H: RenderHost> ActionListener for Engine<H> {
    fn handle_action(&mut self, envelope: ActionEnvelope) {
        if let Err(err) = self.run(envelope) {
            warn!(error = %err, "Queued action failed during replay");
        }
    }
}

