use super::{Effects, Engine};
use crate::classes::{CONDITION_STYLE_PREFIX, condition_class};
use crate::filter::CompiledFilter;
use crate::host::RenderHost;
use graphedit_core::{ConditionStyle, ElementId, Filter, StylesheetEntry};
use tracing::debug;

impl<H: RenderHost> Engine<H> {
    /// Replaces the active filter set. Empty filters are dropped.
    pub(super) fn apply_filter_set(&mut self, filters: Vec<Filter>) -> Effects {
        self.active_filters = filters.into_iter().filter(|f| !f.is_empty()).collect();
        Effects {
            refilter: true,
            ..Default::default()
        }
    }

    pub(super) fn clear_filter_set(&mut self) -> Effects {
        if self.active_filters.is_empty() {
            return Effects::skip("no active filters");
        }
        self.active_filters.clear();
        Effects {
            refilter: true,
            ..Default::default()
        }
    }

    /// Adds a condition style, or replaces the one with the same selector.
    pub(super) fn apply_condition_style(&mut self, style: ConditionStyle) -> Effects {
        if condition_class(&style.selector) == CONDITION_STYLE_PREFIX {
            return Effects::skip("condition style selector is blank");
        }
        match self
            .condition_styles
            .iter_mut()
            .find(|existing| existing.selector == style.selector)
        {
            Some(existing) => *existing = style,
            None => self.condition_styles.push(style),
        }
        self.relayer_condition_styles()
    }

    pub(super) fn change_condition_style(
        &mut self,
        selector: &str,
        style: ConditionStyle,
    ) -> Effects {
        let Some(position) = self
            .condition_styles
            .iter()
            .position(|existing| existing.selector == selector)
        else {
            return Effects::skip("unknown condition style");
        };
        if style.selector != selector
            && self
                .condition_styles
                .iter()
                .any(|existing| existing.selector == style.selector)
        {
            return Effects::skip("condition style selector already taken");
        }
        self.condition_styles[position] = style;
        self.relayer_condition_styles()
    }

    pub(super) fn delete_condition_style(&mut self, selector: &str) -> Effects {
        let before = self.condition_styles.len();
        self.condition_styles
            .retain(|existing| existing.selector != selector);
        if before == self.condition_styles.len() {
            return Effects::skip("unknown condition style");
        }
        self.relayer_condition_styles()
    }

    fn relayer_condition_styles(&mut self) -> Effects {
        let layer = self
            .condition_styles
            .iter()
            .map(|style| StylesheetEntry::new(condition_class(&style.selector), style.style.clone()))
            .collect();
        self.stylesheet.set_condition_layer(layer);
        Effects {
            touched: self.refresh_condition_classes(),
            ..Default::default()
        }
    }

    /// Re-tags every node and edge with the classes of the condition styles
    /// it matches. Returns the elements whose classes changed.
    ///
    /// A condition style with an empty filter matches nothing.
    pub(super) fn refresh_condition_classes(&mut self) -> Vec<ElementId> {
        let compiled: Vec<(String, CompiledFilter)> = self
            .condition_styles
            .iter()
            .map(|style| (condition_class(&style.selector), CompiledFilter::compile(&style.filter)))
            .filter(|(_, filter)| !filter.is_empty())
            .collect();

        let mut changed = Vec::new();
        for element in self.document.all_mut() {
            if !element.kind.is_node_like() && !element.kind.is_edge_like() {
                continue;
            }
            let mut wanted: Vec<&str> = Vec::new();
            for (class, filter) in &compiled {
                if !wanted.contains(&class.as_str()) && filter.matches_element(element) {
                    wanted.push(class);
                }
            }
            let current: Vec<&str> = element
                .classes
                .iter()
                .map(String::as_str)
                .filter(|class| class.starts_with(CONDITION_STYLE_PREFIX))
                .collect();
            if current == wanted {
                continue;
            }
            let wanted: Vec<String> = wanted.into_iter().map(str::to_string).collect();
            element
                .classes
                .retain(|class| !class.starts_with(CONDITION_STYLE_PREFIX));
            element.classes.extend(wanted);
            changed.push(element.id.clone());
        }
        if !changed.is_empty() {
            debug!(changed = changed.len(), "Condition style classes refreshed");
        }
        changed
    }
}
