//! Content-addressed user styles.
//!
//! Every distinct style object the user writes gets exactly one stylesheet
//! rule, named by a hash of its canonical serialization. Elements carry the
//! rule's class instead of inline style, so a thousand nodes painted the same
//! colour share one rule.

use blake3::Hasher;
use graphedit_core::{Element, StyleObject, StylesheetEntry};
use std::collections::HashSet;

const SELECTOR_HASH_CHARS: usize = 16;

/// Result of interning a style object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interned {
    pub selector: String,
    /// `true` when a new rule was appended to the sheet.
    pub inserted: bool,
}

#[derive(Debug, Clone)]
pub struct StylesheetRegistry {
    prefix: String,
    user: Vec<StylesheetEntry>,
    known: HashSet<String>,
    conditions: Vec<StylesheetEntry>,
    dirty: bool,
}

impl StylesheetRegistry {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            user: Vec::new(),
            known: HashSet::new(),
            conditions: Vec::new(),
            dirty: false,
        }
    }

    /// The selector a style object maps to. Pure; does not register anything.
    pub fn selector_for(&self, style: &StyleObject) -> String {
        // StyleObject is a BTreeMap and serde_json objects are ordered maps,
        // so equal styles always serialize to equal bytes.
        let canonical = serde_json::to_vec(style).unwrap_or_default();
        let mut hasher = Hasher::new();
        hasher.update(b"style:");
        hasher.update(&canonical);
        let hex = hasher.finalize().to_hex();
        format!("{}{}", self.prefix, &hex[..SELECTOR_HASH_CHARS])
    }

    pub fn internalize(&mut self, style: &StyleObject) -> Interned {
        let selector = self.selector_for(style);
        let inserted = self.known.insert(selector.clone());
        if inserted {
            self.user
                .push(StylesheetEntry::new(selector.clone(), style.clone()));
            self.dirty = true;
        }
        Interned { selector, inserted }
    }

    pub fn is_user_style_class(&self, class: &str) -> bool {
        class.starts_with(&self.prefix)
    }

    /// Points the element at the rule for `style`, dropping any previous user
    /// style class. An empty style just clears the class.
    pub fn assign_user_style(
        &mut self,
        element: &mut Element,
        style: &StyleObject,
    ) -> Option<Interned> {
        element
            .classes
            .retain(|class| !class.starts_with(&self.prefix));
        if style.is_empty() {
            return None;
        }
        let interned = self.internalize(style);
        element.add_class(&interned.selector);
        Some(interned)
    }

    /// Replaces the condition-style layer, which is appended after user rules.
    pub fn set_condition_layer(&mut self, entries: Vec<StylesheetEntry>) {
        if self.conditions != entries {
            self.conditions = entries;
            self.dirty = true;
        }
    }

    pub fn user_rule_count(&self) -> usize {
        self.user.len()
    }

    pub fn entries(&self) -> Vec<StylesheetEntry> {
        self.user
            .iter()
            .chain(self.conditions.iter())
            .cloned()
            .collect()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns whether the sheet changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphedit_core::ElementKind;
    use proptest::prelude::*;
    use serde_json::json;

    fn style(pairs: &[(&str, serde_json::Value)]) -> StyleObject {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn equal_styles_share_one_rule() {
        let mut registry = StylesheetRegistry::new("user-style-");
        let first = registry.internalize(&style(&[
            ("background-color", json!("red")),
            ("width", json!(40)),
        ]));
        let second = registry.internalize(&style(&[
            ("width", json!(40)),
            ("background-color", json!("red")),
        ]));

        assert!(first.inserted);
        assert!(!second.inserted);
        assert_eq!(first.selector, second.selector);
        assert!(first.selector.starts_with("user-style-"));
        assert_eq!(first.selector.len(), "user-style-".len() + 16);
        assert_eq!(registry.user_rule_count(), 1);
        assert!(registry.take_dirty());
        assert!(!registry.take_dirty());
    }

    #[test]
    fn assign_swaps_previous_user_class() {
        let mut registry = StylesheetRegistry::new("user-style-");
        let mut element = Element::new("n1", ElementKind::Node);
        element.add_class("icon-user");

        let red = registry
            .assign_user_style(&mut element, &style(&[("color", json!("red"))]))
            .unwrap();
        let blue = registry
            .assign_user_style(&mut element, &style(&[("color", json!("blue"))]))
            .unwrap();

        assert_ne!(red.selector, blue.selector);
        assert!(element.has_class("icon-user"));
        assert!(element.has_class(&blue.selector));
        assert!(!element.has_class(&red.selector));

        assert!(registry.assign_user_style(&mut element, &StyleObject::new()).is_none());
        assert_eq!(element.classes, vec!["icon-user".to_string()]);
        assert_eq!(registry.user_rule_count(), 2);
    }

    #[test]
    fn condition_layer_follows_user_rules() {
        let mut registry = StylesheetRegistry::new("user-style-");
        registry.internalize(&style(&[("color", json!("red"))]));
        registry.take_dirty();

        let layer = vec![StylesheetEntry::new(
            "cond-style-vip",
            style(&[("border-width", json!(3))]),
        )];
        registry.set_condition_layer(layer.clone());
        assert!(registry.take_dirty());
        registry.set_condition_layer(layer);
        assert!(!registry.is_dirty());

        let entries = registry.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].selector, "cond-style-vip");
    }

    proptest! {
        #[test]
        fn prop_internalize_is_idempotent(
            pairs in proptest::collection::btree_map("[a-z-]{1,12}", "[a-z0-9#]{0,8}", 0..6)
        ) {
            let style: StyleObject = pairs
                .into_iter()
                .map(|(key, value)| (key, serde_json::Value::String(value)))
                .collect();
            let mut registry = StylesheetRegistry::new("user-style-");
            let first = registry.internalize(&style);
            let second = registry.internalize(&style);
            prop_assert!(first.inserted);
            prop_assert!(!second.inserted);
            prop_assert_eq!(first.selector, second.selector);
            prop_assert_eq!(registry.user_rule_count(), 1);
        }
    }
}
