use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// CSS-like style properties. Ordered so the serialized form is canonical.
pub type StyleObject = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StylesheetEntry {
    pub selector: String,
    pub style: StyleObject,
}

impl StylesheetEntry {
    pub fn new(selector: impl Into<String>, style: StyleObject) -> Self {
        Self {
            selector: selector.into(),
            style,
        }
    }
}
