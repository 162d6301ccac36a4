use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatVariant {
    Text,
    Number,
    Currency,
    Date,
    DateTime,
    Url,
}

/// A key/label/value attribute on an element payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeField {
    pub key: String,
    pub label: String,
    pub value: String,
    pub formatted_value: Option<String>,
    pub format_variant: Option<FormatVariant>,
    /// Meta-field keys this attribute contributes to (meta-attribute filtering).
    pub meta_fields: Vec<String>,
}

impl AttributeField {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_meta(mut self, meta_field: impl Into<String>) -> Self {
        self.meta_fields.push(meta_field.into());
        self
    }

    pub fn with_formatted(mut self, formatted: impl Into<String>) -> Self {
        self.formatted_value = Some(formatted.into());
        self
    }

    /// The value shown to users: formatted when present, raw otherwise.
    pub fn display_value(&self) -> &str {
        self.formatted_value
            .as_deref()
            .filter(|formatted| !formatted.is_empty())
            .unwrap_or(&self.value)
    }
}
