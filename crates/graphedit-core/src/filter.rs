//! Filter shapes shared by the editor and the dashboard.
//!
//! The editor authors [`Filter`]s; dashboards store the flat
//! [`DashboardFilter`] form. Both convert into each other without loss for
//! every supported field and operator.

use crate::{FilterError, StyleObject};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "condition", rename_all = "kebab-case")]
pub enum Condition {
    StrEq { value: String },
    StrNeq { value: String },
    StrInclude { value: String },
    StrNotInclude { value: String },
    StrStartsWith { value: String },
    StrEndsWith { value: String },
    NumEq { value: String },
    NumNeq { value: String },
    NumGt { value: String },
    NumGte { value: String },
    NumLt { value: String },
    NumLte { value: String },
    StrFuzzy { value: String, threshold: f64 },
    DateRange {
        #[serde(default)]
        from: Option<String>,
        #[serde(default)]
        to: Option<String>,
    },
}

impl Condition {
    pub fn operator(&self) -> &'static str {
        match self {
            Condition::StrEq { .. } => "str-eq",
            Condition::StrNeq { .. } => "str-neq",
            Condition::StrInclude { .. } => "str-include",
            Condition::StrNotInclude { .. } => "str-not-include",
            Condition::StrStartsWith { .. } => "str-starts-with",
            Condition::StrEndsWith { .. } => "str-ends-with",
            Condition::NumEq { .. } => "num-eq",
            Condition::NumNeq { .. } => "num-neq",
            Condition::NumGt { .. } => "num-gt",
            Condition::NumGte { .. } => "num-gte",
            Condition::NumLt { .. } => "num-lt",
            Condition::NumLte { .. } => "num-lte",
            Condition::StrFuzzy { .. } => "str-fuzzy",
            Condition::DateRange { .. } => "date-range",
        }
    }

    /// Operand as a flat value list (dashboard form).
    pub fn values(&self) -> Vec<String> {
        match self {
            Condition::StrEq { value }
            | Condition::StrNeq { value }
            | Condition::StrInclude { value }
            | Condition::StrNotInclude { value }
            | Condition::StrStartsWith { value }
            | Condition::StrEndsWith { value }
            | Condition::NumEq { value }
            | Condition::NumNeq { value }
            | Condition::NumGt { value }
            | Condition::NumGte { value }
            | Condition::NumLt { value }
            | Condition::NumLte { value } => vec![value.clone()],
            Condition::StrFuzzy { value, threshold } => {
                vec![value.clone(), threshold.to_string()]
            }
            Condition::DateRange { from, to } => vec![
                from.clone().unwrap_or_default(),
                to.clone().unwrap_or_default(),
            ],
        }
    }

    pub fn from_operator(operator: &str, values: &[String]) -> Result<Self, FilterError> {
        let first = values.first().cloned().unwrap_or_default();
        let condition = match operator {
            "str-eq" => Condition::StrEq { value: first },
            "str-neq" => Condition::StrNeq { value: first },
            "str-include" => Condition::StrInclude { value: first },
            "str-not-include" => Condition::StrNotInclude { value: first },
            "str-starts-with" => Condition::StrStartsWith { value: first },
            "str-ends-with" => Condition::StrEndsWith { value: first },
            "num-eq" => Condition::NumEq { value: first },
            "num-neq" => Condition::NumNeq { value: first },
            "num-gt" => Condition::NumGt { value: first },
            "num-gte" => Condition::NumGte { value: first },
            "num-lt" => Condition::NumLt { value: first },
            "num-lte" => Condition::NumLte { value: first },
            "str-fuzzy" => Condition::StrFuzzy {
                value: first,
                // Unparseable thresholds become NaN, which never matches.
                threshold: values
                    .get(1)
                    .and_then(|raw| raw.trim().parse::<f64>().ok())
                    .unwrap_or(f64::NAN),
            },
            "date-range" => Condition::DateRange {
                from: Some(first).filter(|v| !v.is_empty()),
                to: values.get(1).cloned().filter(|v| !v.is_empty()),
            },
            other => return Err(FilterError::UnknownOperator(other.to_string())),
        };
        Ok(condition)
    }
}

/// One attribute row of a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRule {
    pub key: String,
    #[serde(flatten)]
    pub condition: Condition,
}

impl AttributeRule {
    pub fn new(key: impl Into<String>, condition: Condition) -> Self {
        Self {
            key: key.into(),
            condition,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    pub id: String,
    pub name: String,
    pub icons: Vec<String>,
    pub system_ids: Vec<String>,
    pub attributes: Vec<AttributeRule>,
    pub meta_attributes: Vec<AttributeRule>,
    /// Hide failing elements instead of making them translucent.
    pub hide_filtered: bool,
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
            && self.system_ids.is_empty()
            && self.attributes.is_empty()
            && self.meta_attributes.is_empty()
    }
}

/// A named, filter-driven style layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionStyle {
    pub title: String,
    pub selector: String,
    pub filter: Filter,
    #[serde(default)]
    pub style: StyleObject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "kebab-case")]
pub enum DashboardField {
    Icon,
    SystemId,
    Attribute { key: String },
    MetaAttribute { key: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardRule {
    #[serde(flatten)]
    pub field: DashboardField,
    pub operator: String,
    pub values: Vec<String>,
}

/// Flat filter representation used by dashboards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardFilter {
    pub id: String,
    pub name: String,
    pub rules: Vec<DashboardRule>,
    pub hide: bool,
}

const MEMBERSHIP_OPERATOR: &str = "in";

impl From<&Filter> for DashboardFilter {
    fn from(filter: &Filter) -> Self {
        let mut rules = Vec::new();
        if !filter.icons.is_empty() {
            rules.push(DashboardRule {
                field: DashboardField::Icon,
                operator: MEMBERSHIP_OPERATOR.to_string(),
                values: filter.icons.clone(),
            });
        }
        if !filter.system_ids.is_empty() {
            rules.push(DashboardRule {
                field: DashboardField::SystemId,
                operator: MEMBERSHIP_OPERATOR.to_string(),
                values: filter.system_ids.clone(),
            });
        }
        for rule in &filter.attributes {
            rules.push(DashboardRule {
                field: DashboardField::Attribute {
                    key: rule.key.clone(),
                },
                operator: rule.condition.operator().to_string(),
                values: rule.condition.values(),
            });
        }
        for rule in &filter.meta_attributes {
            rules.push(DashboardRule {
                field: DashboardField::MetaAttribute {
                    key: rule.key.clone(),
                },
                operator: rule.condition.operator().to_string(),
                values: rule.condition.values(),
            });
        }
        Self {
            id: filter.id.clone(),
            name: filter.name.clone(),
            rules,
            hide: filter.hide_filtered,
        }
    }
}

impl TryFrom<&DashboardFilter> for Filter {
    type Error = FilterError;

    fn try_from(dashboard: &DashboardFilter) -> Result<Self, Self::Error> {
        let mut filter = Filter {
            id: dashboard.id.clone(),
            name: dashboard.name.clone(),
            hide_filtered: dashboard.hide,
            ..Default::default()
        };
        for rule in &dashboard.rules {
            match &rule.field {
                DashboardField::Icon | DashboardField::SystemId
                    if rule.operator != MEMBERSHIP_OPERATOR =>
                {
                    return Err(FilterError::UnknownOperator(rule.operator.clone()));
                }
                DashboardField::Icon => filter.icons.extend(rule.values.iter().cloned()),
                DashboardField::SystemId => {
                    filter.system_ids.extend(rule.values.iter().cloned())
                }
                DashboardField::Attribute { key } => filter.attributes.push(AttributeRule::new(
                    key.clone(),
                    Condition::from_operator(&rule.operator, &rule.values)?,
                )),
                DashboardField::MetaAttribute { key } => {
                    filter.meta_attributes.push(AttributeRule::new(
                        key.clone(),
                        Condition::from_operator(&rule.operator, &rule.values)?,
                    ))
                }
            }
        }
        Ok(filter)
    }
}
