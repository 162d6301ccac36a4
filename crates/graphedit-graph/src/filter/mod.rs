//! Filter evaluation.
//!
//! A [`Filter`] is compiled once (operands trimmed and lowercased) and then
//! evaluated against the flattened [`ElementAttributes`] of each element.
//! Rules inside a filter are ANDed; the values of a multi-valued attribute are
//! ORed, so one matching value is enough.

pub mod apply;
pub mod dates;
pub mod decimal;
pub mod fuzzy;

pub use apply::{FilterSummary, apply_filters, clear_filters, sync_badges};

use graphedit_core::{AttributeRule, Condition, Element, Filter};
use std::cmp::Ordering;
use std::collections::HashMap;

/// The filterable view of one element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementAttributes {
    pub icon: Option<String>,
    pub system_id: Option<String>,
    pub label: String,
    pub data: HashMap<String, Vec<String>>,
    pub meta: HashMap<String, Vec<String>>,
}

impl ElementAttributes {
    pub fn from_element(element: &Element) -> Self {
        let mut data: HashMap<String, Vec<String>> = HashMap::new();
        let mut meta: HashMap<String, Vec<String>> = HashMap::new();
        for field in &element.payload.attributes {
            data.entry(field.key.clone())
                .or_default()
                .push(field.value.clone());
            for meta_field in &field.meta_fields {
                meta.entry(meta_field.clone())
                    .or_default()
                    .push(field.value.clone());
            }
        }
        Self {
            icon: element.payload.icon.clone(),
            system_id: element.payload.system_id.clone(),
            label: element.display_label.clone(),
            data,
            meta,
        }
    }

    pub fn values(&self, key: &str) -> Option<&[String]> {
        match self.data.get(key) {
            Some(values) => Some(values.as_slice()),
            None if key == "label" => Some(std::slice::from_ref(&self.label)),
            None => None,
        }
    }

    pub fn meta_values(&self, key: &str) -> Option<&[String]> {
        self.meta.get(key).map(Vec::as_slice)
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// A filter with its operands normalized, ready to evaluate many times.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    icons: Vec<String>,
    system_ids: Vec<String>,
    attributes: Vec<AttributeRule>,
    meta_attributes: Vec<AttributeRule>,
    pub hide_filtered: bool,
}

impl CompiledFilter {
    pub fn compile(filter: &Filter) -> Self {
        let rules = |rules: &[AttributeRule]| {
            rules
                .iter()
                .map(|rule| {
                    AttributeRule::new(rule.key.trim(), normalize_condition(&rule.condition))
                })
                .collect()
        };
        Self {
            icons: filter.icons.iter().map(|icon| normalize(icon)).collect(),
            system_ids: filter.system_ids.iter().map(|id| normalize(id)).collect(),
            attributes: rules(&filter.attributes),
            meta_attributes: rules(&filter.meta_attributes),
            hide_filtered: filter.hide_filtered,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
            && self.system_ids.is_empty()
            && self.attributes.is_empty()
            && self.meta_attributes.is_empty()
    }

    pub fn matches(&self, attrs: &ElementAttributes) -> bool {
        let member_of = |allowed: &[String], value: &Option<String>| {
            allowed.is_empty()
                || value
                    .as_deref()
                    .is_some_and(|value| allowed.contains(&normalize(value)))
        };
        member_of(&self.icons, &attrs.icon)
            && member_of(&self.system_ids, &attrs.system_id)
            && self
                .attributes
                .iter()
                .all(|rule| evaluate_rule(rule, attrs.values(&rule.key)))
            && self
                .meta_attributes
                .iter()
                .all(|rule| evaluate_rule(rule, attrs.meta_values(&rule.key)))
    }

    pub fn matches_element(&self, element: &Element) -> bool {
        self.matches(&ElementAttributes::from_element(element))
    }
}

fn normalize_condition(condition: &Condition) -> Condition {
    let mut normalized = condition.clone();
    match &mut normalized {
        Condition::StrEq { value }
        | Condition::StrNeq { value }
        | Condition::StrInclude { value }
        | Condition::StrNotInclude { value }
        | Condition::StrStartsWith { value }
        | Condition::StrEndsWith { value }
        | Condition::StrFuzzy { value, .. } => *value = normalize(value),
        Condition::NumEq { value }
        | Condition::NumNeq { value }
        | Condition::NumGt { value }
        | Condition::NumGte { value }
        | Condition::NumLt { value }
        | Condition::NumLte { value } => *value = value.trim().to_string(),
        Condition::DateRange { from, to } => {
            for text in [from, to].into_iter().flatten() {
                *text = text.trim().to_string();
            }
        }
    }
    normalized
}

/// Result for an element that has no value under the rule's key.
fn absent_default(condition: &Condition) -> bool {
    match condition {
        Condition::StrNotInclude { .. } => true,
        Condition::NumNeq { value } | Condition::StrFuzzy { value, .. } => {
            value.trim().is_empty()
        }
        _ => false,
    }
}

pub fn evaluate_rule(rule: &AttributeRule, values: Option<&[String]>) -> bool {
    match values {
        None | Some([]) => absent_default(&rule.condition),
        Some(values) => values
            .iter()
            .any(|value| evaluate_condition(&rule.condition, value)),
    }
}

/// Evaluates one operator against one element value. Both sides are trimmed;
/// string operators also ignore case.
pub fn evaluate_condition(condition: &Condition, raw: &str) -> bool {
    let trimmed = raw.trim();
    let value = trimmed.to_lowercase();
    match condition {
        Condition::StrEq { value: wanted } => value == normalize(wanted),
        Condition::StrNeq { value: wanted } => value != normalize(wanted),
        Condition::StrInclude { value: wanted } => value.contains(&normalize(wanted)),
        Condition::StrNotInclude { value: wanted } => {
            let wanted = normalize(wanted);
            (value.is_empty() && wanted.is_empty()) || !value.contains(&wanted)
        }
        Condition::StrStartsWith { value: wanted } => value.starts_with(&normalize(wanted)),
        Condition::StrEndsWith { value: wanted } => value.ends_with(&normalize(wanted)),
        Condition::NumEq { value: wanted } => {
            decimal::decimal_eq(trimmed, wanted).unwrap_or(false)
        }
        Condition::NumNeq { value: wanted } => {
            if trimmed.is_empty() && wanted.trim().is_empty() {
                return true;
            }
            decimal::decimal_eq(trimmed, wanted).is_some_and(|equal| !equal)
        }
        Condition::NumGt { value: wanted } => compare(trimmed, wanted).is_some_and(Ordering::is_gt),
        Condition::NumGte { value: wanted } => compare(trimmed, wanted).is_some_and(Ordering::is_ge),
        Condition::NumLt { value: wanted } => compare(trimmed, wanted).is_some_and(Ordering::is_lt),
        Condition::NumLte { value: wanted } => compare(trimmed, wanted).is_some_and(Ordering::is_le),
        Condition::StrFuzzy {
            value: wanted,
            threshold,
        } => fuzzy::fuzzy_matches(&value, &normalize(wanted), *threshold),
        Condition::DateRange { from, to } => {
            dates::in_range(trimmed, from.as_deref(), to.as_deref())
        }
    }
}

/// Orders two operands as dates when either side looks like one, as finite
/// numbers otherwise.
fn compare(left: &str, right: &str) -> Option<Ordering> {
    let left_date = dates::parse_timestamp(left);
    let right_date = dates::parse_timestamp(right);
    if left_date.is_some() || right_date.is_some() {
        return Some(left_date?.cmp(&right_date?));
    }
    let number = |text: &str| text.trim().parse::<f64>().ok().filter(|n| n.is_finite());
    number(left)?.partial_cmp(&number(right)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphedit_core::{AttributeField, ElementKind};
    use proptest::prelude::*;

    fn text(value: &str) -> String {
        value.to_string()
    }

    #[test]
    fn string_operators_ignore_case_and_padding() {
        assert!(evaluate_condition(
            &Condition::StrEq {
                value: text("Hello World")
            },
            "hello world"
        ));
        assert!(evaluate_condition(
            &Condition::StrInclude { value: text(" WORLD ") },
            "Hello World"
        ));
        assert!(evaluate_condition(
            &Condition::StrStartsWith { value: text("he") },
            "Hello"
        ));
        assert!(!evaluate_condition(
            &Condition::StrEndsWith { value: text("he") },
            "Hello"
        ));
        assert!(evaluate_condition(
            &Condition::StrNeq { value: text("a") },
            "b"
        ));
    }

    #[test]
    fn not_include_on_empty_sides() {
        let empty = Condition::StrNotInclude { value: text("") };
        assert!(evaluate_condition(&empty, ""));
        assert!(!evaluate_condition(&empty, "anything"));
        let rule = AttributeRule::new("missing", Condition::StrNotInclude { value: text("x") });
        assert!(evaluate_rule(&rule, None));
    }

    #[test]
    fn numeric_operators() {
        assert!(evaluate_condition(&Condition::NumEq { value: text("1.50") }, "1.5"));
        assert!(!evaluate_condition(&Condition::NumEq { value: text("abc") }, "abc"));
        assert!(evaluate_condition(&Condition::NumGt { value: text("30") }, "31"));
        assert!(!evaluate_condition(&Condition::NumGt { value: text("30") }, "30"));
        assert!(evaluate_condition(&Condition::NumGte { value: text("30") }, "30"));
        assert!(evaluate_condition(&Condition::NumLt { value: text("-1") }, "-2.5"));
        assert!(!evaluate_condition(&Condition::NumLte { value: text("x") }, "1"));
        assert!(evaluate_condition(&Condition::NumNeq { value: text("") }, ""));
        assert!(!evaluate_condition(&Condition::NumNeq { value: text("abc") }, "1"));
        assert!(evaluate_condition(&Condition::NumNeq { value: text("2") }, "1"));
    }

    #[test]
    fn long_numbers_compare_exactly() {
        let digits = "98765432109876543210987654321098";
        assert!(evaluate_condition(&Condition::NumEq { value: text(digits) }, digits));
        assert!(!evaluate_condition(
            &Condition::NumEq {
                value: text("98765432109876543210987654321099")
            },
            digits
        ));
        assert!(!evaluate_condition(
            &Condition::NumEq {
                value: text("10e9223372036854775807")
            },
            "1"
        ));
    }

    #[test]
    fn fuzzy_matching_uses_the_threshold() {
        let loose = Condition::StrFuzzy {
            value: text("hll wrld"),
            threshold: 0.5,
        };
        let exact = Condition::StrFuzzy {
            value: text("hll wrld"),
            threshold: 1.0,
        };
        assert!(evaluate_condition(&loose, "Hello world"));
        assert!(!evaluate_condition(&exact, "Hello world"));

        let broken = Condition::StrFuzzy {
            value: text(""),
            threshold: f64::NAN,
        };
        assert!(evaluate_condition(&broken, ""));
        assert!(!evaluate_condition(&broken, "Hello"));
    }

    #[test]
    fn ordering_switches_to_dates() {
        assert!(evaluate_condition(
            &Condition::NumGt {
                value: text("2020-01-01")
            },
            "2021-06-01"
        ));
        assert!(!evaluate_condition(
            &Condition::NumGt {
                value: text("2020-01-01")
            },
            "5"
        ));
    }

    #[test]
    fn absent_key_defaults() {
        let neq_empty = AttributeRule::new("k", Condition::NumNeq { value: text("") });
        let neq_value = AttributeRule::new("k", Condition::NumNeq { value: text("3") });
        let fuzzy_empty = AttributeRule::new(
            "k",
            Condition::StrFuzzy {
                value: text(""),
                threshold: 0.5,
            },
        );
        let eq = AttributeRule::new("k", Condition::StrEq { value: text("") });
        assert!(evaluate_rule(&neq_empty, None));
        assert!(!evaluate_rule(&neq_value, None));
        assert!(evaluate_rule(&fuzzy_empty, Some(&[][..])));
        assert!(!evaluate_rule(&eq, None));
    }

    #[test]
    fn any_value_of_a_multi_valued_attribute_matches() {
        let rule = AttributeRule::new("tag", Condition::StrEq { value: text("b") });
        let values = vec![text("a"), text("B")];
        assert!(evaluate_rule(&rule, Some(values.as_slice())));
    }

    #[test]
    fn compiled_filter_ands_its_rules() {
        let mut element = Element::new("n1", ElementKind::Node);
        element.display_label = "Alice".to_string();
        element.payload.icon = Some("User".to_string());
        element.payload.system_id = Some("person".to_string());
        element
            .payload
            .attributes
            .push(AttributeField::new("age", "42").with_meta("numbers"));

        let mut filter = Filter {
            icons: vec![text("user")],
            system_ids: vec![text("PERSON")],
            attributes: vec![
                AttributeRule::new("age", Condition::NumGte { value: text("40") }),
                AttributeRule::new("label", Condition::StrStartsWith { value: text("al") }),
            ],
            meta_attributes: vec![AttributeRule::new(
                "numbers",
                Condition::NumEq { value: text("42.0") },
            )],
            ..Default::default()
        };
        assert!(CompiledFilter::compile(&filter).matches_element(&element));

        filter.icons = vec![text("building")];
        assert!(!CompiledFilter::compile(&filter).matches_element(&element));
    }

    proptest! {
        #[test]
        fn prop_string_operators_ignore_case(value in "[a-zA-Z ]{0,16}") {
            let upper = value.to_uppercase();
            let lower = value.to_lowercase();
            let eq = Condition::StrEq { value: upper.clone() };
            let include = Condition::StrInclude { value: upper.clone() };
            let neq = Condition::StrNeq { value: upper };
            prop_assert!(evaluate_condition(&eq, &lower));
            prop_assert!(evaluate_condition(&include, &lower));
            prop_assert!(!evaluate_condition(&neq, &lower));
        }
    }
}
