//! `{{key}}` label templates.
//!
//! Double and triple braces both substitute the attribute's display value;
//! labels are plain text, so there is nothing to escape. Unknown keys render
//! as the empty string, and a tag that is never closed makes the whole
//! template render empty.

use graphedit_core::AttributeField;

pub fn render_label(template: &str, attributes: &[AttributeField]) -> String {
    let lookup = |key: &str| {
        attributes
            .iter()
            .find(|field| field.key == key)
            .map(|field| field.display_value().to_string())
            .unwrap_or_default()
    };

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        let (body_start, closer) = if after_open.starts_with('{') {
            (1, "}}}")
        } else {
            (0, "}}")
        };
        let body = &after_open[body_start..];
        let Some(close) = body.find(closer) else {
            return String::new();
        };
        out.push_str(&lookup(body[..close].trim()));
        rest = &body[close + closer.len()..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs() -> Vec<AttributeField> {
        vec![
            AttributeField::new("first", "Ada"),
            AttributeField::new("last", "Lovelace"),
            AttributeField::new("amount", "1000").with_formatted("$1,000"),
        ]
    }

    #[test]
    fn substitutes_known_keys() {
        assert_eq!(render_label("{{first}} {{ last }}", &attrs()), "Ada Lovelace");
        assert_eq!(render_label("Total: {{{amount}}}", &attrs()), "Total: $1,000");
        assert_eq!(render_label("plain", &attrs()), "plain");
    }

    #[test]
    fn unknown_keys_render_empty() {
        assert_eq!(render_label("[{{nope}}]", &attrs()), "[]");
    }

    #[test]
    fn unterminated_tag_renders_nothing() {
        assert_eq!(render_label("{{first}} {{last", &attrs()), "");
        assert_eq!(render_label("{{{first}}", &attrs()), "");
    }

    #[test]
    fn single_braces_are_literal() {
        assert_eq!(render_label("{first} }}", &attrs()), "{first} }}");
    }
}
