//! Class names the engine writes onto elements.

pub const COLLAPSED_GROUP: &str = "collapsed-group";
pub const HIDDEN: &str = "hidden";
pub const ICON_PREFIX: &str = "icon-";

pub const FILTERED_VISIBLE: &str = "filtered-visible";
pub const FILTERED_TRANSLUCENT: &str = "filtered-translucent";
pub const FILTERED_HIDDEN: &str = "filtered-hidden";

/// Aggregation rollup badge shown on edge groups.
pub const BADGE_AGGREGATION: &str = "badge-aggregation";
/// Child-count badge shown on collapsed groups.
pub const BADGE_CONNECTIONS: &str = "badge-connections";

pub const EDGE_GROUP_WIDE: &str = "edge-group-wide";
pub const CONDITION_STYLE_PREFIX: &str = "cond-style-";
pub const PATH_HIGHLIGHT: &str = "path-highlight";

pub fn icon_class(icon: &str) -> String {
    format!("{ICON_PREFIX}{icon}")
}

/// Class for a condition style: the selector slugged to lowercase
/// alphanumerics separated by single dashes.
pub fn condition_class(selector: &str) -> String {
    let mut slug = String::with_capacity(selector.len());
    for ch in selector.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    format!("{CONDITION_STYLE_PREFIX}{slug}")
}

pub fn is_filtered_out(classes: &[String]) -> bool {
    classes
        .iter()
        .any(|c| c == FILTERED_HIDDEN || c == FILTERED_TRANSLUCENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_classes_are_slugged() {
        assert_eq!(condition_class("High Risk!"), "cond-style-high-risk");
        assert_eq!(condition_class("  a__b  "), "cond-style-a-b");
        assert_eq!(icon_class("user"), "icon-user");
    }
}
