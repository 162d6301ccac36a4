/// Edit distance over Unicode scalar values.
pub fn levenshtein(left: &str, right: &str) -> usize {
    let right: Vec<char> = right.chars().collect();
    let mut previous: Vec<usize> = (0..=right.len()).collect();
    let mut current = vec![0; right.len() + 1];

    for (i, left_char) in left.chars().enumerate() {
        current[0] = i + 1;
        for (j, right_char) in right.iter().enumerate() {
            let substitution = previous[j] + usize::from(left_char != *right_char);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[right.len()]
}

/// `1 - distance / longest`, so identical strings score 1.0.
pub fn similarity(left: &str, right: &str) -> f64 {
    let longest = left.chars().count().max(right.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(left, right) as f64 / longest as f64
}

/// Two empty strings always match. Otherwise thresholds outside `[0, 1]`
/// (or NaN) never match.
pub fn fuzzy_matches(value: &str, pattern: &str, threshold: f64) -> bool {
    if value.is_empty() && pattern.is_empty() {
        return true;
    }
    if !(0.0..=1.0).contains(&threshold) {
        return false;
    }
    similarity(value, pattern) >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distances() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
        assert_eq!(levenshtein("über", "uber"), 1);
    }

    #[test]
    fn threshold_rules() {
        assert!(fuzzy_matches("jon", "john", 0.7));
        assert!(!fuzzy_matches("jon", "john", 0.8));
        assert!(fuzzy_matches("", "", 1.0));
        assert!(!fuzzy_matches("jon", "jon", f64::NAN));
        assert!(!fuzzy_matches("jon", "jon", 1.5));
        assert!(!fuzzy_matches("jon", "jon", -0.1));
    }

    #[test]
    fn empty_sides_match_under_any_threshold() {
        assert!(fuzzy_matches("", "", f64::NAN));
        assert!(fuzzy_matches("", "", 2.0));
        assert!(!fuzzy_matches("", "a", f64::NAN));
    }
}
