/// Exact base-10 value used for numeric equality, so `0.1 + 0.2`-style
/// binary rounding never leaks into `num-eq`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimal {
    negative: bool,
    /// Significant digits without leading or trailing zeros. Empty for zero.
    digits: String,
    exponent: i64,
}

impl Decimal {
    pub fn parse(raw: &str) -> Option<Self> {
        let text = raw.trim();
        let (negative, body) = match text.as_bytes().first()? {
            b'-' => (true, &text[1..]),
            b'+' => (false, &text[1..]),
            _ => (false, text),
        };
        let (mantissa, exponent) = match body.find(['e', 'E']) {
            Some(at) => (&body[..at], body[at + 1..].parse::<i64>().ok()?),
            None => (body, 0),
        };
        let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(whole) || !all_digits(fraction) {
            return None;
        }

        let joined = format!("{whole}{fraction}");
        let significant = joined.trim_start_matches('0');
        let stripped = significant.trim_end_matches('0');
        if stripped.is_empty() {
            return Some(Self::zero());
        }
        let trailing_zeros = i64::try_from(significant.len() - stripped.len()).ok()?;
        let fraction_len = i64::try_from(fraction.len()).ok()?;
        // Exponents at the edge of i64 are not numbers we can compare.
        let exponent = exponent
            .checked_sub(fraction_len)?
            .checked_add(trailing_zeros)?;
        Some(Self {
            negative,
            digits: stripped.to_string(),
            exponent,
        })
    }

    fn zero() -> Self {
        Self {
            negative: false,
            digits: String::new(),
            exponent: 0,
        }
    }
}

/// `Some(equal)` when both sides are numbers, `None` otherwise.
pub fn decimal_eq(left: &str, right: &str) -> Option<bool> {
    Some(Decimal::parse(left)? == Decimal::parse(right)?)
}
