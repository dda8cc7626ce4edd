//! Pure field predicates shared by the form rule tables.

use rust_decimal::Decimal;

/// Non-empty text
pub fn required(value: &str) -> bool {
    !value.is_empty()
}

/// At least `min` characters
pub fn min_chars(value: &str, min: usize) -> bool {
    value.chars().count() >= min
}

/// A parsed number that is zero or more. `None` stands for input that did not parse.
pub fn non_negative_decimal(value: Option<Decimal>) -> bool {
    matches!(value, Some(v) if v >= Decimal::ZERO)
}

pub fn non_negative_int(value: Option<i32>) -> bool {
    matches!(value, Some(v) if v >= 0)
}

/// Largest price the `NUMERIC(12, 2)` column holds, exclusive
pub const PRICE_LIMIT: Decimal = Decimal::from_parts(1410065408, 2, 0, false, 0);

/// Price fits the storage column: at most two decimals and below [`PRICE_LIMIT`]
pub fn storable_price(value: Decimal) -> bool {
    value.normalize().scale() <= 2 && value.abs() < PRICE_LIMIT
}

/// `value` does not exceed `limit`; unparsed input is left to the numeric rule
pub fn not_above(value: Option<i32>, limit: i32) -> bool {
    value.map_or(true, |v| v <= limit)
}

/// Parse a numeric text input. Blank or malformed input yields `None`.
pub fn parse_decimal(input: &str) -> Option<Decimal> {
    input.trim().parse().ok()
}

pub fn parse_int(input: &str) -> Option<i32> {
    input.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_empty_only() {
        assert!(!required(""));
        assert!(required("Widget"));
    }

    #[test]
    fn numeric_rules_fail_on_unparsed_input() {
        assert!(!non_negative_decimal(parse_decimal("abc")));
        assert!(!non_negative_int(parse_int("")));
        assert!(non_negative_int(parse_int(" 0 ")));
        assert!(!non_negative_decimal(parse_decimal("-0.5")));
        assert!(non_negative_decimal(parse_decimal("12.50")));
    }

    #[test]
    fn not_above_ignores_unparsed() {
        assert!(not_above(None, 3));
        assert!(not_above(Some(3), 3));
        assert!(!not_above(Some(4), 3));
    }

    #[test]
    fn storable_price_matches_column() {
        assert_eq!(PRICE_LIMIT, Decimal::from(10_000_000_000i64));
        assert!(storable_price(Decimal::new(999_999_999_999, 2)));
        assert!(storable_price(Decimal::new(2500, 3)));
        assert!(!storable_price(Decimal::new(1234, 3)));
        assert!(!storable_price(PRICE_LIMIT));
    }

    #[test]
    fn min_chars_counts_characters() {
        assert!(min_chars("pässwörd", 8));
        assert!(!min_chars("short", 8));
    }
}
