
//! Numeric cells as SAP GUI renders them
//!
//! Grid cells come back as text formatted with the user's SAP settings,
//! so `1000` can show up as `1.000`, `1.000,000`, `1000.0` or `1.0E+3`.

/// Normalize a SAP numeric cell into a plain integer string
///
/// Empty cells become `"0"`. Values that cannot be read as a number
/// are returned trimmed but otherwise unchanged.
pub fn normalize_sap_number(value: &str) -> String {
    let value = value.trim();

    if value.is_empty() {
        return "0".into();
    }

    match parse_number(value) {
        Some(n) => n.to_string(),
        None => value.into(),
    }
}

/// Parse a SAP numeric cell as an integer quantity
///
/// Fractions are truncated. Empty cells are `Some(0)`.
pub fn parse_sap_quantity(value: &str) -> Option<i64> {
    let value = value.trim();

    if value.is_empty() {
        return Some(0);
    }

    parse_number(value)
}

fn parse_number(value: &str) -> Option<i64> {
    // scientific notation, e.g. `1.0E+3`
    if value.contains(['e', 'E']) {
        return parse_float(value);
    }

    // decimal comma, e.g. `1.234,500`
    if let Some((int_part, frac)) = value.split_once(',') {
        if !frac.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        return match int_part.contains('.') {
            true => parse_thousands(int_part),
            false => int_part.parse().ok(),
        };
    }

    if value.contains('.') {
        // `1.000` reads as one thousand, not one
        return parse_thousands(value).or_else(|| parse_float(value));
    }

    value.parse().ok().or_else(|| parse_float(value))
}

/// `1.000` or `12.345.678`: dot separated groups of exactly three digits
fn parse_thousands(value: &str) -> Option<i64> {
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };

    let mut groups = digits.split('.');
    let head = groups.next()?;
    if head.is_empty() || head.len() > 3 || !head.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let mut joined = String::from(head);
    for group in groups {
        if group.len() != 3 || !group.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        joined.push_str(group);
    }

    let n: i64 = joined.parse().ok()?;
    Some(if negative { -n } else { n })
}

fn parse_float(value: &str) -> Option<i64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(|f| f.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_zero() {
        assert_eq!(normalize_sap_number(""), "0");
        assert_eq!(normalize_sap_number("   "), "0");
        assert_eq!(parse_sap_quantity(" "), Some(0));
    }

    #[test]
    fn scientific_notation() {
        assert_eq!(normalize_sap_number("1.0E+3"), "1000");
        assert_eq!(normalize_sap_number("2.5e2"), "250");
        assert_eq!(normalize_sap_number("1E"), "1E");
    }

    #[test]
    fn european_thousands() {
        assert_eq!(normalize_sap_number("1.000"), "1000");
        assert_eq!(normalize_sap_number("1.500"), "1500");
        assert_eq!(normalize_sap_number("12.345.678"), "12345678");
        assert_eq!(normalize_sap_number("-2.000"), "-2000");
    }

    #[test]
    fn european_decimal_comma() {
        assert_eq!(normalize_sap_number("1.234,500"), "1234");
        assert_eq!(normalize_sap_number("40,000"), "40");
        assert_eq!(normalize_sap_number("40,x"), "40,x");
    }

    #[test]
    fn plain_decimals_truncate() {
        assert_eq!(normalize_sap_number("1000.0"), "1000");
        assert_eq!(normalize_sap_number("1.5"), "1");
        assert_eq!(normalize_sap_number("99.99"), "99");
    }

    #[test]
    fn integers_and_garbage() {
        assert_eq!(normalize_sap_number(" 42 "), "42");
        assert_eq!(normalize_sap_number("abc"), "abc");
        assert_eq!(parse_sap_quantity("abc"), None);
        assert_eq!(parse_sap_quantity("1.000"), Some(1000));
    }
}
