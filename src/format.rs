//! Percent and money formatting for published cells
//!
//! Both formatters accept whatever text a cell renders to and never fail:
//! input that does not parse as a number comes back in its trimmed form.
//! Re-applying a formatter to its own output returns the same string.

/// Render a percentage as `NN.NN%`.
///
/// A trailing `%` marks the value as already scaled. Otherwise a magnitude
/// of at most 1 is read as a fraction and multiplied by 100, anything larger
/// is taken as already scaled.
pub fn format_percent(raw: &str) -> String {
    let text = raw.trim();
    if text.is_empty() {
        return String::new();
    }

    if let Some(stripped) = text.strip_suffix('%') {
        return match parse_number(stripped) {
            Some(v) => format!("{:.2}%", v),
            None => text.to_string(),
        };
    }

    match parse_number(text) {
        Some(v) if v.abs() <= 1.0 => format!("{:.2}%", v * 100.0),
        Some(v) => format!("{:.2}%", v),
        None => text.to_string(),
    }
}

/// Render a money amount as `$N`, rounded to a whole number.
pub fn format_money(raw: &str) -> String {
    let text = raw.trim();
    if text.is_empty() {
        return String::new();
    }

    let cleaned: String = text
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();

    match parse_number(&cleaned) {
        Some(v) => format!("${}", v.round() as i64),
        None if text.starts_with('$') => text.to_string(),
        None => format!("${}", text),
    }
}

/// Lenient float parse used by both formatters
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_fraction() {
        assert_eq!(format_percent("0.2804"), "28.04%");
        assert_eq!(format_percent("0"), "0.00%");
        assert_eq!(format_percent("1"), "100.00%");
        assert_eq!(format_percent("-0.05"), "-5.00%");
    }

    #[test]
    fn test_percent_already_scaled() {
        assert_eq!(format_percent("28.04"), "28.04%");
        assert_eq!(format_percent("55"), "55.00%");
        assert_eq!(format_percent("28.04%"), "28.04%");
        assert_eq!(format_percent(" 7.5 % "), "7.50%");
    }

    #[test]
    fn test_percent_empty_and_text() {
        assert_eq!(format_percent(""), "");
        assert_eq!(format_percent("   "), "");
        assert_eq!(format_percent(" n/a "), "n/a");
        assert_eq!(format_percent("abc%"), "abc%");
    }

    #[test]
    fn test_percent_idempotent() {
        for input in ["0.2804", "28.04", "0.5", "150", "n/a", "", "-0.125"] {
            let once = format_percent(input);
            assert_eq!(format_percent(&once), once, "input {:?}", input);
        }
    }

    #[test]
    fn test_money() {
        assert_eq!(format_money("100"), "$100");
        assert_eq!(format_money("$100"), "$100");
        assert_eq!(format_money("1,250.6"), "$1251");
        assert_eq!(format_money(" $ 2,000 "), "$2000");
        assert_eq!(format_money("99.5"), "$100");
        assert_eq!(format_money("-20.4"), "$-20");
    }

    #[test]
    fn test_money_non_numeric() {
        assert_eq!(format_money("TBD"), "$TBD");
        assert_eq!(format_money("$TBD"), "$TBD");
        assert_eq!(format_money(""), "");
    }

    #[test]
    fn test_money_idempotent() {
        for input in ["100", "$100", "1,234.56", "TBD", "0.4", "-3"] {
            let once = format_money(input);
            assert_eq!(format_money(&once), once, "input {:?}", input);
        }
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 1.5 "), Some(1.5));
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number(""), None);
    }
}
