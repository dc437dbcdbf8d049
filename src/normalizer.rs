use crate::model::ParseError;

/// Turns raw price text such as `"$1,234.56"` into a number.
///
/// Grouping commas are removed and any currency markers around the number
/// are trimmed. Text using a decimal comma (`1.234,56`) is rejected rather
/// than misread.
pub fn normalize_price(text: &str) -> Result<f64, ParseError> {
    if has_decimal_comma(text) {
        return Err(ParseError::NotNumeric(text.to_string()));
    }
    let stripped: String = text.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    let core = stripped
        .trim_start_matches(|c: char| !c.is_ascii_digit() && c != '-')
        .trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.');

    let price: f64 = core
        .parse()
        .map_err(|_| ParseError::NotNumeric(text.to_string()))?;
    if !price.is_finite() {
        return Err(ParseError::NotNumeric(text.to_string()));
    }
    if price < 0.0 {
        return Err(ParseError::Negative(price));
    }
    Ok(price)
}

/// True when a comma follows a decimal point that sits after a digit,
/// as in `1.234,56`. A dot after a currency abbreviation (`Rs.1,234`) is ignored.
fn has_decimal_comma(text: &str) -> bool {
    let mut prev: Option<char> = None;
    let mut last_dot = None;
    for (i, c) in text.char_indices() {
        if c == '.' && prev.is_some_and(|p| p.is_ascii_digit()) {
            last_dot = Some(i);
        }
        prev = Some(c);
    }
    last_dot.is_some_and(|dot| text[dot..].contains(','))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_grouping_and_currency() {
        assert_eq!(normalize_price("$1,234.56"), Ok(1234.56));
        assert_eq!(normalize_price("  ₹ 12,999 "), Ok(12999.0));
        assert_eq!(normalize_price("1,100.00"), Ok(1100.0));
        assert_eq!(normalize_price("49.99 USD"), Ok(49.99));
    }

    #[test]
    fn continental_decimals_are_rejected() {
        assert!(matches!(normalize_price("1.234,56"), Err(ParseError::NotNumeric(_))));
        assert!(matches!(normalize_price("€ 1.099,00"), Err(ParseError::NotNumeric(_))));
        assert_eq!(normalize_price("Rs.1,234"), Ok(1234.0));
    }

    #[test]
    fn amazon_whole_part_keeps_trailing_dot() {
        assert_eq!(normalize_price("1,234."), Ok(1234.0));
    }

    #[test]
    fn rejects_non_numeric_and_negative() {
        assert!(matches!(normalize_price("Currently unavailable"), Err(ParseError::NotNumeric(_))));
        assert!(matches!(normalize_price(""), Err(ParseError::NotNumeric(_))));
        assert!(matches!(normalize_price("$12.50$12.50"), Err(ParseError::NotNumeric(_))));
        assert_eq!(normalize_price("-5.00"), Err(ParseError::Negative(-5.0)));
    }
}
