use tracing::debug;

/// Cell contents that all mean "no value".
pub const NULL_TOKENS: [&str; 5] = ["null", "NA", "NaN", "", ".."];

/// 1) Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

/// Header cells may carry a UTF-8 byte-order mark on the first column.
pub fn clean_header(raw: &str) -> String {
    clean_str(raw.trim_start_matches('\u{feff}'))
}

pub fn is_null_token(cleaned: &str) -> bool {
    NULL_TOKENS.contains(&cleaned)
}

/// 2) Parse an indicator cell. Null tokens, unparsable text, NaN and
///    infinities all collapse to `None`.
pub fn parse_rate(raw: &str) -> Option<f64> {
    let cleaned = clean_str(raw);
    if is_null_token(&cleaned) {
        return None;
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        Ok(_) => None,
        Err(_) => {
            debug!(value = %cleaned, "unparsable indicator value treated as missing");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_tokens_are_equivalent() {
        for raw in ["", "..", "NA", "NaN", "null", "  ..  ", "\"..\""] {
            assert_eq!(parse_rate(raw), None, "token {:?}", raw);
        }
    }

    #[test]
    fn numbers_are_kept_verbatim() {
        assert_eq!(parse_rate("15.2"), Some(15.2));
        assert_eq!(parse_rate(" 49.9 "), Some(49.9));
        assert_eq!(parse_rate("-18.35"), Some(-18.35));
        assert_eq!(parse_rate("1195.41234567"), Some(1195.41234567));
    }

    #[test]
    fn junk_and_nan_are_missing() {
        assert_eq!(parse_rate("n/a"), None);
        assert_eq!(parse_rate("nan"), None);
    }

    #[test]
    fn infinities_are_missing() {
        assert_eq!(parse_rate("inf"), None);
        assert_eq!(parse_rate("-inf"), None);
        assert_eq!(parse_rate("1e400"), None);
    }

    #[test]
    fn header_bom_is_stripped() {
        assert_eq!(clean_header("\u{feff}Country Name"), "Country Name");
        assert_eq!(clean_header(" \"Series Code\" "), "Series Code");
    }
}
