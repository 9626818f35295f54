//! Number formatting shared by payload builders and previews.

/// Format a value with up to six decimals, dropping trailing zeros.
///
/// `1021.0` becomes `"1021"`, `3.10` becomes `"3.1"`.
pub fn format_number(value: f64) -> String {
    let text = format!("{value:.6}");
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        return "0".to_string();
    }
    trimmed.to_string()
}

/// Format an optional value, using an empty string for missing values.
pub fn format_optional(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_default()
}
