//! Monetary amount parsing.
//!
//! Amounts arrive as loosely formatted strings (`"$12,345.67"`,
//! `"USD 1 200"`, `"(350.00)"`). Formatting characters are stripped and the
//! remainder parsed as a number; anything that still fails to parse is
//! `None`.

/// Currency symbols stripped before parsing.
const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥'];

/// Parses a formatted amount into a number.
///
/// Strips currency symbols, an optional `USD` marker, thousands separators
/// (`,` `_` and whitespace). Accounting-style parentheses make the value
/// negative. Returns `None` for empty, unparseable, or non-finite input.
#[must_use]
pub fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let (negative, body) = match trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let body = body.trim();
    let body = body
        .strip_prefix("USD")
        .or_else(|| body.strip_suffix("USD"))
        .unwrap_or(body);

    let cleaned: String = body
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c) && *c != ',' && *c != '_' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let value = cleaned.parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(if negative { -value } else { value })
}
