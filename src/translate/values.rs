//! Coercions for loosely typed JSON fields.

use serde_json::Value;

/// Parse an integer the lenient way: numbers truncate toward zero, strings
/// are read from their leading `[+-]?digits` after leading whitespace.
/// Everything else is `None`.
pub fn leading_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i)
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                    .map(|f| f.trunc() as i64)
            }
        }
        Value::String(s) => leading_int_str(s),
        _ => None,
    }
}

fn leading_int_str(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    let magnitude: i64 = rest[..digits_end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// A model-id candidate: trimmed non-empty strings and numbers count.
pub fn non_empty_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Compact JSON text for a value.
pub fn json_text(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_leading_int() {
        assert_eq!(leading_int(&json!(5)), Some(5));
        assert_eq!(leading_int(&json!(-3)), Some(-3));
        assert_eq!(leading_int(&json!(3.9)), Some(3));
        assert_eq!(leading_int(&json!("12")), Some(12));
        assert_eq!(leading_int(&json!("  7tokens")), Some(7));
        assert_eq!(leading_int(&json!("-4")), Some(-4));
        assert_eq!(leading_int(&json!("abc")), None);
        assert_eq!(leading_int(&json!("")), None);
        assert_eq!(leading_int(&json!("-")), None);
        assert_eq!(leading_int(&json!(null)), None);
        assert_eq!(leading_int(&json!(true)), None);
        assert_eq!(leading_int(&json!({"n": 1})), None);
    }

    #[test]
    fn test_non_empty_text() {
        assert_eq!(non_empty_text(&json!("  gpt  ")), Some("gpt".to_string()));
        assert_eq!(non_empty_text(&json!("   ")), None);
        assert_eq!(non_empty_text(&json!(7)), Some("7".to_string()));
        assert_eq!(non_empty_text(&json!(null)), None);
        assert_eq!(non_empty_text(&json!(["x"])), None);
    }
}
