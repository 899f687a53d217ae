//! Field-level coercions and normalizations used by the cleaner and by inspection.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::domain::RawRecord;

/// Coerce a raw price to a finite number.
///
/// Numbers and numeric strings (surrounding whitespace allowed) coerce; anything else,
/// including `"N/A"`, booleans and non-finite values, is `None`.
pub fn coerce_price(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|p| p.is_finite())
}

/// Render a scalar as text. Strings pass through untouched; numbers and booleans are
/// stringified; arrays and objects have no text form.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Upper-case the first letter of each word and lower-case the rest.
///
/// Whitespace and hyphens start a new word; apostrophes do not, so "men's" stays "Men's".
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_whitespace() || ch == '-' {
            out.push(ch);
            at_word_start = true;
        } else if at_word_start {
            out.extend(ch.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

/// First `max_chars` characters of `text`; no ellipsis.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Canonical text for a JSON number. Integers hash exactly; an integral float that fits
/// in `i64` shares the integer key so `1` and `1.0` match.
fn number_key(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return format!("i:{}", i);
    }
    if let Some(u) = n.as_u64() {
        return format!("i:{}", u);
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            format!("i:{}", f as i64)
        }
        Some(f) => format!("f:{}", f),
        None => format!("n:{}", n),
    }
}

/// Content fingerprint of a row over the given columns.
///
/// Absent keys and `null` hash the same. Numbers hash by value so `1` and `1.0` match,
/// but a numeric string never matches a number.
pub fn row_fingerprint(columns: &[String], row: &RawRecord) -> String {
    let mut hasher = Sha256::new();
    for column in columns {
        let cell = match row.get(column) {
            None | Some(Value::Null) => "null".to_string(),
            Some(Value::Number(n)) => number_key(n),
            Some(other) => format!("v:{}", other),
        };
        hasher.update(column.as_bytes());
        hasher.update([0x1f]);
        hasher.update(cell.as_bytes());
        hasher.update([0x1e]);
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_price() {
        assert_eq!(coerce_price(&json!(19.99)), Some(19.99));
        assert_eq!(coerce_price(&json!("19.99")), Some(19.99));
        assert_eq!(coerce_price(&json!(" 42 ")), Some(42.0));
        assert_eq!(coerce_price(&json!("1e3")), Some(1000.0));
        assert_eq!(coerce_price(&json!("N/A")), None);
        assert_eq!(coerce_price(&json!("")), None);
        assert_eq!(coerce_price(&json!("inf")), None);
        assert_eq!(coerce_price(&json!("NaN")), None);
        assert_eq!(coerce_price(&json!(true)), None);
        assert_eq!(coerce_price(&json!([1])), None);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("electronics"), "Electronics");
        assert_eq!(title_case("men's CLOTHING"), "Men's Clothing");
        assert_eq!(title_case("home  and garden"), "Home  And Garden");
        assert_eq!(title_case("Uncategorized"), "Uncategorized");
        assert_eq!(title_case("éLECTRO ménager"), "Électro Ménager");
        assert_eq!(title_case("slim-fit t-SHIRT"), "Slim-Fit T-Shirt");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
        assert_eq!(truncate_chars("short", 100), "short");
    }

    #[test]
    fn test_fingerprint_distinguishes_string_and_number() {
        let columns = vec!["title".to_string(), "price".to_string()];
        let a = json!({"title": "Widget", "price": "19.99"}).as_object().unwrap().clone();
        let b = json!({"title": "Widget", "price": 19.99}).as_object().unwrap().clone();
        let c = json!({"price": 19.99, "title": "Widget"}).as_object().unwrap().clone();
        assert_ne!(row_fingerprint(&columns, &a), row_fingerprint(&columns, &b));
        assert_eq!(row_fingerprint(&columns, &b), row_fingerprint(&columns, &c));
    }

    #[test]
    fn test_fingerprint_keeps_large_integers_apart() {
        let columns = vec!["id".to_string(), "price".to_string()];
        let a = json!({"id": 9007199254740993u64, "price": 5}).as_object().unwrap().clone();
        let b = json!({"id": 9007199254740992u64, "price": 5}).as_object().unwrap().clone();
        let c = json!({"id": 9007199254740992u64, "price": 5.0}).as_object().unwrap().clone();
        assert_ne!(row_fingerprint(&columns, &a), row_fingerprint(&columns, &b));
        assert_eq!(row_fingerprint(&columns, &b), row_fingerprint(&columns, &c));
    }

    #[test]
    fn test_fingerprint_absent_equals_null() {
        let columns = vec!["title".to_string(), "category".to_string()];
        let a = json!({"title": "Lamp"}).as_object().unwrap().clone();
        let b = json!({"title": "Lamp", "category": null}).as_object().unwrap().clone();
        assert_eq!(row_fingerprint(&columns, &a), row_fingerprint(&columns, &b));
    }
}
