//! Tolerant field deserializers for LLM-produced JSON.
//!
//! Small models routinely emit `1200.0` where an integer is expected, quote
//! numbers, or produce `null`. These helpers accept any of those shapes and
//! fall back to zero instead of failing the whole document.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Non-negative whole quantity; floats are rounded, negatives clamp to 0.
pub fn quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(as_f64(&value)
        .filter(|f| f.is_finite() && *f > 0.0)
        .map_or(0, |f| f.round() as u64))
}

/// Small whole count (route ids, vehicle numbers)
pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(as_f64(&value)
        .filter(|f| f.is_finite() && *f > 0.0)
        .map_or(0, |f| f.round().min(f64::from(u32::MAX)) as u32))
}

/// Finite float; anything unparseable becomes 0.0
pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(as_f64(&value).filter(|f| f.is_finite()).unwrap_or(0.0))
}

/// Free text; numbers and booleans are stringified, `null` becomes empty
pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    })
}

/// List of strings; a bare string becomes a one-element list
pub fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "quantity")]
        qty: u64,
        #[serde(default, deserialize_with = "number")]
        num: f64,
        #[serde(default, deserialize_with = "string_list")]
        list: Vec<String>,
        #[serde(default, deserialize_with = "text")]
        note: String,
    }

    #[test]
    fn float_quantities_are_rounded() {
        let p: Probe = serde_json::from_str(r#"{"qty": 1199.6}"#).unwrap();
        assert_eq!(p.qty, 1200);
    }

    #[test]
    fn negative_and_garbage_quantities_become_zero() {
        let p: Probe = serde_json::from_str(r#"{"qty": -40}"#).unwrap();
        assert_eq!(p.qty, 0);
        let p: Probe = serde_json::from_str(r#"{"qty": "lots"}"#).unwrap();
        assert_eq!(p.qty, 0);
    }

    #[test]
    fn quoted_numbers_with_separators_parse() {
        let p: Probe = serde_json::from_str(r#"{"qty": "8,000", "num": "25.5"}"#).unwrap();
        assert_eq!(p.qty, 8000);
        assert!((p.num - 25.5).abs() < f64::EPSILON);
    }

    #[test]
    fn not_available_number_is_zero() {
        let p: Probe = serde_json::from_str(r#"{"num": "N/A"}"#).unwrap();
        assert_eq!(p.num, 0.0);
    }

    #[test]
    fn bare_string_becomes_single_item_list() {
        let p: Probe = serde_json::from_str(r#"{"list": "food"}"#).unwrap();
        assert_eq!(p.list, vec!["food".to_string()]);
    }

    #[test]
    fn array_note_is_joined() {
        let p: Probe = serde_json::from_str(r#"{"note": ["escort Z03", "ford river"]}"#).unwrap();
        assert_eq!(p.note, "escort Z03; ford river");
    }

    #[test]
    fn missing_fields_use_defaults() {
        let p: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(p.qty, 0);
        assert!(p.list.is_empty());
        assert!(p.note.is_empty());
    }
}
