//! Query-string encoding for GET and DELETE data.
//!
//! Mirrors the usual form-style encoding: nested arrays and objects flatten
//! into bracketed keys (`filter[tags][0]=a`), booleans become `1`/`0`, nulls
//! are dropped, and every key and value is percent-encoded.

use serde_json::Value;

use crate::error::ApiError;

/// Encode `data` as `key=value` pairs joined with `&`.
///
/// `Null` and empty containers yield an empty string. Scalars at the top
/// level have no key to hang on and are rejected.
pub fn build_query(data: &Value) -> Result<String, ApiError> {
    let mut pairs = Vec::new();
    match data {
        Value::Null => {}
        Value::Object(map) => {
            for (key, value) in map {
                append_pair(&mut pairs, key, value);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                append_pair(&mut pairs, &index.to_string(), value);
            }
        }
        other => {
            return Err(ApiError::Serialization(format!(
                "query data must be an object or an array, got {other}"
            )))
        }
    }
    Ok(pairs.join("&"))
}

fn append_pair(pairs: &mut Vec<String>, key: &str, value: &Value) {
    let scalar = match value {
        Value::Null => return,
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                append_pair(pairs, &format!("{key}[{index}]"), item);
            }
            return;
        }
        Value::Object(map) => {
            for (sub, item) in map {
                append_pair(pairs, &format!("{key}[{sub}]"), item);
            }
            return;
        }
    };
    pairs.push(format!(
        "{}={}",
        urlencoding::encode(key),
        urlencoding::encode(&scalar)
    ));
}
