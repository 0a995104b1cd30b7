//! JSON Pointer evaluation for result reference paths
//!
//! RFC 6901 pointers, extended by RFC 8620 §3.7: a `*` token applied to an
//! array maps the rest of the pointer over every item, flattening items
//! whose own result is an array.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointerError {
    #[error("pointer must be empty or start with '/'")]
    Syntax,

    #[error("no value at token '{0}'")]
    NotFound(String),

    #[error("token '{0}' applied to a value that is neither object nor array")]
    NotContainer(String),
}

/// Evaluate `path` against `value`
pub fn evaluate(value: &Value, path: &str) -> Result<Value, PointerError> {
    if path.is_empty() {
        return Ok(value.clone());
    }

    let rest = path.strip_prefix('/').ok_or(PointerError::Syntax)?;
    let tokens: Vec<String> = rest.split('/').map(unescape).collect();
    resolve(value, &tokens)
}

fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

fn resolve(value: &Value, tokens: &[String]) -> Result<Value, PointerError> {
    let Some((token, rest)) = tokens.split_first() else {
        return Ok(value.clone());
    };

    match value {
        Value::Array(items) if token == "*" => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match resolve(item, rest)? {
                    Value::Array(nested) => out.extend(nested),
                    other => out.push(other),
                }
            }
            Ok(Value::Array(out))
        }
        Value::Array(items) => {
            let item = parse_index(token)
                .and_then(|index| items.get(index))
                .ok_or_else(|| PointerError::NotFound(token.clone()))?;
            resolve(item, rest)
        }
        Value::Object(map) => {
            let item = map
                .get(token.as_str())
                .ok_or_else(|| PointerError::NotFound(token.clone()))?;
            resolve(item, rest)
        }
        _ => Err(PointerError::NotContainer(token.clone())),
    }
}

// Array indices have no leading zeros and no sign
fn parse_index(token: &str) -> Option<usize> {
    if token.len() > 1 && token.starts_with('0') {
        return None;
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}
