use anyhow::{bail, Result};
use serde_json::Value;

/// Required non-empty string param, trimmed.
pub fn req_str(params: &Value, key: &str) -> Result<String> {
    let Some(v) = params.get(key) else {
        bail!("missing {}", key);
    };
    let Some(s) = v.as_str() else {
        bail!("{} must be a string", key);
    };
    let s = s.trim();
    if s.is_empty() {
        bail!("{} must not be empty", key);
    }
    Ok(s.to_string())
}

/// Optional string; absent yields None, present-but-not-a-string is an error.
pub fn opt_str(params: &Value, key: &str) -> Result<Option<String>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(_) => bail!("{} must be a string", key),
    }
}

pub fn req_i64(params: &Value, key: &str) -> Result<i64> {
    params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| anyhow::anyhow!("{} must be an integer", key))
}

pub fn opt_i64(params: &Value, key: &str) -> Result<Option<i64>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => match v.as_i64() {
            Some(n) => Ok(Some(n)),
            None => bail!("{} must be an integer", key),
        },
    }
}

pub fn opt_bool(params: &Value, key: &str) -> Result<Option<bool>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => match v.as_bool() {
            Some(b) => Ok(Some(b)),
            None => bail!("{} must be a boolean", key),
        },
    }
}

/// Required array of string ids.
pub fn req_id_list(params: &Value, key: &str) -> Result<Vec<String>> {
    let Some(v) = params.get(key) else {
        bail!("missing {}", key);
    };
    let Some(arr) = v.as_array() else {
        bail!("{} must be an array", key);
    };
    let mut out = Vec::with_capacity(arr.len());
    for item in arr {
        match item.as_str() {
            Some(s) if !s.is_empty() => out.push(s.to_string()),
            _ => bail!("{} entries must be non-empty strings", key),
        }
    }
    Ok(out)
}

/// A number field that may be explicitly nulled (a bound being re-entered).
/// Distinguishes "absent" (`None`) from "set to null" (`Some(None)`).
pub fn nullable_f64(v: &Value, key: &str) -> Result<Option<f64>> {
    if v.is_null() {
        return Ok(None);
    }
    match v.as_f64() {
        Some(n) if n.is_finite() => Ok(Some(n)),
        _ => bail!("{} must be a number or null", key),
    }
}

pub fn finite_f64(v: &Value, key: &str) -> Result<f64> {
    match v.as_f64() {
        Some(n) if n.is_finite() => Ok(n),
        _ => bail!("{} must be a number", key),
    }
}
