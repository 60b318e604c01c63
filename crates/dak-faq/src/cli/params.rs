//! `name=value` parameter parsing

use anyhow::Result;
use dak_faq_types::JsonMap;
use serde_json::{Value, json};

/// Parse parameter strings (name=value) into a map
///
/// Values are read as JSON scalars where they look like one; anything else is
/// a string. A name given more than once collects its values into an array.
pub fn parse_parameters(params: &[String]) -> Result<JsonMap> {
    let mut result = JsonMap::new();

    for param in params {
        let Some((name, value_str)) = param.split_once('=') else {
            anyhow::bail!("Invalid parameter format: '{}'. Expected 'name=value'", param);
        };
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("Invalid parameter format: '{}'. Name is empty", param);
        }

        let value = parse_value(value_str.trim());
        match result.get_mut(name) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                result.insert(name.to_string(), value);
            }
        }
    }

    Ok(result)
}

fn parse_value(value_str: &str) -> Value {
    if let Ok(num) = value_str.parse::<i64>() {
        json!(num)
    } else if let Ok(num) = value_str.parse::<f64>() {
        json!(num)
    } else if value_str == "true" || value_str == "false" {
        json!(value_str == "true")
    } else if value_str == "null" {
        Value::Null
    } else if value_str.starts_with('{') || value_str.starts_with('[') {
        serde_json::from_str(value_str).unwrap_or_else(|_| json!(value_str))
    } else {
        json!(value_str)
    }
}
