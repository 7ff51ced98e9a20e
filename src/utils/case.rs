//! Key-case conversion for request bodies.
//!
//! The service speaks snake_case. Typed bodies already serialize that way;
//! free-form maps such as evaluation contexts and polling properties are
//! converted here, recursively through nested objects and arrays.

use serde_json::{Map, Value};

/// Converts a single camelCase identifier to snake_case.
///
/// A run of capitals is one word (`userID` becomes `user_id`, `HTTPHeader`
/// becomes `http_header`). Identifiers that are already snake_case come
/// back unchanged.
pub fn camel_to_snake(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_ascii_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let starts_word = match prev {
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                _ => false,
            };
            if starts_word {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Rewrites every object key in `value` to snake_case.
pub fn snake_case_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (camel_to_snake(&k), snake_case_keys(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(snake_case_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_camel_to_snake() {
        assert_eq!(camel_to_snake("userId"), "user_id");
        assert_eq!(camel_to_snake("defaultOnVariationId"), "default_on_variation_id");
        assert_eq!(camel_to_snake("already_snake"), "already_snake");
        assert_eq!(camel_to_snake("Platform"), "platform");
    }

    #[test]
    fn test_camel_to_snake_keeps_acronyms_together() {
        assert_eq!(camel_to_snake("userID"), "user_id");
        assert_eq!(camel_to_snake("HTTPHeader"), "http_header");
        assert_eq!(camel_to_snake("deviceOSVersion"), "device_os_version");
        assert_eq!(camel_to_snake("ID"), "id");
    }

    #[test]
    fn test_nested_objects_and_arrays() {
        let converted = snake_case_keys(json!({
            "context": {"userId": "u1", "deviceInfo": {"osVersion": 17}},
            "items": [{"itemKey": 1}, "plainString"],
        }));

        assert_eq!(
            converted,
            json!({
                "context": {"user_id": "u1", "device_info": {"os_version": 17}},
                "items": [{"item_key": 1}, "plainString"],
            })
        );
    }
}
