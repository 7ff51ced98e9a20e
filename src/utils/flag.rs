//! Predicates over a set of evaluated flags keyed by flag key.

use std::collections::HashMap;

use crate::types::{FlagStatus, FlagValue, FlagValueType, FlagVariationValue};

pub fn flag_is_on(flags: &HashMap<String, FlagVariationValue>, key: &str) -> bool {
    flags.get(key).map(|f| f.is_on()).unwrap_or(false)
}

/// A missing flag counts as off.
pub fn flag_is_off(flags: &HashMap<String, FlagVariationValue>, key: &str) -> bool {
    match flags.get(key) {
        None => true,
        Some(flag) => flag.status == Some(FlagStatus::Off),
    }
}

/// Compares the string field for `STRING` flags and the boolean field for
/// every other type.
pub fn flag_equals_value(
    flags: &HashMap<String, FlagVariationValue>,
    key: &str,
    expected: &FlagValue,
) -> bool {
    let Some(flag) = flags.get(key) else {
        return false;
    };

    match flag.value_type {
        Some(FlagValueType::String) => match (flag.value.as_str(), expected) {
            (Some(actual), FlagValue::String(expected)) => actual == expected,
            _ => false,
        },
        _ => match (flag.value.as_bool(), expected) {
            (Some(actual), FlagValue::Boolean(expected)) => actual == *expected,
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VariationValue;

    fn flags() -> HashMap<String, FlagVariationValue> {
        let mut flags = HashMap::new();
        flags.insert(
            "dark-mode".to_string(),
            FlagVariationValue {
                key: "dark-mode".to_string(),
                status: Some(FlagStatus::On),
                value: VariationValue::boolean(true),
                value_type: Some(FlagValueType::Boolean),
            },
        );
        flags.insert(
            "theme".to_string(),
            FlagVariationValue {
                key: "theme".to_string(),
                status: Some(FlagStatus::Off),
                value: VariationValue::string("light"),
                value_type: Some(FlagValueType::String),
            },
        );
        flags
    }

    #[test]
    fn test_on_off() {
        let flags = flags();
        assert!(flag_is_on(&flags, "dark-mode"));
        assert!(!flag_is_off(&flags, "dark-mode"));
        assert!(flag_is_off(&flags, "theme"));
        assert!(flag_is_off(&flags, "missing"));
        assert!(!flag_is_on(&flags, "missing"));
    }

    #[test]
    fn test_equals_value_uses_type_tag() {
        let flags = flags();
        assert!(flag_equals_value(&flags, "theme", &FlagValue::from("light")));
        assert!(!flag_equals_value(&flags, "theme", &FlagValue::from("dark")));
        assert!(flag_equals_value(&flags, "dark-mode", &FlagValue::Boolean(true)));
        assert!(!flag_equals_value(&flags, "dark-mode", &FlagValue::from("true")));
        assert!(!flag_equals_value(&flags, "missing", &FlagValue::Boolean(false)));
    }
}
