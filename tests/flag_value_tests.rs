use numerator::{
    flag_equals_value, flag_is_off, flag_is_on, FlagStatus, FlagValue, FlagValueType,
    FlagVariationValue, VariationValue,
};
use serde_json::json;
use std::collections::HashMap;

#[test]
fn test_flag_value_accessors() {
    assert_eq!(FlagValue::from(true).as_bool(), Some(true));
    assert_eq!(FlagValue::from(3).as_number(), Some(3.0));
    assert_eq!(FlagValue::from("blue").as_str(), Some("blue"));
    assert!(FlagValue::from("blue").as_bool().is_none());
}

#[test]
fn test_flag_value_untagged_json() {
    assert_eq!(serde_json::to_value(FlagValue::from(true)).unwrap(), json!(true));
    assert_eq!(
        serde_json::from_value::<FlagValue>(json!("x")).unwrap(),
        FlagValue::String("x".to_string())
    );
    assert_eq!(
        serde_json::from_value::<FlagValue>(json!(1.5)).unwrap(),
        FlagValue::Number(1.5)
    );
}

#[test]
fn test_variation_value_reads_tagged_field() {
    let value: VariationValue =
        serde_json::from_value(json!({"long_value": 7, "double_value": 1.5})).unwrap();

    assert_eq!(value.as_number(), Some(7.0));
    assert_eq!(value.typed(FlagValueType::Double), Some(FlagValue::Number(1.5)));
    assert!(value.typed(FlagValueType::Boolean).is_none());
}

#[test]
fn test_integral_numbers_encode_as_long() {
    let (value, value_type) = VariationValue::from_flag_value(&FlagValue::from(4));
    assert_eq!(value_type, FlagValueType::Long);
    assert_eq!(value.long_value, Some(4));

    let (value, value_type) = VariationValue::from_flag_value(&FlagValue::from(0.25));
    assert_eq!(value_type, FlagValueType::Double);
    assert_eq!(value.double_value, Some(0.25));
}

#[test]
fn test_flag_predicates() {
    let mut flags = HashMap::new();
    flags.insert(
        "banner".to_string(),
        FlagVariationValue {
            key: "banner".to_string(),
            status: Some(FlagStatus::On),
            value: VariationValue::string("summer"),
            value_type: Some(FlagValueType::String),
        },
    );
    flags.insert(
        "legacy".to_string(),
        FlagVariationValue {
            key: "legacy".to_string(),
            status: Some(FlagStatus::Off),
            value: VariationValue::boolean(false),
            value_type: Some(FlagValueType::Boolean),
        },
    );

    assert!(flag_is_on(&flags, "banner"));
    assert!(flag_is_off(&flags, "legacy"));
    assert!(flag_is_off(&flags, "missing"));
    assert!(!flag_is_on(&flags, "missing"));

    assert!(flag_equals_value(&flags, "banner", &FlagValue::from("summer")));
    assert!(!flag_equals_value(&flags, "banner", &FlagValue::from(true)));
    assert!(flag_equals_value(&flags, "legacy", &FlagValue::from(false)));
    assert!(!flag_equals_value(&flags, "missing", &FlagValue::from(false)));
}
