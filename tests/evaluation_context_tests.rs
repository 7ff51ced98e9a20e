use numerator::EvaluationContext;
use serde_json::json;
use std::collections::HashMap;

#[test]
fn test_empty_context() {
    let context = EvaluationContext::new();

    assert!(context.is_empty());
    assert_eq!(context.len(), 0);
    assert_eq!(context.to_value(), json!({}));
}

#[test]
fn test_equality_ignores_insertion_order() {
    let a = EvaluationContext::new()
        .attribute("platform", "android")
        .attribute("country", "VN");
    let b = EvaluationContext::new()
        .attribute("country", "VN")
        .attribute("platform", "android");

    assert_eq!(a, b);
}

#[test]
fn test_equality_is_deep() {
    let a = EvaluationContext::new().attribute("user", json!({"id": 1, "tags": ["beta"]}));
    let b = EvaluationContext::new().attribute("user", json!({"tags": ["beta"], "id": 1}));
    let c = EvaluationContext::new().attribute("user", json!({"id": 1, "tags": ["ga"]}));

    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_serializes_as_flat_map() {
    let context: EvaluationContext = [("platform", "ios"), ("country", "US")]
        .into_iter()
        .collect();

    let value = serde_json::to_value(&context).unwrap();
    assert_eq!(value, json!({"platform": "ios", "country": "US"}));

    let back: EvaluationContext = serde_json::from_value(value).unwrap();
    assert_eq!(back, context);
}

#[test]
fn test_insert_and_remove() {
    let mut attrs = HashMap::new();
    attrs.insert("plan".to_string(), json!("premium"));
    let mut context = EvaluationContext::from(attrs);

    assert_eq!(context.insert("plan", "free"), Some(json!("premium")));
    assert_eq!(context.remove("plan"), Some(json!("free")));
    assert!(context.remove("plan").is_none());
    assert!(!context.contains_key("plan"));
}
