use numerator::{
    EvaluationContext, FlagValue, FlagsManager, LookupOptions, MockFlag, MockFlagStore,
    MockTransport, NumeratorOptions,
};
use std::sync::Arc;

fn android() -> EvaluationContext {
    EvaluationContext::new().attribute("platform", "android")
}

fn ios() -> EvaluationContext {
    EvaluationContext::new().attribute("platform", "ios")
}

fn mocked_engine(store: &MockFlagStore, default_context: EvaluationContext) -> FlagsManager {
    let options = NumeratorOptions::builder("mock-key")
        .default_context(default_context)
        .load_polling_on_start(false)
        .build();
    FlagsManager::with_transport(options, Arc::new(MockTransport::new(store.clone()))).unwrap()
}

#[tokio::test]
async fn test_lookups_resolve_against_mocked_flags() {
    let store = MockFlagStore::with_flags(vec![
        MockFlag::new("dark-mode", true, android()),
        MockFlag::new("dark-mode", false, ios()),
        MockFlag::new("theme", "blue", android()),
        MockFlag::new("limit", 25, android()),
    ]);
    let manager = mocked_engine(&store, android());

    assert!(
        manager
            .get_boolean_flag("dark-mode", false, LookupOptions::default())
            .await
    );
    assert!(
        !manager
            .get_boolean_flag("dark-mode", true, LookupOptions::with_context(ios()))
            .await
    );
    assert_eq!(
        manager
            .get_string_flag("theme", "red", LookupOptions::default())
            .await,
        "blue"
    );
    assert_eq!(
        manager
            .get_number_flag("limit", 0.0, LookupOptions::default())
            .await,
        25.0
    );
}

#[tokio::test]
async fn test_unmatched_lookup_falls_back_to_default() {
    let store = MockFlagStore::new();
    let manager = mocked_engine(&store, android());

    let value = manager
        .get_feature_flag("missing", Some(FlagValue::from("fallback")), LookupOptions::default())
        .await
        .unwrap();

    assert_eq!(value, FlagValue::from("fallback"));
}

#[tokio::test]
async fn test_poll_caches_flags_for_default_context() {
    let store = MockFlagStore::with_flags(vec![
        MockFlag::new("a", true, android()),
        MockFlag::new("b", "x", android()),
        MockFlag::new("c", true, ios()),
    ]);
    let manager = mocked_engine(&store, android());

    manager.fetch_polling_feature_flag().await;

    let cache = manager.cache_flags();
    assert_eq!(cache.len(), 2);
    assert!(cache.contains_key("a"));
    assert!(cache.contains_key("b"));
}

#[tokio::test]
async fn test_store_changes_are_visible_to_engine() {
    let store = MockFlagStore::new();
    let manager = mocked_engine(&store, android());

    assert!(
        !manager
            .get_boolean_flag("late", false, LookupOptions::default())
            .await
    );

    store.add(MockFlag::new("late", true, android()));
    assert!(
        manager
            .get_boolean_flag("late", false, LookupOptions::default())
            .await
    );

    store.remove("late");
    assert!(
        !manager
            .get_boolean_flag("late", false, LookupOptions::default())
            .await
    );
}
