//! Numerator Rust SDK Lab
//!
//! Offline walkthrough of the flags manager backed by the mock transport.
//! Run with: cargo run --example sdk-lab
//! Set RUST_LOG=numerator=debug to see the engine's own logging.

use numerator::{
    EvaluationContext, FlagValue, FlagsManager, LookupOptions, MockFlag, MockFlagStore,
    MockTransport, NumeratorOptions,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const PASS: &str = "\x1b[32m[PASS]\x1b[0m";
const FAIL: &str = "\x1b[31m[FAIL]\x1b[0m";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Numerator Rust SDK Lab ===\n");

    let mut passed = 0;
    let mut failed = 0;

    macro_rules! check {
        ($test:expr, $ok:expr) => {{
            if $ok {
                println!("{} {}", PASS, $test);
                passed += 1;
            } else {
                println!("{} {}", FAIL, $test);
                failed += 1;
            }
        }};
    }

    let android = EvaluationContext::new().attribute("platform", "android");
    let ios = EvaluationContext::new().attribute("platform", "ios");

    let store = MockFlagStore::with_flags(vec![
        MockFlag::new("lab-bool", true, android.clone()),
        MockFlag::new("lab-bool", false, ios.clone()),
        MockFlag::new("lab-string", "Hello Lab", android.clone()),
        MockFlag::new("lab-number", 42, android.clone()),
    ]);

    let options = NumeratorOptions::builder("sdk_lab_test_key")
        .default_context(android.clone())
        .polling_interval(Duration::from_millis(200))
        .build();

    println!("Testing initialization...");
    let manager = match FlagsManager::with_transport(
        options,
        Arc::new(MockTransport::new(store.clone())),
    ) {
        Ok(manager) => manager,
        Err(e) => {
            check!(format!("Initialization - {}", e), false);
            print_summary(passed, failed);
            std::process::exit(1);
        }
    };
    check!("Initialization", manager.is_polling());

    let updates = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&updates);
    let listener = manager.handle_flag_updated(move |flags| {
        counter.fetch_add(1, Ordering::SeqCst);
        tracing::info!("Flag collection now holds {} flags", flags.len());
    });

    println!("\nTesting polling...");
    tokio::time::sleep(Duration::from_millis(50)).await;
    check!("First poll filled the cache", manager.cache_flags().len() == 3);
    check!("Update listener fired", updates.load(Ordering::SeqCst) >= 1);
    listener.unregister();

    println!("\nTesting lookups...");
    let cached = LookupOptions::with_context(android.clone());
    check!(
        "Boolean from cache",
        manager.get_boolean_flag("lab-bool", false, cached.clone()).await
    );
    check!(
        "String from cache",
        manager.get_string_flag("lab-string", "", cached.clone()).await == "Hello Lab"
    );
    check!(
        "Number from cache",
        manager.get_number_flag("lab-number", 0.0, cached).await == 42.0
    );
    check!(
        "Boolean for another context",
        !manager
            .get_boolean_flag("lab-bool", true, LookupOptions::with_context(ios))
            .await
    );
    check!(
        "Missing flag returns default",
        manager
            .get_feature_flag(
                "lab-missing",
                Some(FlagValue::from("fallback")),
                LookupOptions::default()
            )
            .await
            .ok()
            == Some(FlagValue::from("fallback"))
    );

    println!("\nTesting default context...");
    manager.add_default_context_value("country", "VN");
    check!(
        "Default context updated",
        manager.default_context().get("country") == Some(&serde_json::json!("VN"))
    );
    manager.remove_default_context_value("country");

    println!("\nTesting shutdown...");
    manager.stop_polling();
    check!("Polling stopped", !manager.is_polling());
    check!("Cache cleared", manager.cache_flags().is_empty());

    print_summary(passed, failed);
    if failed > 0 {
        std::process::exit(1);
    }
}

fn print_summary(passed: i32, failed: i32) {
    println!("\n{}", "=".repeat(40));
    println!("Results: {} passed, {} failed", passed, failed);
    println!("{}", "=".repeat(40));
}
