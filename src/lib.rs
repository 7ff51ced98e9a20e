//! Numerator Rust SDK
//!
//! Client-side feature flags for the Numerator service: a background poller
//! keeps the flag collection for a default context cached, and typed lookups
//! answer from that cache or fall back to a per-key evaluation on the
//! service and then to the caller's default.
//!
//! # Quick Start
//!
//! ```no_run
//! use numerator::{EvaluationContext, FlagsManager, LookupOptions, NumeratorOptions};
//!
//! #[tokio::main]
//! async fn main() -> numerator::Result<()> {
//!     let options = NumeratorOptions::builder("sdk_your_api_key")
//!         .default_context(EvaluationContext::new().attribute("platform", "android"))
//!         .build();
//!     let manager = FlagsManager::new(options)?;
//!
//!     manager.handle_flag_updated(|flags| {
//!         println!("{} flags cached", flags.len());
//!     });
//!
//!     // Served from the cache once the first poll lands.
//!     let context = EvaluationContext::new().attribute("platform", "android");
//!     let dark_mode = manager
//!         .get_boolean_flag("dark-mode", false, LookupOptions::with_context(context))
//!         .await;
//!
//!     // No explicit context: always evaluated on the service.
//!     let theme = manager
//!         .get_string_flag("theme", "light", LookupOptions::default())
//!         .await;
//!
//!     println!("dark_mode={} theme={}", dark_mode, theme);
//!     manager.stop_polling();
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod core;
pub mod error;
pub mod http;
pub mod mock;
pub mod types;
pub mod utils;
mod client;

pub use context::EvaluationContext;

pub use error::{ErrorCode, ErrorResponse, NumeratorError, Result};

pub use crate::core::{
    DefaultContextStore, FlagCache, FlagUpdatedCallback, FlagUpdatedErrorCallback,
    FlagsManager, ListenerHandle, LookupOptions, NumeratorOptions, NumeratorOptionsBuilder,
    PollingConfig, PollingManager,
};

pub use http::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};

pub use client::{
    NumeratorClient, END_POINT_BASE, END_POINT_CONFIG_BY_KEY, END_POINT_CONFIG_LISTING,
    END_POINT_POLLING, END_POINT_VALUE_BY_KEY, LISTING_PAGE_SIZE,
};

pub use mock::{MockFlag, MockFlagStore, MockTransport};

pub use types::{
    EvaluationReason, FlagCollection, FlagCollectionEntry, FlagConfig, FlagEvaluationDetail,
    FlagStatus, FlagValue, FlagValueType, FlagVariationValue, VariationValue,
};

pub use utils::{flag_equals_value, flag_is_off, flag_is_on, with_timeout};
