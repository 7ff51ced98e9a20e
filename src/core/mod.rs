mod cache;
mod config;
mod default_context;
mod listeners;
mod manager;
mod polling_manager;

pub use cache::FlagCache;
pub use config::{
    NumeratorOptions, NumeratorOptionsBuilder, DEFAULT_BASE_URL, DEFAULT_POLLING_INTERVAL,
    DEFAULT_STARTUP_DELAY, DEFAULT_TIMEOUT,
};
pub use default_context::DefaultContextStore;
pub use listeners::{
    FlagUpdatedCallback, FlagUpdatedErrorCallback, ListenerHandle, ListenerRegistry,
};
pub use manager::{FlagsManager, LookupOptions};
pub use polling_manager::{PollCallback, PollingConfig, PollingManager};
