//! Timer that drives background polls.
//!
//! One poll fires shortly after start, then one per interval. Each poll is
//! spawned as its own task and never awaited by the timer, so a slow poll
//! does not delay the next tick and stopping the timer leaves polls that
//! are already in flight alone.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::config::{NumeratorOptions, DEFAULT_POLLING_INTERVAL, DEFAULT_STARTUP_DELAY};
use crate::error::{ErrorCode, NumeratorError, Result};

#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Time between polls. Default: 30 seconds
    pub interval: Duration,

    /// Delay before the first poll. Default: 10ms
    pub startup_delay: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLLING_INTERVAL,
            startup_delay: DEFAULT_STARTUP_DELAY,
        }
    }
}

impl PollingConfig {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }
}

impl From<&NumeratorOptions> for PollingConfig {
    fn from(options: &NumeratorOptions) -> Self {
        Self {
            interval: options.polling_interval,
            startup_delay: options.startup_delay,
        }
    }
}

/// Callback type for poll operations.
pub type PollCallback = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct PollingManager {
    config: PollingConfig,
    is_running: Arc<AtomicBool>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl PollingManager {
    pub fn new(config: PollingConfig) -> Self {
        Self {
            config,
            is_running: Arc::new(AtomicBool::new(false)),
            shutdown_tx: None,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(PollingConfig::default())
    }

    pub fn config(&self) -> &PollingConfig {
        &self.config
    }

    /// Starts the timer, replacing any timer already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self, on_poll: PollCallback) -> Result<()> {
        let handle = tokio::runtime::Handle::try_current().map_err(|e| {
            NumeratorError::with_source(
                ErrorCode::RuntimeUnavailable,
                "Polling requires a Tokio runtime",
                e,
            )
        })?;

        self.stop();

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        // A fresh flag per run so a previous timer winding down cannot clear it.
        let is_running = Arc::new(AtomicBool::new(true));
        self.is_running = Arc::clone(&is_running);

        let config = self.config.clone();
        handle.spawn(async move {
            let first = Instant::now() + config.startup_delay;
            tokio::select! {
                _ = &mut shutdown_rx => {
                    tracing::debug!("Polling stopped before the first poll");
                    return;
                }
                _ = tokio::time::sleep_until(first) => {
                    tokio::spawn(on_poll());
                }
            }

            let mut ticks = interval_at(first + config.interval, config.interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        tracing::debug!("Polling manager shutting down");
                        break;
                    }
                    _ = ticks.tick() => {
                        if !is_running.load(Ordering::SeqCst) {
                            break;
                        }
                        tokio::spawn(on_poll());
                    }
                }
            }
        });

        tracing::debug!(
            "Polling manager started with interval {:?}",
            self.config.interval
        );
        Ok(())
    }

    /// Stops the timer. Polls already spawned run to completion.
    pub fn stop(&mut self) {
        let was_running = self.is_running.swap(false, Ordering::SeqCst);

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if was_running {
            tracing::debug!("Polling manager stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }
}

impl Drop for PollingManager {
    fn drop(&mut self) {
        self.stop();
    }
}
