//! Background Expiry Sweeper
//!
//! The engines never schedule anything on their own: expired entries are
//! reclaimed lazily on `get`, or eagerly when someone calls
//! `flush_expired`. This module is that "someone" for applications that
//! want eager reclamation without writing the loop themselves.
//!
//! ## Why Do We Need This?
//!
//! Lazy expiry is cheap but an entry that is never read again stays in the
//! backend forever. A periodic sweep bounds how long dead entries linger.
//!
//! ## Design
//!
//! The sweeper is a Tokio task owned by the application:
//! 1. Sleeps for the current interval (default: 1s)
//! 2. Runs one `flush_expired` pass over the engine's namespace
//! 3. Adapts the interval to the fraction of scanned entries that expired
//! 4. Logs failures and keeps going; backend errors never stop the loop
//!
//! Dropping the [`ExpirySweeper`] handle stops the task.

use super::{AsyncExpiringKv, SweepReport};
use crate::storage::AsyncBackend;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

/// Configuration for the expiry sweeper.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Base interval between sweeps (default: 1s)
    pub base_interval: Duration,

    /// Minimum interval between sweeps (default: 100ms)
    pub min_interval: Duration,

    /// Maximum interval between sweeps (default: 60s)
    pub max_interval: Duration,

    /// Dead fraction above which the interval is halved
    pub speedup_threshold: f64,

    /// Dead fraction below which a clean sweep doubles the interval
    pub slowdown_threshold: f64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_secs(1),
            min_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(60),
            speedup_threshold: 0.25,
            slowdown_threshold: 0.01,
        }
    }
}

/// A handle to the running expiry sweeper.
///
/// When this handle is dropped, the sweeper task will be stopped.
#[derive(Debug)]
pub struct ExpirySweeper {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,
}

impl ExpirySweeper {
    /// Starts sweeping `engine` as a background task.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use kvexpiry::expiry::{AsyncExpiringKv, ExpirySweeper, SweeperConfig};
    /// use kvexpiry::storage::AsyncJsonFileStore;
    /// use std::sync::Arc;
    ///
    /// let store = AsyncJsonFileStore::open("cache.json").await?;
    /// let kv = Arc::new(AsyncExpiringKv::new(store, "cache:"));
    /// let sweeper = ExpirySweeper::start(Arc::clone(&kv), SweeperConfig::default());
    ///
    /// // Sweeper runs in the background...
    ///
    /// // Dropping the sweeper will stop it
    /// drop(sweeper);
    /// ```
    pub fn start<B>(engine: Arc<AsyncExpiringKv<B>>, config: SweeperConfig) -> Self
    where
        B: AsyncBackend + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(
            scope = engine.namespace().scope(),
            interval_ms = config.base_interval.as_millis(),
            "Background expiry sweeper started"
        );

        tokio::spawn(sweeper_loop(engine, config, shutdown_rx));

        Self { shutdown_tx }
    }

    /// Stops the expiry sweeper.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        if self.shutdown_tx.send(true).is_ok() {
            info!("Background expiry sweeper stopped");
        }
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The main sweeper loop.
async fn sweeper_loop<B: AsyncBackend>(
    engine: Arc<AsyncExpiringKv<B>>,
    config: SweeperConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut current_interval = config.base_interval;

    loop {
        // Wait for the interval or shutdown signal
        tokio::select! {
            biased;
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry sweeper received shutdown signal");
                    return;
                }
            }
            _ = tokio::time::sleep(current_interval) => {}
        }

        let report = match engine.flush_expired().await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "Expiry sweep failed");
                continue;
            }
        };

        current_interval = next_interval(&config, current_interval, report);
    }
}

/// Halves the interval while a sweep finds many dead entries and doubles it
/// while sweeps come back clean, within `min_interval..=max_interval`.
fn next_interval(config: &SweeperConfig, current: Duration, report: SweepReport) -> Duration {
    if report.scanned == 0 {
        return current;
    }
    let dead_fraction = report.expired as f64 / report.scanned as f64;

    if dead_fraction > config.speedup_threshold {
        let next = (current / 2).max(config.min_interval);
        debug!(
            expired = report.expired,
            scanned = report.scanned,
            interval_ms = next.as_millis(),
            "Sweep found many dead entries, shortening interval"
        );
        next
    } else if report.expired == 0 && dead_fraction < config.slowdown_threshold {
        let next = (current * 2).min(config.max_interval);
        trace!(interval_ms = next.as_millis(), "Clean sweep, lengthening interval");
        next
    } else {
        current
    }
}

/// Starts the expiry sweeper with default configuration.
pub fn start_expiry_sweeper<B>(engine: Arc<AsyncExpiringKv<B>>) -> ExpirySweeper
where
    B: AsyncBackend + 'static,
{
    ExpirySweeper::start(engine, SweeperConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expiry::{ManualClock, Span};
    use crate::storage::{AsyncJsonFileStore, Backend, Blocking, MemoryStore};
    use serde_json::json;

    type MemoryKv = AsyncExpiringKv<Blocking<MemoryStore>>;

    fn fast_config() -> SweeperConfig {
        SweeperConfig {
            base_interval: Duration::from_millis(10),
            min_interval: Duration::from_millis(5),
            max_interval: Duration::from_millis(50),
            ..Default::default()
        }
    }

    fn memory_engine() -> (Arc<MemoryKv>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let kv = Arc::new(
            AsyncExpiringKv::new(Blocking(MemoryStore::new()), "p_").with_clock(clock.clone()),
        );
        (kv, clock)
    }

    async fn add_dead_entries(kv: &MemoryKv, clock: &ManualClock, count: usize) {
        for i in 0..count {
            kv.set_with_ttl(&format!("dead{}", i), json!(i), Span::new().millis(10))
                .await
                .unwrap();
        }
        clock.advance(Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_cleans_expired_keys() {
        let (kv, clock) = memory_engine();

        for i in 0..10 {
            kv.set_with_ttl(&format!("key{}", i), json!("value"), Span::new().millis(50))
                .await
                .unwrap();
        }
        kv.set("persistent", json!("value")).await.unwrap();
        assert_eq!(kv.backend().inner().len(), 21);

        let _sweeper = ExpirySweeper::start(Arc::clone(&kv), fast_config());

        clock.advance(Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(11)).await;

        // Only the persistent key should remain
        assert_eq!(
            kv.backend().inner().keys().unwrap(),
            vec!["p_persistent".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_waits_for_interval() {
        let (kv, clock) = memory_engine();
        add_dead_entries(&kv, &clock, 5).await;

        let _sweeper = start_expiry_sweeper(Arc::clone(&kv));

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert_eq!(kv.backend().inner().len(), 10);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(kv.backend().inner().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_speeds_up_after_dirty_sweep() {
        let (kv, clock) = memory_engine();
        add_dead_entries(&kv, &clock, 4).await;

        let _sweeper = start_expiry_sweeper(Arc::clone(&kv));

        // First sweep at 1s removes everything, halving the interval
        tokio::time::sleep(Duration::from_millis(1_001)).await;
        assert!(kv.backend().inner().is_empty());

        add_dead_entries(&kv, &clock, 4).await;
        tokio::time::sleep(Duration::from_millis(498)).await;
        assert_eq!(kv.backend().inner().len(), 8);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(kv.backend().inner().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_stops_on_drop() {
        let (kv, clock) = memory_engine();

        {
            let _sweeper = ExpirySweeper::start(Arc::clone(&kv), fast_config());
            tokio::time::sleep(Duration::from_millis(50)).await;
            // Sweeper is dropped here
        }

        kv.set_with_ttl("key", json!("value"), Span::new().millis(10))
            .await
            .unwrap();
        clock.advance(Duration::from_millis(10));

        // Nothing sweeps any more, the entry lingers until read
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(kv.backend().inner().len(), 2);

        // but get() still reclaims it lazily
        assert!(kv.get("key").await.unwrap().is_none());
        assert!(kv.backend().inner().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_over_async_backend() {
        let dir = tempfile::tempdir().unwrap();
        let store = AsyncJsonFileStore::open(dir.path().join("store.json"))
            .await
            .unwrap();
        let clock = Arc::new(ManualClock::new(1_000));
        let kv = Arc::new(AsyncExpiringKv::new(store, "p_").with_clock(clock.clone()));

        for i in 0..100 {
            kv.set_with_ttl(&format!("key{}", i), json!(i), Span::new().seconds(1))
                .await
                .unwrap();
        }

        let _sweeper = start_expiry_sweeper(Arc::clone(&kv));
        clock.advance(Duration::from_secs(1));

        // Default base interval is one second
        tokio::time::sleep(Duration::from_millis(1_001)).await;
        assert!(kv.backend().is_empty().await);
    }

    #[test]
    fn test_next_interval_bounds() {
        let config = SweeperConfig::default();
        let report = |scanned, expired| SweepReport { scanned, expired };

        assert_eq!(
            next_interval(&config, Duration::from_secs(1), report(10, 5)),
            Duration::from_millis(500)
        );
        assert_eq!(
            next_interval(&config, Duration::from_millis(150), report(10, 10)),
            config.min_interval
        );
        assert_eq!(
            next_interval(&config, Duration::from_secs(1), report(10, 0)),
            Duration::from_secs(2)
        );
        assert_eq!(
            next_interval(&config, Duration::from_secs(40), report(10, 0)),
            config.max_interval
        );
        // Between the thresholds, or nothing scanned: unchanged
        assert_eq!(
            next_interval(&config, Duration::from_secs(1), report(10, 1)),
            Duration::from_secs(1)
        );
        assert_eq!(
            next_interval(&config, Duration::from_secs(1), report(0, 0)),
            Duration::from_secs(1)
        );
    }
}
