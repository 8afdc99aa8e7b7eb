//! Debounced commit timer
//!
//! One cancellable delayed task per key. Re-arming a key cancels the
//! previous task, so only the last call within the quiet period fires.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
struct Armed {
    generation: u64,
    token: CancellationToken,
}

#[derive(Debug, Default)]
struct Timers {
    armed: HashMap<String, Armed>,
    generation: u64,
}

/// 提交调度器 - keyed debounce timers
#[derive(Debug, Clone)]
pub struct CommitScheduler {
    delay: Duration,
    timers: Arc<Mutex<Timers>>,
}

impl CommitScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            timers: Arc::new(Mutex::new(Timers::default())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)arm the timer for `key`; `action` runs once the delay elapses
    /// without another `schedule` or `cancel` for the same key.
    pub fn schedule<F, Fut>(&self, key: &str, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let generation = {
            let mut timers = self.timers.lock();
            timers.generation += 1;
            let generation = timers.generation;
            let previous = timers.armed.insert(
                key.to_string(),
                Armed {
                    generation,
                    token: token.clone(),
                },
            );
            if let Some(previous) = previous {
                previous.token.cancel();
            }
            generation
        };

        let timers = self.timers.clone();
        let delay = self.delay;
        let key = key.to_string();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::trace!(key = %key, "Commit timer re-armed or cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    let fire = {
                        let mut timers = timers.lock();
                        let current = timers
                            .armed
                            .get(&key)
                            .is_some_and(|a| a.generation == generation);
                        if current {
                            timers.armed.remove(&key);
                        }
                        current
                    };
                    if fire {
                        action().await;
                    }
                }
            }
        });
    }

    /// Disarm the timer for `key`. Returns true if one was pending.
    pub fn cancel(&self, key: &str) -> bool {
        match self.timers.lock().armed.remove(key) {
            Some(armed) => {
                armed.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        for (_, armed) in self.timers.lock().armed.drain() {
            armed.token.cancel();
        }
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.timers.lock().armed.contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.timers.lock().armed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> std::future::Ready<()> + Clone) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let bump = move || {
            c.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        };
        (count, bump)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_quiet_period() {
        let scheduler = CommitScheduler::new(Duration::from_millis(1000));
        let (count, bump) = counter();

        scheduler.schedule("A", bump);
        assert!(scheduler.is_pending("A"));

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_pending("A"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_fires_once() {
        let scheduler = CommitScheduler::new(Duration::from_millis(1000));
        let (count, bump) = counter();

        for _ in 0..5 {
            scheduler.schedule("A", bump.clone());
            tokio::time::sleep(Duration::from_millis(400)).await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_independent() {
        let scheduler = CommitScheduler::new(Duration::from_millis(100));
        let (count, bump) = counter();

        scheduler.schedule("A", bump.clone());
        scheduler.schedule("B", bump);
        assert_eq!(scheduler.pending_count(), 2);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let scheduler = CommitScheduler::new(Duration::from_millis(100));
        let (count, bump) = counter();

        scheduler.schedule("A", bump.clone());
        assert!(scheduler.cancel("A"));
        assert!(!scheduler.cancel("A"));

        scheduler.schedule("B", bump);
        scheduler.cancel_all();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
