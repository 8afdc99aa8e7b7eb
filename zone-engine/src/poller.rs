//! Driver position polling
//!
//! Positions refresh on a fixed interval, independent of zone editing. The
//! engine only reads the latest board to recenter the camera on a driver.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use fleet_client::{ClientResult, ZoneBackend};
use parking_lot::RwLock;
use shared::DriverPosition;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Latest known position per driver
#[derive(Debug, Clone, Default)]
pub struct PositionBoard {
    inner: Arc<RwLock<HashMap<String, DriverPosition>>>,
}

impl PositionBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole board with a fresh poll result
    pub fn replace_all(&self, positions: Vec<DriverPosition>) {
        let map = positions
            .into_iter()
            .map(|p| (p.driver_id.clone(), p))
            .collect();
        *self.inner.write() = map;
    }

    pub fn get(&self, driver_id: &str) -> Option<DriverPosition> {
        self.inner.read().get(driver_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

pub struct PositionPoller {
    backend: Arc<dyn ZoneBackend>,
    board: PositionBoard,
    interval: Duration,
}

impl PositionPoller {
    pub fn new(backend: Arc<dyn ZoneBackend>, board: PositionBoard, interval: Duration) -> Self {
        Self {
            backend,
            board,
            interval,
        }
    }

    /// Fetch once and publish to the board. Returns the number of positions.
    pub async fn poll_once(&self) -> ClientResult<usize> {
        let positions = self.backend.list_driver_positions().await?;
        let count = positions.len();
        self.board.replace_all(positions);
        Ok(count)
    }

    /// Poll until `shutdown` is cancelled. A failed poll keeps the previous board.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::debug!(interval_ms = self.interval.as_millis() as u64, "Position poller started");

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::debug!("Position poller stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        match self.poll_once().await {
                            Ok(count) => tracing::trace!(count, "Driver positions refreshed"),
                            Err(e) => tracing::warn!(error = %e, "Failed to refresh driver positions"),
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_client::{BackendOp, InMemoryZoneBackend};

    fn position(driver_id: &str, lat: f64) -> DriverPosition {
        DriverPosition {
            driver_id: driver_id.into(),
            vehicle_id: None,
            lat,
            lng: -4.0,
            heading: 0.0,
            speed: 0.0,
        }
    }

    #[tokio::test]
    async fn test_poll_once_fills_board() {
        let backend = Arc::new(
            InMemoryZoneBackend::new("C1").with_positions([position("d1", 5.3), position("d2", 5.4)]),
        );
        let board = PositionBoard::new();
        let poller = PositionPoller::new(backend, board.clone(), Duration::from_secs(3));

        assert_eq!(poller.poll_once().await.unwrap(), 2);
        assert_eq!(board.get("d2").map(|p| p.lat), Some(5.4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_poller_ticks_until_cancelled() {
        let backend = Arc::new(InMemoryZoneBackend::new("C1").with_positions([position("d1", 5.3)]));
        let board = PositionBoard::new();
        let shutdown = CancellationToken::new();
        let handle = PositionPoller::new(backend.clone(), board.clone(), Duration::from_millis(3000))
            .spawn(shutdown.clone());

        // First tick is immediate, then one every 3 s
        tokio::time::sleep(Duration::from_millis(6500)).await;
        assert_eq!(backend.call_count(BackendOp::ListDriverPositions), 3);
        assert_eq!(board.len(), 1);

        // A failed poll keeps the last board
        backend.set_failing(BackendOp::ListDriverPositions, true);
        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(board.get("d1").map(|p| p.lat), Some(5.3));

        shutdown.cancel();
        handle.await.unwrap();
        let calls = backend.call_count(BackendOp::ListDriverPositions);
        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(backend.call_count(BackendOp::ListDriverPositions), calls);
    }
}
