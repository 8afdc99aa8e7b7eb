// zone-engine/tests/common/mod.rs
// 集成测试公共工具

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use fleet_client::InMemoryZoneBackend;
use shared::{Bounds, Driver, Geometry, LatLng, OwnerType, Zone};
use zone_engine::{EngineConfig, ZoneEngine};

pub const PLATEAU: LatLng = LatLng::new(5.34, -4.02);

pub fn create_test_circle(id: &str) -> Zone {
    Zone::new(id, id, Geometry::circle(PLATEAU, 2.0))
}

pub fn create_test_rectangle(id: &str) -> Zone {
    Zone::new(
        id,
        id,
        Geometry::rectangle(Bounds::new(5.36, 5.32, -4.00, -4.04)),
    )
}

pub fn create_test_template(id: &str, sector: &str) -> Zone {
    create_test_circle(id)
        .with_owner(OwnerType::Sublymus, None)
        .with_sector(sector)
}

pub fn create_test_backend(zones: Vec<Zone>) -> Arc<InMemoryZoneBackend> {
    Arc::new(
        InMemoryZoneBackend::new("C1")
            .with_zones(zones)
            .with_drivers([Driver::new("d1"), Driver::new("d2")]),
    )
}

/// Engine over `backend`, already loaded
pub async fn create_test_engine(
    backend: &Arc<InMemoryZoneBackend>,
    config: EngineConfig,
) -> Arc<ZoneEngine> {
    let engine = ZoneEngine::new(backend.clone(), &config);
    engine.load().await.unwrap();
    backend.clear_calls();
    engine
}

pub fn ids(zones: &[Zone]) -> Vec<String> {
    zones.iter().map(|z| z.id.clone()).collect()
}

/// Let virtual time pass (tests run with a paused clock)
pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
