// zone-engine/tests/selection.rs
// 地图点击选择

mod common;

use common::*;
use fleet_client::BackendOp;
use shared::{Geometry, LatLng, ZonePatch};
use zone_engine::{EditState, EngineConfig, Resolution};

const NOWHERE: LatLng = LatLng::new(6.8, -3.1);

fn far_circle(id: &str) -> shared::Zone {
    shared::Zone::new(id, id, Geometry::circle(LatLng::new(7.5, -5.5), 1.0))
}

#[tokio::test(start_paused = true)]
async fn test_click_cycles_through_overlapping_zones() {
    let backend = create_test_backend(vec![
        create_test_circle("A"),
        create_test_rectangle("B"),
        create_test_circle("C"),
    ]);
    let engine = create_test_engine(&backend, EngineConfig::default()).await;

    let mut picked = Vec::new();
    for _ in 0..4 {
        match engine.handle_map_click(PLATEAU, None).await.unwrap() {
            Resolution::Select(id) => picked.push(id),
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(picked, vec!["A", "B", "C", "A"]);
    assert_eq!(engine.edit_state(), EditState::Editing("A".into()));
}

#[tokio::test(start_paused = true)]
async fn test_click_single_zone_toggles() {
    let backend = create_test_backend(vec![create_test_circle("A"), far_circle("F")]);
    let engine = create_test_engine(&backend, EngineConfig::default()).await;

    assert_eq!(
        engine.handle_map_click(PLATEAU, None).await.unwrap(),
        Resolution::Select("A".into())
    );
    assert_eq!(
        engine.handle_map_click(PLATEAU, None).await.unwrap(),
        Resolution::Deselect
    );
    assert_eq!(engine.selection().zone, None);
    assert_eq!(engine.edit_state(), EditState::Idle);

    // Empty map: nothing happens
    assert_eq!(
        engine.handle_map_click(NOWHERE, None).await.unwrap(),
        Resolution::Unchanged
    );
}

#[tokio::test(start_paused = true)]
async fn test_native_hit_used_when_nothing_contains_click() {
    let backend = create_test_backend(vec![create_test_circle("A"), far_circle("F")]);
    let engine = create_test_engine(&backend, EngineConfig::default()).await;

    assert_eq!(
        engine.handle_map_click(NOWHERE, Some("F")).await.unwrap(),
        Resolution::Select("F".into())
    );
    assert_eq!(
        engine.handle_map_click(NOWHERE, Some("F")).await.unwrap(),
        Resolution::Deselect
    );
}

#[tokio::test(start_paused = true)]
async fn test_hidden_zones_are_not_clickable() {
    let mut inactive = create_test_rectangle("B");
    inactive.is_active = false;
    let backend = create_test_backend(vec![create_test_circle("A"), inactive]);
    let engine = create_test_engine(&backend, EngineConfig::default()).await;

    assert_eq!(ids(&engine.visible_zones()), vec!["A"]);
    assert_eq!(
        engine.handle_map_click(PLATEAU, None).await.unwrap(),
        Resolution::Select("A".into())
    );

    // Zones hidden globally: only the selected one stays on the map
    engine.set_show_zones(false);
    assert_eq!(ids(&engine.visible_zones()), vec!["A"]);
    engine.select(None).await.unwrap();
    assert!(engine.visible_zones().is_empty());
    assert_eq!(
        engine.handle_map_click(PLATEAU, None).await.unwrap(),
        Resolution::Unchanged
    );
}

#[tokio::test(start_paused = true)]
async fn test_selected_inactive_zone_stays_visible() {
    let backend = create_test_backend(vec![create_test_circle("A")]);
    let engine = create_test_engine(&backend, EngineConfig::default()).await;

    engine.select(Some("A")).await.unwrap();
    engine.edit(ZonePatch::active(false)).unwrap();
    assert_eq!(ids(&engine.visible_zones()), vec!["A"]);

    engine.select(None).await.unwrap();
    assert!(engine.visible_zones().is_empty());
    assert_eq!(backend.call_count(BackendOp::UpdateZone), 1);
}

#[tokio::test(start_paused = true)]
async fn test_click_on_template_focuses_without_editing() {
    let backend = create_test_backend(vec![create_test_template("S1", "NORD")]);
    let engine = create_test_engine(&backend, EngineConfig::default()).await;

    assert_eq!(
        engine.handle_map_click(PLATEAU, None).await.unwrap(),
        Resolution::Select("S1".into())
    );
    assert_eq!(engine.selection().zone.as_deref(), Some("S1"));
    assert_eq!(engine.edit_state(), EditState::Idle);
    assert!(engine.focus_target().is_some());
}
