// zone-engine/tests/drawing.rs
// 绘制、创建与删除

mod common;

use std::time::Duration;

use common::*;
use fleet_client::{BackendCall, BackendOp};
use shared::{Bounds, Geometry, LatLng, ShapeType, ZonePatch};
use zone_engine::{DrawingTool, EditState, EngineConfig, EngineError};

#[tokio::test(start_paused = true)]
async fn test_drawn_circle_is_replaced_by_server_zone() {
    let backend = create_test_backend(vec![]);
    let engine = create_test_engine(&backend, EngineConfig::default()).await;
    backend.push_next_id("Z99");
    backend.set_latency(Some(Duration::from_millis(200)));

    let mut rx = engine.subscribe();
    engine.begin_drawing(ShapeType::Circle).await.unwrap();
    assert_eq!(engine.edit_state(), EditState::ToolSelected(DrawingTool::Circle));

    let task = {
        let engine = engine.clone();
        tokio::spawn(async move {
            engine
                .complete_drawing(Geometry::circle(LatLng::new(5.34, -4.02), 2.0))
                .await
        })
    };

    // Optimistic row shows up before the server answers
    rx.changed().await.unwrap();
    let staged = rx.borrow_and_update().clone();
    assert_eq!(staged.len(), 1);
    assert!(staged[0].id.starts_with("custom-circle-"));
    assert_eq!(staged[0].name, "Zone 1");
    assert_eq!(staged[0].color, "#10b981");

    let created = task.await.unwrap().unwrap();
    assert_eq!(created.id, "Z99");
    assert_eq!(ids(&engine.zones()), vec!["Z99"]);

    // The new zone is selected for editing
    assert_eq!(engine.selection().zone.as_deref(), Some("Z99"));
    assert_eq!(engine.edit_state(), EditState::Editing("Z99".into()));

    match &backend.calls_of(BackendOp::CreateZone)[0] {
        BackendCall::CreateZone(payload) => {
            assert_eq!(payload.name, "Zone 1");
            assert_eq!(payload.geometry, Geometry::circle(LatLng::new(5.34, -4.02), 2.0));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_created_zone_not_selected_when_disabled() {
    let backend = create_test_backend(vec![]);
    let config = EngineConfig::default().with_select_created_zone(false);
    let engine = create_test_engine(&backend, config).await;

    engine.begin_drawing(DrawingTool::Rectangle).await.unwrap();
    let zone = engine
        .complete_drawing(Geometry::rectangle(Bounds::new(5.4, 5.3, -3.9, -4.1)))
        .await
        .unwrap();
    assert_eq!(zone.color, "#8b5cf6");
    assert_eq!(engine.selection().zone, None);
    assert_eq!(engine.edit_state(), EditState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_failed_create_keeps_local_only_row() {
    let backend = create_test_backend(vec![]);
    let engine = create_test_engine(&backend, EngineConfig::default()).await;
    backend.fail_next(BackendOp::CreateZone, 1);

    engine.begin_drawing(DrawingTool::Polygon).await.unwrap();
    let zone = engine
        .complete_drawing(Geometry::polygon(vec![
            LatLng::new(5.30, -4.05),
            LatLng::new(5.30, -4.00),
            LatLng::new(5.35, -4.00),
        ]))
        .await
        .unwrap();

    assert!(zone.id.starts_with("custom-poly-"));
    assert_eq!(ids(&engine.zones()), vec![zone.id.clone()]);
    assert_eq!(engine.unsynced_zone_ids(), vec![zone.id.clone()]);
    assert_eq!(engine.edit_state(), EditState::Idle);
    // Not retried
    advance(10_000).await;
    assert_eq!(backend.call_count(BackendOp::CreateZone), 1);

    // The next drawn zone counts the local-only row
    engine.begin_drawing(DrawingTool::Circle).await.unwrap();
    let second = engine
        .complete_drawing(Geometry::circle(PLATEAU, 1.0))
        .await
        .unwrap();
    assert_eq!(second.name, "Zone 2");

    // Deleting a local-only row never reaches the server
    engine.delete(&zone.id).await.unwrap();
    assert_eq!(backend.call_count(BackendOp::DeleteZone), 0);
    assert!(engine.unsynced_zone_ids().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_complete_without_tool() {
    let backend = create_test_backend(vec![]);
    let engine = create_test_engine(&backend, EngineConfig::default()).await;
    let err = engine
        .complete_drawing(Geometry::circle(PLATEAU, 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
    assert!(engine.zones().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_hexagon_two_clicks() {
    let backend = create_test_backend(vec![]);
    let engine = create_test_engine(&backend, EngineConfig::default()).await;

    assert!(engine.hexagon_click(PLATEAU).await.is_err());

    engine.begin_drawing(DrawingTool::Hexagon).await.unwrap();
    assert!(engine.hexagon_click(PLATEAU).await.unwrap().is_none());
    assert!(matches!(engine.edit_state(), EditState::Drawing { anchor: Some(_), .. }));

    // Same point again: no radius
    assert!(engine.hexagon_click(PLATEAU).await.is_err());

    let zone = engine
        .hexagon_click(LatLng::new(5.35, -4.02))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(zone.shape_type(), ShapeType::Polygon);
    match &zone.geometry {
        Geometry::Polygon { paths } => assert_eq!(paths.len(), 6),
        other => panic!("unexpected {other:?}"),
    }
    let created = backend.zone(&zone.id).unwrap();
    assert_eq!(created.name, "Hexagone 1");
    assert_eq!(created.color, "#f59e0b");
}

#[tokio::test(start_paused = true)]
async fn test_begin_drawing_flushes_and_clears_selection() {
    let backend = create_test_backend(vec![create_test_circle("A")]);
    let engine = create_test_engine(&backend, EngineConfig::default()).await;
    engine.select(Some("A")).await.unwrap();
    engine.edit(ZonePatch::name("renamed")).unwrap();

    engine.begin_drawing(DrawingTool::Circle).await.unwrap();
    assert_eq!(backend.call_count(BackendOp::UpdateZone), 1);
    assert_eq!(engine.selection().zone, None);

    engine.cancel_editing();
    assert_eq!(engine.edit_state(), EditState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_delete_is_fail_open() {
    let backend = create_test_backend(vec![create_test_circle("A"), create_test_circle("B")]);
    let engine = create_test_engine(&backend, EngineConfig::default()).await;
    engine.select(Some("A")).await.unwrap();
    engine.edit(ZonePatch::name("pending")).unwrap();

    backend.set_failing(BackendOp::DeleteZone, true);
    engine.delete("A").await.unwrap();

    assert_eq!(ids(&engine.zones()), vec!["B"]);
    assert_eq!(engine.selection().zone, None);
    assert_eq!(engine.edit_state(), EditState::Idle);
    assert_eq!(backend.call_count(BackendOp::DeleteZone), 1);

    // The pending edit died with the zone
    advance(2000).await;
    assert_eq!(backend.call_count(BackendOp::UpdateZone), 0);

    assert!(matches!(
        engine.delete("A").await,
        Err(EngineError::ZoneNotFound(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_delete_while_create_in_flight() {
    let backend = create_test_backend(vec![]);
    let engine = create_test_engine(&backend, EngineConfig::default()).await;
    backend.set_latency(Some(Duration::from_millis(300)));

    engine.begin_drawing(DrawingTool::Circle).await.unwrap();
    let mut rx = engine.subscribe();
    let task = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.complete_drawing(Geometry::circle(PLATEAU, 1.0)).await })
    };
    rx.changed().await.unwrap();
    let temp_id = rx.borrow_and_update()[0].id.clone();

    engine.delete(&temp_id).await.unwrap();
    task.await.unwrap().unwrap();

    // The acknowledged zone does not resurrect the deleted row
    assert!(engine.zones().is_empty());
}
