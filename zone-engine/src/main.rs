use std::sync::Arc;

use anyhow::Context;
use fleet_client::RestZoneBackend;
use tokio_util::sync::CancellationToken;
use zone_engine::logger::init_logger;
use zone_engine::store::{GLOBAL_SECTOR, UNCLASSIFIED_SECTOR};
use zone_engine::{
    EngineConfig, InMemoryViewStateStore, JsonFileViewStateStore, ViewState, ViewStateStore,
    ZoneEngine,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 环境变量 + 日志
    dotenv::dotenv().ok();
    let config = EngineConfig::from_env();
    init_logger(&config.log_level, config.log_json, config.log_dir.as_deref())?;

    tracing::info!(api = %config.api_url, environment = %config.environment, "Zone console starting");

    // 2. 后端 + 引擎
    let backend = RestZoneBackend::from_config(&config.client_config())
        .context("failed to build HTTP client")?;
    let engine = ZoneEngine::new(Arc::new(backend), &config);
    if let Err(e) = engine.load().await {
        if e.code().category().needs_login() {
            tracing::error!("Fleet API rejected the token, check FLEET_API_TOKEN");
        }
        return Err(e).context("failed to load zones");
    }

    // 3. 视图状态
    let view_store: Box<dyn ViewStateStore> = match &config.view_state_path {
        Some(path) => Box::new(JsonFileViewStateStore::open(path)?),
        None => Box::new(InMemoryViewStateStore::default()),
    };
    let mut view = ViewState::load(view_store.as_ref())?;
    engine.restore_view(&mut view).await?;

    print_summary(&engine, &view);

    // 4. 位置轮询，直到 Ctrl+C
    let shutdown = CancellationToken::new();
    let poller = engine.start_position_polling(shutdown.clone());

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    shutdown.cancel();
    if let Err(e) = poller.await {
        tracing::error!(error = %e, "Position poller panicked");
    }
    if let Err(e) = engine.shutdown().await {
        tracing::warn!(error = %e, "Pending edits were not committed");
    }

    engine.capture_view(&mut view);
    view.save(view_store.as_ref())?;
    Ok(())
}

fn print_summary(engine: &ZoneEngine, view: &ViewState) {
    let groups = engine.grouped_by_sector();

    println!("Company zones");
    for (sector, zones) in &groups.company {
        let collapsed = view.collapsed_sectors.contains(sector);
        println!("  {} ({}){}", sector, zones.len(), if collapsed { " [collapsed]" } else { "" });
        if collapsed {
            continue;
        }
        for zone in zones {
            let marker = if zone.is_active { ' ' } else { '-' };
            println!(
                "   {} {:<24} {:<9} drivers={}",
                marker,
                zone.name,
                zone.shape_type().as_str(),
                zone.assigned_driver_ids.len()
            );
        }
    }
    if groups.company.is_empty() {
        println!("  (none, zones without a sector are listed under {})", UNCLASSIFIED_SECTOR);
    }

    println!("Templates");
    for (sector, zones) in &groups.templates {
        println!("  {} ({})", sector, zones.len());
        for zone in zones {
            let installed = if engine.is_installed(&zone.id) { "installed" } else { "" };
            println!("     {:<24} {}", zone.name, installed);
        }
    }
    if groups.templates.is_empty() {
        println!("  (none, unlabelled templates are listed under {})", GLOBAL_SECTOR);
    }

    let selection = engine.selection();
    if let Some(zone_id) = selection.zone {
        println!("Selected zone: {}", zone_id);
    }
    if let Some(target) = engine.focus_target() {
        println!(
            "Camera: {:.5}, {:.5} @ zoom {}",
            target.center.lat, target.center.lng, target.zoom
        );
    }
}
