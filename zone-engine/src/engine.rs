//! Zone engine façade
//!
//! Owns the zone store, the edit controller and the focus state behind one
//! `parking_lot::Mutex`. The lock is never held across an `.await`: every
//! operation mutates the store synchronously, releases the lock, awaits the
//! backend, then re-locks to reconcile.
//!
//! Subscribers receive the whole collection through a `watch` channel after
//! every change.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Weak};
use std::time::Duration;

use fleet_client::ZoneBackend;
use parking_lot::Mutex;
use shared::util::now_millis;
use shared::{Driver, Geometry, LatLng, Zone, ZonePatch};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::assignment::AssignmentCoordinator;
use crate::config::EngineConfig;
use crate::geometry::{self, CameraTarget, DRIVER_FOCUS_ZOOM};
use crate::poller::{PositionBoard, PositionPoller};
use crate::resolver::{self, Resolution};
use crate::session::{CommitScheduler, DrawingTool, EditController, EditSession, EditState};
use crate::store::{SectorGroups, ZoneStore};
use crate::templates;
use crate::view_state::ViewState;
use crate::{EngineError, EngineResult};

/// What the console is focused on. Zone and driver focus are exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub zone: Option<String>,
    pub driver: Option<String>,
}

#[derive(Debug)]
struct EngineState {
    store: ZoneStore,
    controller: EditController,
    selection: Selection,
    show_zones: bool,
    /// Drawn zones whose create call failed
    unsynced: BTreeSet<String>,
    drivers: Vec<Driver>,
    /// Update calls still awaiting a response, per zone
    in_flight: HashMap<String, usize>,
}

impl EngineState {
    fn start_update(&mut self, zone_id: &str) {
        *self.in_flight.entry(zone_id.to_string()).or_default() += 1;
    }

    /// Returns true when no newer update for the zone is still outstanding
    fn settle_update(&mut self, zone_id: &str) -> bool {
        let outstanding = self.in_flight.get(zone_id).copied().unwrap_or(0);
        if outstanding > 1 {
            self.in_flight.insert(zone_id.to_string(), outstanding - 1);
            false
        } else {
            self.in_flight.remove(zone_id);
            true
        }
    }

    fn clear_zone_focus(&mut self, zone_id: &str) {
        if self.selection.zone.as_deref() == Some(zone_id) {
            self.selection.zone = None;
        }
        self.controller.forget_zone(zone_id);
    }

    /// Full replacement from a server listing
    fn resync(&mut self, zones: Vec<Zone>) {
        self.store.resync_all(zones);
        let store = &self.store;
        self.unsynced.retain(|id| store.contains(id));
        if let Some(id) = self.selection.zone.clone()
            && !self.store.contains(&id)
        {
            self.clear_zone_focus(&id);
        }
    }
}

pub struct ZoneEngine {
    backend: Arc<dyn ZoneBackend>,
    state: Mutex<EngineState>,
    scheduler: CommitScheduler,
    assignments: AssignmentCoordinator,
    positions: PositionBoard,
    poll_interval: Duration,
    select_created_zone: bool,
    zones_tx: watch::Sender<Vec<Zone>>,
    this: Weak<ZoneEngine>,
}

impl ZoneEngine {
    pub fn new(backend: Arc<dyn ZoneBackend>, config: &EngineConfig) -> Arc<Self> {
        let (zones_tx, _) = watch::channel(Vec::new());
        Arc::new_cyclic(|this| Self {
            backend,
            state: Mutex::new(EngineState {
                store: ZoneStore::new(),
                controller: EditController::new(),
                selection: Selection::default(),
                show_zones: true,
                unsynced: BTreeSet::new(),
                drivers: Vec::new(),
                in_flight: HashMap::new(),
            }),
            scheduler: CommitScheduler::new(config.commit_debounce()),
            assignments: AssignmentCoordinator::new(config.assignment_policy),
            positions: PositionBoard::new(),
            poll_interval: config.position_poll_interval(),
            select_created_zone: config.select_created_zone,
            zones_tx,
            this: this.clone(),
        })
    }

    fn publish(&self, state: &EngineState) {
        self.zones_tx.send_replace(state.store.snapshot());
    }

    // ========== Reads ==========

    /// Reactive view of the zone collection
    pub fn subscribe(&self) -> watch::Receiver<Vec<Zone>> {
        self.zones_tx.subscribe()
    }

    pub fn zones(&self) -> Vec<Zone> {
        self.state.lock().store.snapshot()
    }

    pub fn zone(&self, id: &str) -> Option<Zone> {
        self.state.lock().store.get(id).cloned()
    }

    /// Zones drawn on the map right now
    pub fn visible_zones(&self) -> Vec<Zone> {
        let state = self.state.lock();
        state
            .store
            .visible(state.selection.zone.as_deref(), state.show_zones)
            .cloned()
            .collect()
    }

    pub fn selection(&self) -> Selection {
        self.state.lock().selection.clone()
    }

    pub fn edit_state(&self) -> EditState {
        self.state.lock().controller.state().clone()
    }

    pub fn edit_session(&self) -> Option<EditSession> {
        self.state.lock().controller.session().cloned()
    }

    pub fn drivers(&self) -> Vec<Driver> {
        self.state.lock().drivers.clone()
    }

    pub fn positions(&self) -> PositionBoard {
        self.positions.clone()
    }

    /// Locally drawn zones the server never acknowledged
    pub fn unsynced_zone_ids(&self) -> Vec<String> {
        self.state.lock().unsynced.iter().cloned().collect()
    }

    pub fn grouped_by_sector(&self) -> SectorGroups {
        self.state.lock().store.grouped_by_sector()
    }

    pub fn existing_sectors(&self) -> Vec<String> {
        self.state.lock().store.existing_sectors()
    }

    pub fn is_installed(&self, template_id: &str) -> bool {
        templates::is_installed(template_id, self.state.lock().store.iter())
    }

    pub fn show_zones(&self) -> bool {
        self.state.lock().show_zones
    }

    pub fn set_show_zones(&self, show: bool) {
        self.state.lock().show_zones = show;
    }

    /// Camera target for the current focus: the followed driver's last
    /// position, else the selected zone.
    pub fn focus_target(&self) -> Option<CameraTarget> {
        let state = self.state.lock();
        if let Some(driver_id) = &state.selection.driver {
            return self
                .positions
                .get(driver_id)
                .map(|p| CameraTarget::new(LatLng::new(p.lat, p.lng), DRIVER_FOCUS_ZOOM));
        }
        let zone_id = state.selection.zone.as_deref()?;
        state
            .store
            .get(zone_id)
            .and_then(|z| geometry::focus_for(&z.geometry))
    }

    // ========== Loading ==========

    /// Replace the collection with the server's. Returns the zone count.
    pub async fn load(&self) -> EngineResult<usize> {
        let zones = self.backend.list_zones().await?;
        let drivers = match self.backend.list_drivers().await {
            Ok(drivers) => Some(drivers),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load drivers");
                None
            }
        };

        let mut state = self.state.lock();
        state.resync(zones);
        if let Some(drivers) = drivers {
            state.drivers = drivers;
        }
        self.publish(&state);
        tracing::info!(zones = state.store.len(), drivers = state.drivers.len(), "Zones loaded");
        Ok(state.store.len())
    }

    async fn resync(&self) -> EngineResult<usize> {
        let zones = self.backend.list_zones().await?;
        let mut state = self.state.lock();
        state.resync(zones);
        self.publish(&state);
        Ok(state.store.len())
    }

    // ========== Creation path ==========

    /// Pick a drawing tool. Edits pending on the zone being edited are flushed.
    pub async fn begin_drawing(&self, tool: impl Into<DrawingTool>) -> EngineResult<()> {
        let tool = tool.into();
        let previous = {
            let mut state = self.state.lock();
            state.selection.zone = None;
            state.controller.select_tool(tool)
        };
        tracing::debug!(tool = %tool, "Drawing tool selected");
        self.flush_session(previous).await
    }

    /// A native draw-complete event produced `geometry`
    pub async fn complete_drawing(&self, geometry: Geometry) -> EngineResult<Zone> {
        let temp = {
            let mut state = self.state.lock();
            let tool = state.controller.start_create()?;
            let temp = Self::stage_new_zone(&mut state, tool, geometry);
            self.publish(&state);
            temp
        };
        self.create_zone(temp).await
    }

    /// Hexagon tool click: the first click fixes the center, the second the
    /// radius. Returns the created zone on the second click.
    pub async fn hexagon_click(&self, point: LatLng) -> EngineResult<Option<Zone>> {
        let temp = {
            let mut state = self.state.lock();
            match state.controller.anchor() {
                Some((DrawingTool::Hexagon, center)) => {
                    let radius_km = geometry::haversine_meters(center, point) / 1000.0;
                    if radius_km <= 0.0 {
                        return Err(EngineError::invalid_state(
                            "hexagon radius must be positive",
                        ));
                    }
                    let hexagon = Geometry::polygon(geometry::regular_hexagon(center, radius_km));
                    let tool = state.controller.start_create()?;
                    let temp = Self::stage_new_zone(&mut state, tool, hexagon);
                    self.publish(&state);
                    temp
                }
                _ if state.controller.state() == &EditState::ToolSelected(DrawingTool::Hexagon) => {
                    state.controller.place_anchor(point)?;
                    return Ok(None);
                }
                _ => return Err(EngineError::invalid_state("hexagon tool not selected")),
            }
        };
        self.create_zone(temp).await.map(Some)
    }

    /// Build the optimistic zone for `tool` and insert it
    fn stage_new_zone(state: &mut EngineState, tool: DrawingTool, geometry: Geometry) -> Zone {
        let ordinal = state.store.client_scoped_count() + 1;
        let mut stamp = now_millis();
        while state
            .store
            .contains(&format!("{}-{}", tool.id_prefix(), stamp))
        {
            stamp += 1;
        }
        let zone = tool.build_zone(geometry, ordinal, stamp);
        state.store.upsert(zone.clone());
        zone
    }

    /// Persist a staged zone. On failure the row stays as a local-only zone.
    async fn create_zone(&self, temp: Zone) -> EngineResult<Zone> {
        match self.backend.create_zone(&temp.to_create()).await {
            Ok(mut created) => {
                created.normalize_assignments();
                let previous = {
                    let mut state = self.state.lock();
                    state.controller.finish_drawing();
                    if !state.store.contains(&temp.id) {
                        tracing::warn!(
                            temp_id = %temp.id,
                            zone_id = %created.id,
                            "Zone deleted before its create settled"
                        );
                        return Ok(created);
                    }
                    state.store.replace(&temp.id, created.clone());

                    let mut previous = None;
                    if self.select_created_zone && state.controller.state() == &EditState::Idle {
                        state.selection = Selection {
                            zone: Some(created.id.clone()),
                            driver: None,
                        };
                        previous = state.controller.begin_editing(&created.id);
                    }
                    self.publish(&state);
                    previous
                };
                tracing::info!(temp_id = %temp.id, zone_id = %created.id, "Zone created");
                self.flush_session(previous).await?;
                Ok(created)
            }
            Err(e) => {
                tracing::warn!(zone_id = %temp.id, error = %e, "Zone create failed, keeping local-only row");
                let mut state = self.state.lock();
                state.controller.finish_drawing();
                if state.store.contains(&temp.id) {
                    state.unsynced.insert(temp.id.clone());
                }
                self.publish(&state);
                Ok(temp)
            }
        }
    }

    // ========== Modification path ==========

    /// Select a zone (or clear the selection with `None`).
    ///
    /// Company zones enter editing; templates are only focused. Edits pending
    /// on the previously edited zone are committed right away.
    pub async fn select(&self, zone_id: Option<&str>) -> EngineResult<()> {
        let previous = {
            let mut state = self.state.lock();
            match zone_id {
                None => {
                    state.selection.zone = None;
                    state.controller.end_session()
                }
                Some(id) => {
                    let is_template = state
                        .store
                        .get(id)
                        .map(|z| z.is_template())
                        .ok_or_else(|| EngineError::ZoneNotFound(id.to_string()))?;
                    state.selection = Selection {
                        zone: Some(id.to_string()),
                        driver: None,
                    };
                    if is_template {
                        state.controller.end_session()
                    } else {
                        state.controller.begin_editing(id)
                    }
                }
            }
        };
        self.flush_session(previous).await
    }

    /// Focus a driver (or clear with `None`). Clears the zone selection.
    pub async fn select_driver(&self, driver_id: Option<&str>) -> EngineResult<()> {
        let previous = {
            let mut state = self.state.lock();
            state.selection.driver = driver_id.map(str::to_string);
            if driver_id.is_some() {
                state.selection.zone = None;
                state.controller.end_session()
            } else {
                None
            }
        };
        self.flush_session(previous).await
    }

    /// Drop pending edits, drawing mode and selection without committing
    pub fn cancel_editing(&self) {
        let mut state = self.state.lock();
        if let Some(session) = state.controller.cancel() {
            self.scheduler.cancel(&session.target_zone_id);
            if session.has_pending() {
                tracing::debug!(zone_id = %session.target_zone_id, "Discarded uncommitted edits");
            }
        }
        state.selection.zone = None;
    }

    /// Apply an edit to the zone being edited and (re)arm its commit timer
    pub fn edit(&self, patch: ZonePatch) -> EngineResult<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let zone_id = {
            let mut state = self.state.lock();
            let zone_id = state
                .controller
                .editing_zone()
                .ok_or(EngineError::NotEditing)?
                .to_string();
            if !state.store.patch(&zone_id, &patch) {
                return Err(EngineError::ZoneNotFound(zone_id));
            }
            state.controller.record_edit(patch)?;
            self.publish(&state);
            zone_id
        };
        self.arm_commit(&zone_id);
        Ok(())
    }

    fn arm_commit(&self, zone_id: &str) {
        let engine = self.this.clone();
        let id = zone_id.to_string();
        self.scheduler.schedule(zone_id, move || async move {
            let Some(engine) = engine.upgrade() else {
                return;
            };
            if let Err(e) = engine.commit(&id).await {
                tracing::warn!(zone_id = %id, error = %e, "Debounced commit failed");
            }
        });
    }

    /// Commit pending edits now instead of waiting for the quiet period
    pub async fn flush(&self) -> EngineResult<()> {
        let zone_id = self
            .state
            .lock()
            .controller
            .editing_zone()
            .map(str::to_string);
        match zone_id {
            Some(id) => {
                self.scheduler.cancel(&id);
                self.commit(&id).await
            }
            None => Ok(()),
        }
    }

    async fn commit(&self, zone_id: &str) -> EngineResult<()> {
        let patch = self.state.lock().controller.take_pending(zone_id);
        match patch {
            Some(patch) => self.send_patch(zone_id, patch).await,
            None => Ok(()),
        }
    }

    /// Commit a session handed back by the controller
    async fn flush_session(&self, session: Option<EditSession>) -> EngineResult<()> {
        let Some(session) = session else {
            return Ok(());
        };
        self.scheduler.cancel(&session.target_zone_id);
        match session.into_pending() {
            Some((zone_id, patch)) => self.send_patch(&zone_id, patch).await,
            None => Ok(()),
        }
    }

    async fn send_patch(&self, zone_id: &str, patch: ZonePatch) -> EngineResult<()> {
        tracing::debug!(zone_id = %zone_id, "Committing zone edits");
        self.state.lock().start_update(zone_id);
        match self.backend.update_zone(zone_id, &patch).await {
            Ok(server) => {
                let mut state = self.state.lock();
                if !state.settle_update(zone_id) {
                    // A newer update is in flight; its response carries this patch too
                    tracing::debug!(zone_id = %zone_id, "Stale update response skipped");
                    return Ok(());
                }
                if state.store.contains(zone_id) {
                    state.store.reconcile(server);
                    // Edits made while the update was in flight stay visible
                    if let Some(newer) = state.controller.pending_for(zone_id).cloned() {
                        state.store.patch(zone_id, &newer);
                    }
                }
                state.controller.finish_commit(zone_id);
                self.publish(&state);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(zone_id = %zone_id, error = %e, "Zone update failed, resyncing");
                {
                    let mut state = self.state.lock();
                    let settled = state.settle_update(zone_id);
                    state.controller.discard_pending(zone_id);
                    if settled {
                        state.controller.finish_commit(zone_id);
                    }
                }
                self.scheduler.cancel(zone_id);
                if let Err(resync_err) = self.resync().await {
                    tracing::error!(error = %resync_err, "Resync after failed update also failed");
                }
                Err(e.into())
            }
        }
    }

    /// Delete a zone. It is removed locally whatever the server answers.
    pub async fn delete(&self, zone_id: &str) -> EngineResult<()> {
        let local_only = {
            let mut state = self.state.lock();
            state
                .store
                .remove(zone_id)
                .ok_or_else(|| EngineError::ZoneNotFound(zone_id.to_string()))?;
            state.clear_zone_focus(zone_id);
            let local_only = state.unsynced.remove(zone_id);
            self.publish(&state);
            local_only
        };
        self.scheduler.cancel(zone_id);

        if local_only {
            tracing::debug!(zone_id = %zone_id, "Deleted local-only zone");
            return Ok(());
        }
        match self.backend.delete_zone(zone_id).await {
            Ok(()) => tracing::info!(zone_id = %zone_id, "Zone deleted"),
            Err(e) => tracing::warn!(zone_id = %zone_id, error = %e, "Server delete failed, removed locally"),
        }
        Ok(())
    }

    // ========== Map interaction ==========

    /// Resolve a map click and apply it to the selection
    pub async fn handle_map_click(
        &self,
        point: LatLng,
        native_hit: Option<&str>,
    ) -> EngineResult<Resolution> {
        let resolution = {
            let state = self.state.lock();
            let active = state.selection.zone.as_deref();
            resolver::resolve_click(
                point,
                state.store.visible(active, state.show_zones),
                active,
                native_hit,
            )
        };
        match &resolution {
            Resolution::Select(id) => self.select(Some(id.as_str())).await?,
            Resolution::Deselect => self.select(None).await?,
            Resolution::Unchanged => {}
        }
        Ok(resolution)
    }

    // ========== Assignment ==========

    /// Toggle the driver's active zone. Returns true when the driver was added.
    pub async fn toggle_assignment(&self, zone_id: &str, driver_id: &str) -> EngineResult<bool> {
        let plan = {
            let mut state = self.state.lock();
            let plan = self.assignments.begin(&mut state.store, zone_id, driver_id)?;
            self.publish(&state);
            plan
        };

        match self.assignments.send(self.backend.as_ref(), &plan).await {
            Ok(()) => {
                tracing::info!(
                    zone_id = %zone_id,
                    driver_id = %driver_id,
                    assigned = plan.assign,
                    "Driver assignment updated"
                );
                Ok(plan.assign)
            }
            Err(e) => {
                tracing::warn!(zone_id = %zone_id, driver_id = %driver_id, error = %e, "Assignment rejected, rolling back");
                let mut state = self.state.lock();
                self.assignments.rollback(&mut state.store, plan);
                self.publish(&state);
                Err(e.into())
            }
        }
    }

    // ========== Templates ==========

    /// Install a template and select the new company zone
    pub async fn install(&self, template_id: &str) -> EngineResult<Zone> {
        let zone = templates::install(self.backend.as_ref(), template_id).await?;
        let previous = {
            let mut state = self.state.lock();
            state.store.reconcile(zone.clone());
            state.selection = Selection {
                zone: Some(zone.id.clone()),
                driver: None,
            };
            let previous = state.controller.begin_editing(&zone.id);
            self.publish(&state);
            previous
        };
        if let Err(e) = self.flush_session(previous).await {
            tracing::warn!(error = %e, "Failed to commit edits before install");
        }
        Ok(zone)
    }

    // ========== Background work ==========

    /// Start refreshing driver positions until `shutdown` is cancelled
    pub fn start_position_polling(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        PositionPoller::new(self.backend.clone(), self.positions.clone(), self.poll_interval)
            .spawn(shutdown)
    }

    /// Commit pending edits and disarm every timer
    pub async fn shutdown(&self) -> EngineResult<()> {
        let result = self.flush().await;
        self.scheduler.cancel_all();
        result
    }

    // ========== View state ==========

    /// Record the current focus into `view`
    pub fn capture_view(&self, view: &mut ViewState) {
        let selection = self.selection();
        view.zone_detail = selection.zone;
        view.driver_detail = selection.driver;
        if let Some(target) = self.focus_target() {
            view.map_center = Some(target.center);
            view.map_zoom = Some(target.zoom);
        }
    }

    /// Reopen the detail recorded in `view`. Stale ids are dropped from it.
    pub async fn restore_view(&self, view: &mut ViewState) -> EngineResult<()> {
        if let Some(zone_id) = view.zone_detail.clone() {
            match self.select(Some(zone_id.as_str())).await {
                Err(EngineError::ZoneNotFound(_)) => view.zone_detail = None,
                other => other?,
            }
        } else if let Some(driver_id) = view.driver_detail.clone() {
            self.select_driver(Some(driver_id.as_str())).await?;
        }
        Ok(())
    }
}
