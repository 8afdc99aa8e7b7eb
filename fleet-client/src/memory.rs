// fleet-client/src/memory.rs
// 内存后端 - 进程内模拟服务端语义（测试与演示用）

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::{
    Driver, DriverPosition, ErrorCode, InstallResponse, OwnerType, Zone, ZoneCreate, ZonePatch,
};

use crate::{ClientError, ClientResult, ZoneBackend};

/// Backend operation kind, used for failure injection and journal filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    ListZones,
    CreateZone,
    UpdateZone,
    DeleteZone,
    InstallTemplate,
    SetActiveZone,
    ClearActiveZone,
    ListDrivers,
    ListDriverPositions,
}

/// Journal entry for every call received, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    ListZones,
    CreateZone(ZoneCreate),
    UpdateZone { id: String, patch: ZonePatch },
    DeleteZone(String),
    InstallTemplate(String),
    SetActiveZone { zone_id: String, driver_id: String },
    ClearActiveZone(String),
    ListDrivers,
    ListDriverPositions,
}

impl BackendCall {
    pub fn op(&self) -> BackendOp {
        match self {
            Self::ListZones => BackendOp::ListZones,
            Self::CreateZone(_) => BackendOp::CreateZone,
            Self::UpdateZone { .. } => BackendOp::UpdateZone,
            Self::DeleteZone(_) => BackendOp::DeleteZone,
            Self::InstallTemplate(_) => BackendOp::InstallTemplate,
            Self::SetActiveZone { .. } => BackendOp::SetActiveZone,
            Self::ClearActiveZone(_) => BackendOp::ClearActiveZone,
            Self::ListDrivers => BackendOp::ListDrivers,
            Self::ListDriverPositions => BackendOp::ListDriverPositions,
        }
    }
}

/// How an operation should fail
#[derive(Debug, Clone, Copy)]
enum Failure {
    Always,
    Times(usize),
}

#[derive(Debug, Default)]
struct State {
    zones: Vec<Zone>,
    drivers: Vec<Driver>,
    positions: Vec<DriverPosition>,
    calls: Vec<BackendCall>,
    failures: HashMap<BackendOp, Failure>,
    next_ids: VecDeque<String>,
    seq: u64,
}

impl State {
    /// Consume one injected failure for `op`, if any
    fn take_failure(&mut self, op: BackendOp) -> bool {
        match self.failures.get_mut(&op) {
            Some(Failure::Always) => true,
            Some(Failure::Times(n)) if *n > 0 => {
                *n -= 1;
                if *n == 0 {
                    self.failures.remove(&op);
                }
                true
            }
            _ => false,
        }
    }

    fn next_id(&mut self) -> String {
        if let Some(id) = self.next_ids.pop_front() {
            return id;
        }
        self.seq += 1;
        format!("Z{}", self.seq)
    }

    fn zone_mut(&mut self, id: &str) -> ClientResult<&mut Zone> {
        self.zones
            .iter_mut()
            .find(|z| z.id == id)
            .ok_or_else(|| api_error(ErrorCode::ZoneNotFound, format!("Zone {} not found", id)))
    }
}

fn api_error(code: ErrorCode, message: impl Into<String>) -> ClientError {
    ClientError::Api {
        code,
        message: message.into(),
    }
}

/// In-process [`ZoneBackend`] mirroring the fleet API's semantics
///
/// - `set_active_zone` is exclusive: the driver is removed from every other zone
/// - template zones (`Sublymus`) are read-only; `install_template` copies them
///   into the configured company with `sourceZoneId` lineage
/// - every call is journaled before failure injection, so tests can assert
///   on attempts as well as on outcomes
#[derive(Debug)]
pub struct InMemoryZoneBackend {
    owner_id: String,
    state: Mutex<State>,
    latency: Mutex<Option<Duration>>,
}

impl InMemoryZoneBackend {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            state: Mutex::new(State::default()),
            latency: Mutex::new(None),
        }
    }

    pub fn with_zones(self, zones: impl IntoIterator<Item = Zone>) -> Self {
        self.state.lock().zones.extend(zones);
        self
    }

    pub fn with_drivers(self, drivers: impl IntoIterator<Item = Driver>) -> Self {
        self.state.lock().drivers.extend(drivers);
        self
    }

    pub fn with_positions(self, positions: impl IntoIterator<Item = DriverPosition>) -> Self {
        self.state.lock().positions.extend(positions);
        self
    }

    /// Id the next created or installed zone will receive
    pub fn push_next_id(&self, id: impl Into<String>) {
        self.state.lock().next_ids.push_back(id.into());
    }

    /// Fail every call of `op` until cleared
    pub fn set_failing(&self, op: BackendOp, failing: bool) {
        let mut state = self.state.lock();
        if failing {
            state.failures.insert(op, Failure::Always);
        } else {
            state.failures.remove(&op);
        }
    }

    /// Fail the next `times` calls of `op`
    pub fn fail_next(&self, op: BackendOp, times: usize) {
        if times > 0 {
            self.state.lock().failures.insert(op, Failure::Times(times));
        }
    }

    /// Delay every response by `latency` (tokio time, so paused clocks apply)
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    pub fn set_positions(&self, positions: Vec<DriverPosition>) {
        self.state.lock().positions = positions;
    }

    /// Insert or replace a zone directly, bypassing the journal
    pub fn put_zone(&self, zone: Zone) {
        let mut state = self.state.lock();
        match state.zones.iter_mut().find(|z| z.id == zone.id) {
            Some(existing) => *existing = zone,
            None => state.zones.push(zone),
        }
    }

    pub fn zones(&self) -> Vec<Zone> {
        self.state.lock().zones.clone()
    }

    pub fn zone(&self, id: &str) -> Option<Zone> {
        self.state.lock().zones.iter().find(|z| z.id == id).cloned()
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().calls.clone()
    }

    pub fn calls_of(&self, op: BackendOp) -> Vec<BackendCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.op() == op)
            .cloned()
            .collect()
    }

    pub fn call_count(&self, op: BackendOp) -> usize {
        self.state.lock().calls.iter().filter(|c| c.op() == op).count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Journal the call, wait for the configured latency, then run `f`
    /// against the state unless a failure was injected.
    async fn handle<T>(
        &self,
        call: BackendCall,
        f: impl FnOnce(&mut State) -> ClientResult<T>,
    ) -> ClientResult<T> {
        let op = call.op();
        self.state.lock().calls.push(call);

        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.lock();
        if state.take_failure(op) {
            tracing::debug!(?op, "Injected backend failure");
            return Err(ClientError::Unavailable(format!("{:?} rejected", op)));
        }
        f(&mut state)
    }
}

#[async_trait]
impl ZoneBackend for InMemoryZoneBackend {
    async fn list_zones(&self) -> ClientResult<Vec<Zone>> {
        self.handle(BackendCall::ListZones, |state| Ok(state.zones.clone()))
            .await
    }

    async fn create_zone(&self, zone: &ZoneCreate) -> ClientResult<Zone> {
        let owner_id = self.owner_id.clone();
        self.handle(BackendCall::CreateZone(zone.clone()), |state| {
            if zone.name.trim().is_empty() {
                return Err(api_error(ErrorCode::ZoneNameRequired, "name is required"));
            }
            let id = state.next_id();
            let mut created = Zone::new(id, zone.name.clone(), zone.geometry.clone())
                .with_color(zone.color.clone())
                .with_owner(OwnerType::Company, Some(owner_id));
            created.sector = zone.sector.clone();
            created.is_active = zone.is_active;
            state.zones.push(created.clone());
            Ok(created)
        })
        .await
    }

    async fn update_zone(&self, id: &str, patch: &ZonePatch) -> ClientResult<Zone> {
        let call = BackendCall::UpdateZone {
            id: id.to_string(),
            patch: patch.clone(),
        };
        self.handle(call, |state| {
            let zone = state.zone_mut(id)?;
            if zone.is_template() {
                return Err(api_error(ErrorCode::TemplateReadOnly, "template zones are read-only"));
            }
            patch.apply_to(zone);
            Ok(zone.clone())
        })
        .await
    }

    async fn delete_zone(&self, id: &str) -> ClientResult<()> {
        self.handle(BackendCall::DeleteZone(id.to_string()), |state| {
            let before = state.zones.len();
            state.zones.retain(|z| z.id != id || z.is_template());
            if state.zones.len() == before {
                return Err(api_error(ErrorCode::ZoneNotFound, format!("Zone {} not found", id)));
            }
            Ok(())
        })
        .await
    }

    async fn install_template(&self, template_id: &str) -> ClientResult<InstallResponse> {
        let owner_id = self.owner_id.clone();
        self.handle(BackendCall::InstallTemplate(template_id.to_string()), |state| {
            let source = state
                .zones
                .iter()
                .find(|z| z.id == template_id && z.is_template())
                .cloned()
                .ok_or_else(|| {
                    api_error(
                        ErrorCode::TemplateNotFound,
                        format!("Template {} not found", template_id),
                    )
                })?;

            let mut copy = source.clone();
            copy.id = state.next_id();
            copy.owner_type = OwnerType::Company;
            copy.owner_id = Some(owner_id);
            copy.source_zone_id = Some(source.id.clone());
            copy.assigned_driver_ids.clear();
            state.zones.push(copy.clone());

            Ok(InstallResponse {
                zone: copy,
                source_zone: source,
            })
        })
        .await
    }

    async fn set_active_zone(&self, zone_id: &str, driver_id: &str) -> ClientResult<()> {
        let call = BackendCall::SetActiveZone {
            zone_id: zone_id.to_string(),
            driver_id: driver_id.to_string(),
        };
        self.handle(call, |state| {
            // Validate before vacating anything
            state.zone_mut(zone_id)?;
            for zone in state.zones.iter_mut() {
                zone.unassign_driver(driver_id);
            }
            state.zone_mut(zone_id)?.assign_driver(driver_id);
            Ok(())
        })
        .await
    }

    async fn clear_active_zone(&self, driver_id: &str) -> ClientResult<()> {
        self.handle(BackendCall::ClearActiveZone(driver_id.to_string()), |state| {
            for zone in state.zones.iter_mut() {
                zone.unassign_driver(driver_id);
            }
            Ok(())
        })
        .await
    }

    async fn list_drivers(&self) -> ClientResult<Vec<Driver>> {
        self.handle(BackendCall::ListDrivers, |state| Ok(state.drivers.clone()))
            .await
    }

    async fn list_driver_positions(&self) -> ClientResult<Vec<DriverPosition>> {
        self.handle(BackendCall::ListDriverPositions, |state| {
            Ok(state.positions.clone())
        })
        .await
    }
}
