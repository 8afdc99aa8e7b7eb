//! Persistence collaborator consumed by the zone engine

use async_trait::async_trait;
use shared::{Driver, DriverPosition, InstallResponse, Zone, ZoneCreate, ZonePatch};

use crate::ClientResult;

/// Zone persistence operations
///
/// Every call is a network round trip; implementations never touch the
/// engine's local store.
#[async_trait]
pub trait ZoneBackend: Send + Sync {
    async fn list_zones(&self) -> ClientResult<Vec<Zone>>;

    async fn create_zone(&self, zone: &ZoneCreate) -> ClientResult<Zone>;

    async fn update_zone(&self, id: &str, patch: &ZonePatch) -> ClientResult<Zone>;

    async fn delete_zone(&self, id: &str) -> ClientResult<()>;

    /// Copy a global template into the caller's company
    async fn install_template(&self, template_id: &str) -> ClientResult<InstallResponse>;

    /// Make `zone_id` the driver's active (ETP) zone, vacating any other
    async fn set_active_zone(&self, zone_id: &str, driver_id: &str) -> ClientResult<()>;

    /// Clear the driver's active zone, whichever it is
    async fn clear_active_zone(&self, driver_id: &str) -> ClientResult<()>;

    async fn list_drivers(&self) -> ClientResult<Vec<Driver>>;

    async fn list_driver_positions(&self) -> ClientResult<Vec<DriverPosition>>;
}
