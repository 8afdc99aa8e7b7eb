// fleet-client/src/rest.rs
// REST 实现 - /zones 与 /drivers 接口

use async_trait::async_trait;
use serde::Serialize;
use shared::{Driver, DriverPosition, InstallResponse, Zone, ZoneCreate, ZonePatch};

use crate::{ClientConfig, ClientError, ClientResult, HttpClient, NetworkHttpClient, ZoneBackend};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DriverBody<'a> {
    driver_id: &'a str,
}

/// Server ids go into the path verbatim; anything that would change the route is refused
fn path_segment(id: &str) -> ClientResult<&str> {
    if id.is_empty()
        || id
            .chars()
            .any(|c| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace() || c.is_control())
    {
        return Err(ClientError::Validation(format!("invalid id in path: {:?}", id)));
    }
    Ok(id)
}

/// [`ZoneBackend`] over the fleet REST API
#[derive(Debug, Clone)]
pub struct RestZoneBackend<H = NetworkHttpClient> {
    http: H,
}

impl RestZoneBackend<NetworkHttpClient> {
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Ok(Self::new(config.build_http_client()?))
    }
}

impl<H: HttpClient> RestZoneBackend<H> {
    pub fn new(http: H) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &H {
        &self.http
    }
}

#[async_trait]
impl<H: HttpClient> ZoneBackend for RestZoneBackend<H> {
    async fn list_zones(&self) -> ClientResult<Vec<Zone>> {
        let mut zones: Vec<Zone> = self.http.get("zones").await?;
        zones.iter_mut().for_each(Zone::normalize_assignments);
        Ok(zones)
    }

    async fn create_zone(&self, zone: &ZoneCreate) -> ClientResult<Zone> {
        let mut created: Zone = self.http.post("zones", zone).await?;
        created.normalize_assignments();
        Ok(created)
    }

    async fn update_zone(&self, id: &str, patch: &ZonePatch) -> ClientResult<Zone> {
        let mut updated: Zone = self
            .http
            .patch(&format!("zones/{}", path_segment(id)?), patch)
            .await?;
        updated.normalize_assignments();
        Ok(updated)
    }

    async fn delete_zone(&self, id: &str) -> ClientResult<()> {
        self.http.delete(&format!("zones/{}", path_segment(id)?)).await
    }

    async fn install_template(&self, template_id: &str) -> ClientResult<InstallResponse> {
        let mut resp: InstallResponse = self
            .http
            .post_empty(&format!("zones/{}/install", path_segment(template_id)?))
            .await?;
        resp.zone.normalize_assignments();
        Ok(resp)
    }

    async fn set_active_zone(&self, zone_id: &str, driver_id: &str) -> ClientResult<()> {
        let _: serde_json::Value = self
            .http
            .post(
                &format!("zones/{}/set-active-etp", path_segment(zone_id)?),
                &DriverBody { driver_id },
            )
            .await?;
        Ok(())
    }

    async fn clear_active_zone(&self, driver_id: &str) -> ClientResult<()> {
        let _: serde_json::Value = self
            .http
            .post("zones/clear-active-etp", &DriverBody { driver_id })
            .await?;
        Ok(())
    }

    async fn list_drivers(&self) -> ClientResult<Vec<Driver>> {
        self.http.get("drivers").await
    }

    async fn list_driver_positions(&self) -> ClientResult<Vec<DriverPosition>> {
        self.http.get("drivers/positions").await
    }
}
