//! Template Import Service
//!
//! Global `Sublymus` templates are read-only; installing one asks the server
//! to copy it into the company's zone set and records the lineage in
//! `sourceZoneId`.

use fleet_client::ZoneBackend;
use shared::Zone;

use crate::EngineResult;

/// Whether `zones` already hold a copy of `template_id`.
///
/// Advisory only: `zones` may be stale, in which case a second install is
/// let through and the server decides.
pub fn is_installed<'a>(template_id: &str, zones: impl IntoIterator<Item = &'a Zone>) -> bool {
    zones
        .into_iter()
        .any(|z| !z.is_template() && z.source_zone_id.as_deref() == Some(template_id))
}

/// Copy a template into the company. Returns the new, normalized zone.
pub async fn install(backend: &dyn ZoneBackend, template_id: &str) -> EngineResult<Zone> {
    let response = backend.install_template(template_id).await?;
    let zone = record_lineage(response.zone, template_id);

    tracing::info!(
        template_id = %template_id,
        zone_id = %zone.id,
        source = %response.source_zone.name,
        "Template installed"
    );
    Ok(zone)
}

/// The installed copy always points back at the template it came from,
/// whatever lineage the server echoed.
fn record_lineage(mut zone: Zone, template_id: &str) -> Zone {
    zone.source_zone_id = Some(template_id.to_string());
    zone.normalize_assignments();
    zone
}
