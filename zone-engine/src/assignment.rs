//! Assignment Coordinator
//!
//! A driver is "active" (ETP) in at most one zone. Toggling is applied to
//! the store before the server call and rolled back from snapshots if the
//! call fails.

use std::str::FromStr;

use fleet_client::{ClientResult, ZoneBackend};
use shared::Zone;

use crate::store::ZoneStore;
use crate::{EngineError, EngineResult};

/// How much of the exclusivity invariant is mirrored locally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AssignmentPolicy {
    /// Only the toggled zone changes locally; the server vacates other zones
    #[default]
    Mirror,
    /// Adding also removes the driver from every other local zone
    Exclusive,
}

impl FromStr for AssignmentPolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mirror" => Ok(Self::Mirror),
            "exclusive" => Ok(Self::Exclusive),
            other => Err(EngineError::invalid_state(format!(
                "unknown assignment policy: {}",
                other
            ))),
        }
    }
}

/// An applied optimistic toggle, with what is needed to undo it
#[derive(Debug, Clone)]
pub struct AssignmentPlan {
    pub zone_id: String,
    pub driver_id: String,
    /// true when the driver was added
    pub assign: bool,
    /// Pre-toggle copies of every zone touched
    snapshots: Vec<Zone>,
}

impl AssignmentPlan {
    pub fn touched(&self) -> impl Iterator<Item = &str> {
        self.snapshots.iter().map(|z| z.id.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AssignmentCoordinator {
    policy: AssignmentPolicy,
}

impl AssignmentCoordinator {
    pub fn new(policy: AssignmentPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AssignmentPolicy {
        self.policy
    }

    /// Apply the toggle to the store
    pub fn begin(
        &self,
        store: &mut ZoneStore,
        zone_id: &str,
        driver_id: &str,
    ) -> EngineResult<AssignmentPlan> {
        let zone = store
            .get(zone_id)
            .ok_or_else(|| EngineError::ZoneNotFound(zone_id.to_string()))?;
        let assign = !zone.has_driver(driver_id);
        let mut snapshots = vec![zone.clone()];

        if assign && self.policy == AssignmentPolicy::Exclusive {
            let others: Vec<Zone> = store
                .iter()
                .filter(|z| z.id != zone_id && z.has_driver(driver_id))
                .cloned()
                .collect();
            for other in others {
                if let Some(z) = store.get_mut(&other.id) {
                    z.unassign_driver(driver_id);
                }
                snapshots.push(other);
            }
        }

        if let Some(zone) = store.get_mut(zone_id) {
            if assign {
                zone.assign_driver(driver_id);
            } else {
                zone.unassign_driver(driver_id);
            }
        }

        Ok(AssignmentPlan {
            zone_id: zone_id.to_string(),
            driver_id: driver_id.to_string(),
            assign,
            snapshots,
        })
    }

    /// Send the toggle to the server
    pub async fn send(&self, backend: &dyn ZoneBackend, plan: &AssignmentPlan) -> ClientResult<()> {
        if plan.assign {
            backend.set_active_zone(&plan.zone_id, &plan.driver_id).await
        } else {
            backend.clear_active_zone(&plan.driver_id).await
        }
    }

    /// Undo the toggle
    pub fn rollback(&self, store: &mut ZoneStore, plan: AssignmentPlan) {
        for snapshot in plan.snapshots {
            store.restore(snapshot);
        }
    }
}
