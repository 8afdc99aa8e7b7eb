//! Edit session state machine
//!
//! ```text
//! Idle -> ToolSelected(tool) -> Drawing -> Idle          (creation)
//! Idle -> Editing(zone) <-> Committing(zone) -> Idle     (modification)
//! ```
//!
//! The controller is synchronous and owns no timers; the engine arms the
//! commit timer and performs the network calls.

use shared::{LatLng, ZonePatch};
use tokio::time::Instant;

use super::DrawingTool;
use crate::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditState {
    #[default]
    Idle,
    ToolSelected(DrawingTool),
    /// A shape is being placed (hexagon center fixed) or its create call is in flight
    Drawing {
        tool: DrawingTool,
        anchor: Option<LatLng>,
    },
    Editing(String),
    /// An update for the zone is in flight
    Committing(String),
}

/// Uncommitted edits to one zone
#[derive(Debug, Clone)]
pub struct EditSession {
    pub target_zone_id: String,
    pub pending_patch: ZonePatch,
    pub last_edit_at: Option<Instant>,
}

impl EditSession {
    fn new(zone_id: impl Into<String>) -> Self {
        Self {
            target_zone_id: zone_id.into(),
            pending_patch: ZonePatch::default(),
            last_edit_at: None,
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending_patch.is_empty()
    }

    /// Pending patch, if any, consuming the session
    pub fn into_pending(self) -> Option<(String, ZonePatch)> {
        if self.pending_patch.is_empty() {
            None
        } else {
            Some((self.target_zone_id, self.pending_patch))
        }
    }
}

#[derive(Debug, Default)]
pub struct EditController {
    state: EditState,
    session: Option<EditSession>,
}

impl EditController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    /// Zone currently in `Editing` or `Committing`
    pub fn editing_zone(&self) -> Option<&str> {
        match &self.state {
            EditState::Editing(id) | EditState::Committing(id) => Some(id),
            _ => None,
        }
    }

    // ========== Creation path ==========

    /// Pick a drawing tool. Returns the session that was open, for flushing.
    pub fn select_tool(&mut self, tool: DrawingTool) -> Option<EditSession> {
        self.state = EditState::ToolSelected(tool);
        self.session.take()
    }

    /// Fix the first point of a two-click shape
    pub fn place_anchor(&mut self, point: LatLng) -> EngineResult<DrawingTool> {
        match self.state {
            EditState::ToolSelected(tool) => {
                self.state = EditState::Drawing {
                    tool,
                    anchor: Some(point),
                };
                Ok(tool)
            }
            _ => Err(EngineError::invalid_state("no drawing tool selected")),
        }
    }

    pub fn anchor(&self) -> Option<(DrawingTool, LatLng)> {
        match self.state {
            EditState::Drawing {
                tool,
                anchor: Some(anchor),
            } => Some((tool, anchor)),
            _ => None,
        }
    }

    /// A shape was completed; its create call is about to be sent
    pub fn start_create(&mut self) -> EngineResult<DrawingTool> {
        let tool = match self.state {
            EditState::ToolSelected(tool) | EditState::Drawing { tool, .. } => tool,
            _ => return Err(EngineError::invalid_state("no drawing tool selected")),
        };
        self.state = EditState::Drawing { tool, anchor: None };
        Ok(tool)
    }

    /// Create call settled. A tool picked in the meantime is left alone.
    pub fn finish_drawing(&mut self) {
        if matches!(self.state, EditState::Drawing { anchor: None, .. }) {
            self.state = EditState::Idle;
        }
    }

    // ========== Modification path ==========

    /// Enter `Editing(zone_id)`.
    ///
    /// Returns the previous session when it targeted another zone; the caller
    /// flushes it. Re-selecting the zone being edited keeps its session.
    pub fn begin_editing(&mut self, zone_id: &str) -> Option<EditSession> {
        if self.editing_zone() == Some(zone_id) {
            return None;
        }
        let previous = self.session.take();
        self.state = EditState::Editing(zone_id.to_string());
        self.session = Some(EditSession::new(zone_id));
        previous
    }

    /// Merge an edit into the pending patch. Returns the zone it targets.
    pub fn record_edit(&mut self, patch: ZonePatch) -> EngineResult<String> {
        let zone_id = self.editing_zone().ok_or(EngineError::NotEditing)?.to_string();
        let session = self
            .session
            .get_or_insert_with(|| EditSession::new(zone_id.clone()));
        session.pending_patch.merge(patch);
        session.last_edit_at = Some(Instant::now());
        Ok(zone_id)
    }

    /// Take the pending patch for `zone_id` and move to `Committing`
    pub fn take_pending(&mut self, zone_id: &str) -> Option<ZonePatch> {
        let session = self
            .session
            .as_mut()
            .filter(|s| s.target_zone_id == zone_id && s.has_pending())?;
        let patch = std::mem::take(&mut session.pending_patch);
        self.state = EditState::Committing(zone_id.to_string());
        Some(patch)
    }

    /// Edits recorded after the in-flight commit was taken
    pub fn pending_for(&self, zone_id: &str) -> Option<&ZonePatch> {
        self.session
            .as_ref()
            .filter(|s| s.target_zone_id == zone_id && s.has_pending())
            .map(|s| &s.pending_patch)
    }

    pub fn discard_pending(&mut self, zone_id: &str) {
        if let Some(session) = self
            .session
            .as_mut()
            .filter(|s| s.target_zone_id == zone_id)
        {
            session.pending_patch = ZonePatch::default();
        }
    }

    /// Commit settled: `Committing(zone)` returns to `Editing(zone)`
    pub fn finish_commit(&mut self, zone_id: &str) {
        if matches!(&self.state, EditState::Committing(id) if id == zone_id) {
            self.state = EditState::Editing(zone_id.to_string());
        }
    }

    /// Leave editing and hand back the session, for flushing
    pub fn end_session(&mut self) -> Option<EditSession> {
        if self.editing_zone().is_some() {
            self.state = EditState::Idle;
        }
        self.session.take()
    }

    /// Drop everything without committing
    pub fn cancel(&mut self) -> Option<EditSession> {
        self.state = EditState::Idle;
        self.session.take()
    }

    /// The zone was deleted; forget any session on it
    pub fn forget_zone(&mut self, zone_id: &str) {
        if self.editing_zone() == Some(zone_id) {
            self.state = EditState::Idle;
        }
        if self
            .session
            .as_ref()
            .is_some_and(|s| s.target_zone_id == zone_id)
        {
            self.session = None;
        }
    }
}
