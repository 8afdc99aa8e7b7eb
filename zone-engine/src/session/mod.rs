//! Edit Session Controller
//!
//! - [`DrawingTool`]: toolbar tools and their per-tool defaults
//! - [`EditController`]: the drawing / editing state machine
//! - [`CommitScheduler`]: debounce timer for committing edits

mod scheduler;
mod state;
mod tools;

pub use scheduler::CommitScheduler;
pub use state::{EditController, EditSession, EditState};
pub use tools::DrawingTool;

/// Quiet period before pending edits are committed
pub const DEFAULT_COMMIT_DEBOUNCE_MS: u64 = 1000;
