//! Zone Engine - geofence drawing, editing and assignment core of the fleet console
//!
//! # 模块
//!
//! - [`geometry`]: containment, centroid, zoom and hexagon helpers
//! - [`store`]: optimistic in-memory zone collection
//! - [`session`]: drawing / editing state machine and debounced commits
//! - [`resolver`]: map click to selection, cycling through overlaps
//! - [`assignment`]: exclusive driver active-zone toggling with rollback
//! - [`templates`]: template installation
//! - [`engine`]: [`ZoneEngine`], the façade the console shell drives
//!
//! # 示例
//!
//! ```ignore
//! let backend = Arc::new(RestZoneBackend::from_config(&config.client_config())?);
//! let engine = ZoneEngine::new(backend, &config);
//! engine.load().await?;
//! engine.begin_drawing(DrawingTool::Circle).await?;
//! engine.complete_drawing(Geometry::circle(LatLng::new(5.34, -4.02), 2.0)).await?;
//! ```

pub mod assignment;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod logger;
pub mod poller;
pub mod resolver;
pub mod session;
pub mod store;
pub mod templates;
pub mod view_state;

pub use assignment::{AssignmentCoordinator, AssignmentPolicy};
pub use config::EngineConfig;
pub use engine::{Selection, ZoneEngine};
pub use error::{EngineError, EngineResult};
pub use geometry::CameraTarget;
pub use poller::{PositionBoard, PositionPoller};
pub use resolver::Resolution;
pub use session::{CommitScheduler, DrawingTool, EditState};
pub use store::{SectorGroups, ZoneStore};
pub use view_state::{InMemoryViewStateStore, JsonFileViewStateStore, ViewState, ViewStateStore};
