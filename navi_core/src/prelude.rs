// navi_core/src/prelude.rs

// --- Core Abstractions (The contracts a host implements) ---
pub use crate::planning::Planner;
pub use crate::publisher::TrajectorySink;
pub use crate::types::{FrameId, TfError, TfProvider, Timestamp};

// --- Core Data Structures ---
pub use crate::frames::StampedPose;
pub use crate::messages::{Lane, LaneArray, OccupancyGrid, Path, Waypoint};
pub use crate::stats::{TrialRecord, TrialTable};
pub use crate::sweep::{SweepConfig, SweepIndex};

// --- The Controller ---
pub use crate::config::NaviConfig;
pub use crate::controller::{NaviController, TickContext, TickOutcome, TrialSummary};
pub use crate::error::NaviError;

// --- Reference Implementations ---
pub use crate::planning::{GridPlanner, PlanningError};
