// navi_core/src/planning/mod.rs

use std::time::Instant;
use thiserror::Error;

use crate::frames::StampedPose;
use crate::messages::{OccupancyGrid, Path};

pub mod dijkstra;
mod grid_planner;

pub use grid_planner::GridPlanner;

/// Why a planner did not return a path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanningError {
    #[error("The planning grid has not been initialized.")]
    GridNotInitialized,
    #[error("Start point is outside the planning grid.")]
    StartOutsideGrid,
    #[error("Goal point is outside the planning grid.")]
    GoalOutsideGrid,
    #[error("Start point is occupied by an obstacle.")]
    StartOccupied,
    #[error("Goal point is occupied by an obstacle.")]
    GoalOccupied,
    #[error("No valid path found between start and goal.")]
    NoPathFound,
}

// --- THE PLANNER TRAIT ("Contract") ---
/// The contract for any path-search algorithm the controller can drive.
/// Start and goal are always expressed in the grid's frame.
pub trait Planner: Send {
    /// Loads the latest occupancy grid. Called before every search.
    fn initialize(&mut self, grid: &OccupancyGrid);

    /// Searches for a path from `start` to `goal`.
    fn make_plan(&mut self, start: &StampedPose, goal: &StampedPose) -> Result<Path, PlanningError>;

    /// Clears any per-search state. Called after every search, whatever its outcome.
    fn reset(&mut self);
}

/// A planner call together with its wall-clock duration.
#[derive(Debug, Clone)]
pub struct TimedPlan {
    /// Duration of `make_plan` alone, in milliseconds (microsecond resolution).
    pub latency_ms: f64,
    pub result: Result<Path, PlanningError>,
}

impl TimedPlan {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs one trial: initialize with `grid`, time the search, reset.
pub fn run_trial(
    planner: &mut dyn Planner,
    grid: &OccupancyGrid,
    start: &StampedPose,
    goal: &StampedPose,
) -> TimedPlan {
    planner.initialize(grid);

    let started = Instant::now();
    let result = planner.make_plan(start, goal);
    let latency_ms = started.elapsed().as_micros() as f64 / 1000.0;

    planner.reset();

    TimedPlan { latency_ms, result }
}
