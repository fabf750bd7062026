// navi_core/src/planning/grid_planner.rs

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion};
use std::f64::consts::SQRT_2;

use super::dijkstra::{self, SearchResult};
use super::{Planner, PlanningError};
use crate::frames::StampedPose;
use crate::messages::{OccupancyGrid, Path, UNKNOWN_CELL};

type GridCoord = (isize, isize);

const DIRECTIONS: [(isize, isize); 8] = [
    (0, 1),
    (0, -1),
    (1, 0),
    (-1, 0), // Cardinal
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1), // Diagonal
];

/// An 8-connected Dijkstra planner over the occupancy grid.
#[derive(Debug, Clone)]
pub struct GridPlanner {
    /// Cells at or above this value are obstacles.
    pub occupied_threshold: i8,
    /// Whether unknown (`-1`) cells may be traversed.
    pub allow_unknown: bool,
    grid: Option<OccupancyGrid>,
    last_search: Option<SearchResult<GridCoord>>,
}

impl Default for GridPlanner {
    fn default() -> Self {
        Self::new(50, false)
    }
}

impl GridPlanner {
    pub fn new(occupied_threshold: i8, allow_unknown: bool) -> Self {
        Self {
            occupied_threshold,
            allow_unknown,
            grid: None,
            last_search: None,
        }
    }

    /// Nodes expanded by the most recent search, until the next `reset`.
    pub fn last_expanded(&self) -> Option<usize> {
        self.last_search.as_ref().map(|s| s.expanded)
    }

    fn is_blocked(&self, value: i8) -> bool {
        if value == UNKNOWN_CELL {
            return !self.allow_unknown;
        }
        value >= self.occupied_threshold
    }

    fn locate(
        &self,
        grid: &OccupancyGrid,
        pose: &StampedPose,
        outside: PlanningError,
        occupied: PlanningError,
    ) -> Result<GridCoord, PlanningError> {
        let coord = grid.point_to_cell(&Point3::from(pose.position()));
        match grid.cell(coord.0, coord.1) {
            None => Err(outside),
            Some(value) if self.is_blocked(value) => Err(occupied),
            Some(_) => Ok(coord),
        }
    }

    fn neighbors(&self, grid: &OccupancyGrid, node: &GridCoord) -> Vec<(GridCoord, f64)> {
        let mut neighbors = Vec::with_capacity(8); // Max 8 neighbors
        for (dx, dy) in DIRECTIONS {
            let next = (node.0 + dx, node.1 + dy);
            if let Some(value) = grid.cell(next.0, next.1) {
                if !self.is_blocked(value) {
                    let move_cost = if dx != 0 && dy != 0 { SQRT_2 } else { 1.0 };
                    neighbors.push((next, move_cost));
                }
            }
        }
        neighbors
    }
}

impl Planner for GridPlanner {
    fn initialize(&mut self, grid: &OccupancyGrid) {
        // Skip the copy when the same grid is handed in again.
        if self.grid.as_ref() != Some(grid) {
            self.grid = Some(grid.clone());
        }
    }

    fn make_plan(&mut self, start: &StampedPose, goal: &StampedPose) -> Result<Path, PlanningError> {
        let grid = self.grid.as_ref().ok_or(PlanningError::GridNotInitialized)?;

        let start_node = self.locate(
            grid,
            start,
            PlanningError::StartOutsideGrid,
            PlanningError::StartOccupied,
        )?;
        let goal_node = self.locate(
            grid,
            goal,
            PlanningError::GoalOutsideGrid,
            PlanningError::GoalOccupied,
        )?;

        let mut neighbor_fn = |node: &GridCoord| self.neighbors(grid, node);
        let search = dijkstra::plan(&start_node, |node| *node == goal_node, &mut neighbor_fn)
            .ok_or(PlanningError::NoPathFound)?;

        let centres: Vec<Point3<f64>> = search
            .path
            .iter()
            .map(|&(x, y)| grid.cell_center(x, y))
            .collect();

        let last = centres.len() - 1;
        let mut poses = Vec::with_capacity(centres.len());
        for (i, centre) in centres.iter().enumerate() {
            let pose = if i == 0 {
                start.pose
            } else if i == last {
                goal.pose
            } else {
                // Interior poses face the next cell.
                let heading = centres[i + 1] - *centre;
                Isometry3::from_parts(
                    Translation3::from(centre.coords),
                    UnitQuaternion::from_euler_angles(0.0, 0.0, heading.y.atan2(heading.x)),
                )
            };
            poses.push(StampedPose::new(grid.frame_id.clone(), start.stamp, pose));
        }

        self.last_search = Some(search);
        Ok(Path {
            stamp: start.stamp,
            poses,
        })
    }

    fn reset(&mut self) {
        self.last_search = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    // 10 x 10 cells of 1 m, with a wall at x = 5 from y = 0 to y = 8.
    fn walled_grid() -> OccupancyGrid {
        let mut grid = OccupancyGrid::new("costmap", 0.0, 1.0, 10, 10, Isometry3::identity());
        for y in 0..9 {
            grid.set_cell(5, y, 100);
        }
        grid
    }

    fn pose(x: f64, y: f64) -> StampedPose {
        StampedPose::from_xyz("costmap", 2.0, x, y, 0.0)
    }

    #[test]
    fn test_plan_without_grid_fails() {
        let mut planner = GridPlanner::default();
        assert_eq!(
            planner.make_plan(&pose(0.5, 0.5), &pose(1.5, 1.5)),
            Err(PlanningError::GridNotInitialized)
        );
    }

    #[test]
    fn test_plan_routes_around_wall() {
        let mut planner = GridPlanner::default();
        planner.initialize(&walled_grid());

        let path = planner
            .make_plan(&pose(1.5, 1.5), &pose(8.5, 1.5))
            .expect("gap at the top of the wall");

        assert_eq!(path.poses.first().map(|p| p.position()), Some(pose(1.5, 1.5).position()));
        assert_eq!(path.poses.last().map(|p| p.position()), Some(pose(8.5, 1.5).position()));
        assert!(path.poses.iter().all(|p| p.frame_id.as_str() == "costmap"));
        assert_abs_diff_eq!(path.stamp, 2.0);
        // The path must pass through the gap at y = 9.
        assert!(path.poses.iter().any(|p| p.position().y > 9.0));
        assert!(planner.last_expanded().is_some());

        planner.reset();
        assert!(planner.last_expanded().is_none());
    }

    #[test]
    fn test_plan_rejects_blocked_or_outside_endpoints() {
        let mut planner = GridPlanner::default();
        planner.initialize(&walled_grid());

        assert_eq!(
            planner.make_plan(&pose(-1.0, 1.0), &pose(8.5, 1.5)),
            Err(PlanningError::StartOutsideGrid)
        );
        assert_eq!(
            planner.make_plan(&pose(5.5, 1.5), &pose(8.5, 1.5)),
            Err(PlanningError::StartOccupied)
        );
        assert_eq!(
            planner.make_plan(&pose(1.5, 1.5), &pose(12.0, 1.5)),
            Err(PlanningError::GoalOutsideGrid)
        );
        assert_eq!(
            planner.make_plan(&pose(1.5, 1.5), &pose(5.2, 3.0)),
            Err(PlanningError::GoalOccupied)
        );
    }

    #[test]
    fn test_plan_fails_when_fully_enclosed() {
        let mut grid = walled_grid();
        grid.set_cell(5, 9, 100);
        let mut planner = GridPlanner::default();
        planner.initialize(&grid);

        assert_eq!(
            planner.make_plan(&pose(1.5, 1.5), &pose(8.5, 1.5)),
            Err(PlanningError::NoPathFound)
        );
    }

    #[test]
    fn test_unknown_cells_respect_policy() {
        let mut grid = OccupancyGrid::new("costmap", 0.0, 1.0, 3, 1, Isometry3::identity());
        grid.set_cell(1, 0, UNKNOWN_CELL);

        let mut cautious = GridPlanner::new(50, false);
        cautious.initialize(&grid);
        assert_eq!(
            cautious.make_plan(&pose(0.5, 0.5), &pose(2.5, 0.5)),
            Err(PlanningError::NoPathFound)
        );

        let mut bold = GridPlanner::new(50, true);
        bold.initialize(&grid);
        let path = bold.make_plan(&pose(0.5, 0.5), &pose(2.5, 0.5)).expect("unknown allowed");
        assert_eq!(path.poses.len(), 3);
    }
}
