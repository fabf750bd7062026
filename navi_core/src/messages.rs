// navi_core/src/messages.rs

use nalgebra::{DMatrix, Isometry3, Point3};

use crate::frames::StampedPose;
use crate::types::{FrameId, Timestamp};

// =========================================================================
// == Input Messages ==
// =========================================================================

/// Occupancy value of a cell that has never been observed.
pub const UNKNOWN_CELL: i8 = -1;

/// A 2D occupancy grid (costmap). Cell values follow the usual convention:
/// `-1` unknown, `0` free, up to `100` certainly occupied.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    /// The frame the grid (and its origin) is expressed in. This is the planning frame.
    pub frame_id: FrameId,
    pub stamp: Timestamp,
    /// Edge length of one cell in metres.
    pub resolution: f64,
    /// Pose of cell (0, 0)'s corner in `frame_id`.
    pub origin: Isometry3<f64>,
    /// Row `y`, column `x`.
    pub data: DMatrix<i8>,
}

impl OccupancyGrid {
    /// An all-free grid of `width` x `height` cells.
    pub fn new(
        frame_id: impl Into<FrameId>,
        stamp: Timestamp,
        resolution: f64,
        width: usize,
        height: usize,
        origin: Isometry3<f64>,
    ) -> Self {
        Self {
            frame_id: frame_id.into(),
            stamp,
            resolution,
            origin,
            data: DMatrix::zeros(height, width),
        }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// Returns the cell value, or `None` outside the grid.
    pub fn cell(&self, x: isize, y: isize) -> Option<i8> {
        if x < 0 || y < 0 || x as usize >= self.width() || y as usize >= self.height() {
            return None;
        }
        Some(self.data[(y as usize, x as usize)])
    }

    pub fn set_cell(&mut self, x: usize, y: usize, value: i8) {
        if x < self.width() && y < self.height() {
            self.data[(y, x)] = value;
        }
    }

    /// Converts a point in the grid's frame to cell indices (possibly out of bounds).
    pub fn point_to_cell(&self, point: &Point3<f64>) -> (isize, isize) {
        let local = self.origin.inverse_transform_point(point);
        (
            (local.x / self.resolution).floor() as isize,
            (local.y / self.resolution).floor() as isize,
        )
    }

    /// The centre of cell `(x, y)` expressed in the grid's frame.
    pub fn cell_center(&self, x: isize, y: isize) -> Point3<f64> {
        let local = Point3::new(
            (x as f64 + 0.5) * self.resolution,
            (y as f64 + 0.5) * self.resolution,
            0.0,
        );
        self.origin.transform_point(&local)
    }
}

// =========================================================================
// == Planner Output ==
// =========================================================================

/// An ordered sequence of poses returned by a planner.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    pub stamp: Timestamp,
    pub poses: Vec<StampedPose>,
}

// =========================================================================
// == Output Messages ==
// =========================================================================

/// A pose plus the speed the vehicle should hold there.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub pose: StampedPose,
    /// Target speed in m/s.
    pub speed: f64,
}

/// A named sequence of waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Lane {
    pub frame_id: FrameId,
    pub stamp: Timestamp,
    pub increment: i32,
    pub waypoints: Vec<Waypoint>,
}

/// The trajectory message. The controller always publishes exactly one lane.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LaneArray {
    pub lanes: Vec<Lane>,
}
