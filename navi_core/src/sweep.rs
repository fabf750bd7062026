// navi_core/src/sweep.rs

//! Deterministic enumeration of benchmark trials.
//!
//! A sweep runs `N * N * ITER` trials. The trial counter `cnt` alone determines which
//! cell `(ix, iy)` and which replication `iter` a trial belongs to:
//!
//! ```text
//! ix   = (cnt / ITER) mod N
//! iy   =  cnt / (ITER * N)
//! iter =  cnt mod ITER
//! ```
//!
//! so every cell is replayed `ITER` times in a row before the sweep moves on.

use nalgebra::Vector3;

use crate::frames::StampedPose;

/// The subset of the controller configuration that shapes a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepConfig {
    /// Cells per axis (`N`, at least 1).
    pub block_number: usize,
    /// Goal offset per cell in metres (`RANGE`).
    pub block_range: f64,
    /// Replications per cell (`ITER`, at least 1).
    pub iterations: usize,
    /// Whether the goal is perturbed per cell.
    pub area_search: bool,
}

impl SweepConfig {
    pub fn total_trials(&self) -> usize {
        self.block_number * self.block_number * self.iterations
    }

    /// Offset of cell index `i` from the goal, in multiples of `block_range`.
    /// The centre term uses integer division, so the cell grid sits slightly
    /// off-centre around the goal.
    fn cell_offset(&self, i: usize) -> f64 {
        let centre = (self.block_number / 2 + 1) as f64;
        self.block_range * (i as f64 - centre)
    }
}

/// Position of one trial within the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SweepIndex {
    pub ix: usize,
    pub iy: usize,
    pub iter: usize,
}

impl SweepIndex {
    /// Derives the indices of trial `cnt`.
    pub fn from_count(cnt: usize, config: &SweepConfig) -> Self {
        let block = cnt / config.iterations;
        Self {
            ix: block % config.block_number,
            iy: block / config.block_number,
            iter: cnt % config.iterations,
        }
    }

    /// Flat cell index `ix + iy * N` used by the statistics table.
    pub fn cell(&self, block_number: usize) -> usize {
        self.ix + self.iy * block_number
    }

    /// True for the last replication of the last cell.
    pub fn is_last(&self, config: &SweepConfig) -> bool {
        self.ix == config.block_number - 1
            && self.iy == config.block_number - 1
            && self.iter == config.iterations - 1
    }
}

/// Result of moving the sweep forward by one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepProgress {
    /// The next trial to run.
    Next(SweepIndex),
    /// The trial just run was the last one; the counter did not move.
    Complete,
}

/// The trial counter. Everything else is derived from it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepState {
    cnt: usize,
}

impl SweepState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.cnt
    }

    pub fn index(&self, config: &SweepConfig) -> SweepIndex {
        SweepIndex::from_count(self.cnt, config)
    }

    /// Advances past the current trial, or reports completion if it was the last one.
    pub fn advance(&mut self, config: &SweepConfig) -> SweepProgress {
        if self.index(config).is_last(config) {
            return SweepProgress::Complete;
        }
        self.cnt += 1;
        SweepProgress::Next(self.index(config))
    }
}

/// The goal the planner is asked to reach for trial `index`.
///
/// With `area_search` disabled this is the goal itself. Otherwise the goal is shifted
/// by the cell offset on x and y; height and orientation are kept.
pub fn target_pose(goal: &StampedPose, index: &SweepIndex, config: &SweepConfig) -> StampedPose {
    if !config.area_search {
        return goal.clone();
    }

    let mut target = goal.clone();
    target.pose.translation.vector += Vector3::new(
        config.cell_offset(index.ix),
        config.cell_offset(index.iy),
        0.0,
    );
    target
}
