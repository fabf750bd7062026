// navi_core/src/controller.rs

//! The planning controller: one synchronous `tick()` per scheduler period.
//!
//! Per tick: readiness gate, sweep target, frame transforms, timed planner call,
//! trajectory or stop publish, statistics, and on the final trial the report.

use std::io::Write;
use tracing::{debug, info, warn};

use crate::config::NaviConfig;
use crate::error::NaviError;
use crate::frames::{transform_pose, StampedPose};
use crate::messages::OccupancyGrid;
use crate::planning::{run_trial, Planner};
use crate::publisher::{build_lanes, stop_lanes, TrajectorySink};
use crate::readiness::ReadinessTracker;
use crate::stats::{write_report, TrialRecord, TrialTable};
use crate::sweep::{target_pose, SweepConfig, SweepIndex, SweepProgress, SweepState};
use crate::types::TfProvider;

/// Collaborators the controller needs for a tick. Built by the host for every call.
pub struct TickContext<'a> {
    pub planner: &'a mut dyn Planner,
    pub tf: &'a dyn TfProvider,
    pub sink: &'a mut dyn TrajectorySink,
    /// Destination of the sweep report, written once on completion.
    pub report: &'a mut dyn Write,
}

/// What a single trial produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialSummary {
    /// Trial counter value the trial ran at.
    pub count: usize,
    pub index: SweepIndex,
    pub record: TrialRecord,
}

/// Result of one call to [`NaviController::tick`].
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// At least one input is missing; nothing was planned, published or recorded.
    NotReady(ReadinessTracker),
    /// A trial ran and more remain.
    Trial(TrialSummary),
    /// The final trial ran and the report was written.
    SweepComplete {
        last: TrialSummary,
        report_lines: usize,
    },
    /// The sweep completed on an earlier tick; this tick did nothing.
    Finished,
}

impl TickOutcome {
    /// True once the host should stop ticking.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TickOutcome::SweepComplete { .. } | TickOutcome::Finished)
    }
}

/// Owns every piece of mutable planning state: latest inputs, readiness latches,
/// sweep counter and trial table.
#[derive(Debug)]
pub struct NaviController {
    config: NaviConfig,
    sweep_config: SweepConfig,
    readiness: ReadinessTracker,

    grid: Option<OccupancyGrid>,
    current_pose_global: Option<StampedPose>,
    current_pose_local: Option<StampedPose>,
    goal_pose_global: Option<StampedPose>,
    goal_pose_local: Option<StampedPose>,

    sweep: SweepState,
    table: TrialTable,
    finished: bool,
}

impl NaviController {
    pub fn new(config: NaviConfig) -> Result<Self, NaviError> {
        config.validate()?;
        let sweep_config = config.sweep();
        Ok(Self {
            table: TrialTable::new(&sweep_config),
            sweep_config,
            config,
            readiness: ReadinessTracker::default(),
            grid: None,
            current_pose_global: None,
            current_pose_local: None,
            goal_pose_global: None,
            goal_pose_local: None,
            sweep: SweepState::new(),
            finished: false,
        })
    }

    // =========================================================================
    // == Input Handlers ==
    // =========================================================================

    /// Replaces the occupancy grid. Its frame becomes the planning frame.
    pub fn on_grid(&mut self, grid: OccupancyGrid) {
        info!(
            frame = %grid.frame_id,
            width = grid.width(),
            height = grid.height(),
            "received costmap"
        );
        self.grid = Some(grid);
        self.readiness.mark_grid_received();
    }

    /// Stores the vehicle pose and its transform into the planning frame.
    /// Ignored until a grid has been received.
    pub fn on_current_pose(&mut self, pose: StampedPose, tf: &dyn TfProvider) {
        let Some(grid) = &self.grid else {
            warn!(frame = %pose.frame_id, "current pose received before costmap, dropping");
            return;
        };

        let local = transform_pose(&pose, &grid.frame_id, tf);
        info!(from = %pose.frame_id, to = %local.frame_id, "subscribed current pose");
        self.current_pose_global = Some(pose);
        self.current_pose_local = Some(local);
        self.readiness.mark_current_pose_ready();
    }

    /// Stores the goal pose and its transform into the planning frame.
    /// Ignored until a grid has been received.
    pub fn on_goal_pose(&mut self, pose: StampedPose, tf: &dyn TfProvider) {
        let Some(grid) = &self.grid else {
            warn!(frame = %pose.frame_id, "goal pose received before costmap, dropping");
            return;
        };

        let local = transform_pose(&pose, &grid.frame_id, tf);
        info!(
            from = %pose.frame_id,
            to = %local.frame_id,
            x = local.position().x,
            y = local.position().y,
            "subscribed goal pose"
        );
        self.goal_pose_global = Some(pose);
        self.goal_pose_local = Some(local);
        self.readiness.mark_goal_pose_ready();
    }

    // =========================================================================
    // == Tick ==
    // =========================================================================

    /// Runs at most one trial.
    ///
    /// Only writing the report can fail; planner and transform problems are
    /// absorbed into the trial's outcome.
    pub fn tick(&mut self, ctx: &mut TickContext<'_>) -> Result<TickOutcome, NaviError> {
        if self.finished {
            return Ok(TickOutcome::Finished);
        }

        // --- 1. Readiness gate ---
        let (Some(grid), Some(current_global), Some(current_local), Some(goal_global)) = (
            self.grid.as_ref(),
            self.current_pose_global.as_ref(),
            self.current_pose_local.as_ref(),
            self.goal_pose_global.as_ref(),
        ) else {
            debug!("{}", self.readiness);
            return Ok(TickOutcome::NotReady(self.readiness));
        };
        if !self.readiness.is_ready() {
            debug!("{}", self.readiness);
            return Ok(TickOutcome::NotReady(self.readiness));
        }

        // --- 2. Refresh the goal in the planning frame and pick this trial's target ---
        let goal_local = transform_pose(goal_global, &grid.frame_id, ctx.tf);
        let index = self.sweep.index(&self.sweep_config);
        let target = if self.sweep_config.area_search {
            let mut target = target_pose(&goal_local, &index, &self.sweep_config);
            target.stamp = current_local.stamp;
            target
        } else {
            goal_local.clone()
        };

        // --- 3. Timed planner call ---
        let timed = run_trial(&mut *ctx.planner, grid, current_local, &target);
        let record = TrialRecord {
            latency_ms: timed.latency_ms,
            success: timed.succeeded(),
        };

        // --- 4. Publish ---
        ctx.sink.publish_target(&target);
        let lanes = match &timed.result {
            Ok(path) => {
                info!("found goal");
                build_lanes(
                    path,
                    self.config.velocity_kmh,
                    current_global.position().z,
                    &self.config.output_frame,
                    ctx.tf,
                )
            }
            Err(reason) => {
                info!(%reason, "no plan found");
                stop_lanes(current_global, &self.config.output_frame, ctx.tf)
            }
        };
        ctx.sink.publish_lanes(lanes);

        // --- 5. Statistics ---
        self.goal_pose_local = Some(goal_local);
        self.table.record(&index, record);
        let summary = TrialSummary {
            count: self.sweep.count(),
            index,
            record,
        };
        info!(
            cnt = summary.count,
            index_x = index.ix,
            index_y = index.iy,
            iter = index.iter,
            latency_ms = record.latency_ms,
            success = record.success,
            "trial finished"
        );

        // --- 6. Advance, or flush the report on the final trial ---
        match self.sweep.advance(&self.sweep_config) {
            SweepProgress::Next(_) => Ok(TickOutcome::Trial(summary)),
            SweepProgress::Complete => {
                self.finished = true;
                let report_lines = write_report(&self.table, ctx.report)?;
                info!(
                    lines = report_lines,
                    trials = self.table.len(),
                    success_rate = self.table.overall_success_rate(),
                    "finish writing"
                );
                self.log_cell_summary();
                Ok(TickOutcome::SweepComplete {
                    last: summary,
                    report_lines,
                })
            }
        }
    }

    fn log_cell_summary(&self) {
        let n = self.sweep_config.block_number;
        for iy in 0..n {
            for ix in 0..n {
                info!(
                    index_x = ix,
                    index_y = iy,
                    mean_latency_ms = ?self.table.mean_success_latency(ix, iy),
                    success_rate = ?self.table.success_rate(ix, iy),
                    "cell summary"
                );
            }
        }
    }

    // =========================================================================
    // == Accessors ==
    // =========================================================================

    pub fn config(&self) -> &NaviConfig {
        &self.config
    }

    pub fn readiness(&self) -> ReadinessTracker {
        self.readiness
    }

    pub fn sweep_state(&self) -> SweepState {
        self.sweep
    }

    pub fn table(&self) -> &TrialTable {
        &self.table
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn current_pose_local(&self) -> Option<&StampedPose> {
        self.current_pose_local.as_ref()
    }

    pub fn goal_pose_local(&self) -> Option<&StampedPose> {
        self.goal_pose_local.as_ref()
    }
}
