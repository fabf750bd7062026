// navi_sim/src/runner.rs

//! Fixed-rate driver: delivers scenario inputs through topics, ticks the controller,
//! and stops once the sweep completes or the tick cap is hit.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use navi_core::prelude::{
    GridPlanner, NaviController, OccupancyGrid, StampedPose, TickContext, TickOutcome,
};

use crate::config::SimConfig;
use crate::error::SimError;
use crate::sinks::TopicSink;
use crate::tf_tree::StaticTfTree;
use crate::topics::{Topic, TopicReader};

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub trials: usize,
    /// `true` if the sweep finished, `false` if the tick cap stopped it first.
    pub completed: bool,
    pub success_rate: f64,
    pub report_path: PathBuf,
}

pub struct Runner {
    config: SimConfig,
    controller: NaviController,
    planner: GridPlanner,
    tf: StaticTfTree,
    sink: TopicSink,

    // --- Input topics ---
    grid_topic: Topic<OccupancyGrid>,
    current_pose_topic: Topic<StampedPose>,
    goal_pose_topic: Topic<StampedPose>,
    grid_reader: TopicReader<OccupancyGrid>,
    current_pose_reader: TopicReader<StampedPose>,
    goal_pose_reader: TopicReader<StampedPose>,

    tick: u64,
    period: Duration,
}

impl Runner {
    /// Builds the transform tree and controller. Scenario errors surface here, before any
    /// file is touched.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let tf = StaticTfTree::from_frames(&config.frames)?;
        for frame in [&config.grid.frame, &config.navi.output_frame] {
            if !tf.contains(frame) {
                warn!(%frame, "frame is not part of the transform tree");
            }
        }
        // Catch bad grids up front rather than on the publish tick.
        config.grid.build(0.0)?;
        let rate_hz = config.navi.update_rate_hz;
        let period = Duration::try_from_secs_f64(rate_hz.recip()).map_err(|_| {
            SimError::Scenario(format!("update rate {rate_hz} Hz gives no usable tick period"))
        })?;

        let capacity = config.topic_capacity;
        Ok(Self {
            controller: NaviController::new(config.navi.clone())?,
            planner: GridPlanner::default(),
            tf,
            sink: TopicSink::new(capacity),
            grid_topic: Topic::new("costmap", capacity),
            current_pose_topic: Topic::new("current_pose", capacity),
            goal_pose_topic: Topic::new("move_base_simple/goal", capacity),
            grid_reader: TopicReader::new(),
            current_pose_reader: TopicReader::new(),
            goal_pose_reader: TopicReader::new(),
            tick: 0,
            period,
            config,
        })
    }

    pub fn controller(&self) -> &NaviController {
        &self.controller
    }

    pub fn sink(&self) -> &TopicSink {
        &self.sink
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Publishes the inputs scheduled for this tick, hands new messages to the
    /// controller, then runs one controller tick.
    pub fn step(&mut self, report: &mut dyn Write) -> Result<TickOutcome, SimError> {
        let stamp = self.config.stamp_at(self.tick);

        // --- 1. Scheduled publications ---
        if self.config.grid.publish_at_tick == self.tick {
            self.grid_topic.publish(self.config.grid.build(stamp)?);
        }
        if self.config.current_pose.publish_at_tick == self.tick {
            self.current_pose_topic
                .publish(self.config.current_pose.stamped(stamp));
        }
        if self.config.goal_pose.publish_at_tick == self.tick {
            self.goal_pose_topic.publish(self.config.goal_pose.stamped(stamp));
        }

        // --- 2. Deliver (grid first so poses published with it are kept) ---
        for msg in self.grid_reader.read(&self.grid_topic) {
            self.controller.on_grid(msg.message.clone());
        }
        for msg in self.current_pose_reader.read(&self.current_pose_topic) {
            self.controller.on_current_pose(msg.message.clone(), &self.tf);
        }
        for msg in self.goal_pose_reader.read(&self.goal_pose_topic) {
            self.controller.on_goal_pose(msg.message.clone(), &self.tf);
        }

        // --- 3. Tick ---
        let mut ctx = TickContext {
            planner: &mut self.planner,
            tf: &self.tf,
            sink: &mut self.sink,
            report,
        };
        let outcome = self.controller.tick(&mut ctx)?;
        self.tick += 1;
        Ok(outcome)
    }

    /// Opens the report file and ticks at `update_rate_hz` until done.
    pub fn run(mut self) -> Result<RunSummary, SimError> {
        let path = self.config.report_path.clone();
        let file = File::create(&path).map_err(|source| SimError::ReportOpen {
            path: path.clone(),
            source,
        })?;
        let mut report = BufWriter::new(file);

        let navi = self.controller.config();
        info!(
            report = %path.display(),
            block_number = navi.block_number,
            iterations = navi.iterations,
            area_search = navi.area_search,
            rate_hz = navi.update_rate_hz,
            "starting planning loop"
        );

        let period = self.period;
        let mut next_tick = Instant::now();
        let completed = loop {
            let outcome = self.step(&mut report)?;
            if outcome.is_terminal() {
                break true;
            }
            if let Some(max_ticks) = self.config.max_ticks {
                if self.tick >= max_ticks {
                    warn!(
                        max_ticks,
                        trials = self.controller.table().len(),
                        "tick cap reached before the sweep finished"
                    );
                    break false;
                }
            }

            // Sleep off the rest of the period; if we overran, start the next one now.
            next_tick += period;
            let now = Instant::now();
            if next_tick > now {
                thread::sleep(next_tick - now);
            } else {
                next_tick = now;
            }
        };
        report.flush()?;

        let table = self.controller.table();
        let summary = RunSummary {
            ticks: self.tick,
            trials: table.len(),
            completed,
            success_rate: table.overall_success_rate(),
            report_path: path,
        };
        info!(
            ticks = summary.ticks,
            trials = summary.trials,
            completed = summary.completed,
            success_rate = summary.success_rate,
            "planning loop finished"
        );
        Ok(summary)
    }
}
