// navi_sim/tests/runner_flow.rs

use approx::assert_abs_diff_eq;
use nalgebra::Vector3;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

use navi_core::prelude::{FrameId, TickOutcome};
use navi_sim::config::{GridConfig, ObstacleConfig, SimConfig};
use navi_sim::error::SimError;
use navi_sim::runner::Runner;

/// A 20 m x 20 m costmap centred on the map origin, with a short wall between the
/// vehicle and the goal.
fn small_config(report_path: PathBuf) -> SimConfig {
    let mut config = SimConfig::default();
    config.report_path = report_path;
    config.navi.update_rate_hz = 1000.0;
    config.navi.block_number = 2;
    config.navi.block_range = 1.0;
    config.navi.iterations = 2;
    config.navi.area_search = true;
    config.frames[1].translation = Vector3::new(-10.0, -10.0, 0.0);
    config.grid = GridConfig {
        frame: FrameId::from("costmap"),
        resolution: 0.5,
        width: 40,
        height: 40,
        origin: Vector3::zeros(),
        obstacles: vec![ObstacleConfig {
            min: [24, 10],
            max: [25, 30],
            value: 100,
        }],
        publish_at_tick: 0,
    };
    config.current_pose.position = Vector3::new(-5.0, 0.0, 0.5);
    config.goal_pose.position = Vector3::new(6.0, 2.0, 0.0);
    config
}

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

fn report_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("report exists")
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_full_sweep_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("sweep.csv");

    let summary = Runner::new(small_config(report.clone())).unwrap().run().unwrap();

    assert!(summary.completed);
    assert_eq!(summary.trials, 8);
    assert_eq!(summary.ticks, 8);
    assert_eq!(summary.report_path, report);

    let lines = report_lines(&report);
    assert_eq!(lines.len(), 2);
    for line in &lines {
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields.len(), 2 * 2 * 2);
        assert!(fields[..4].iter().all(|f| f.parse::<f64>().is_ok()));
        // Every goal is reachable around the wall.
        assert!(fields[4..].iter().all(|f| *f == "1"));
    }
}

#[test]
fn test_cell_summaries_appear_at_the_default_log_level() {
    let dir = tempfile::tempdir().unwrap();
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("navi_sim=info,navi_core=info"))
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let summary = tracing::subscriber::with_default(subscriber, || {
        Runner::new(small_config(dir.path().join("logged.csv")))
            .unwrap()
            .run()
            .unwrap()
    });
    assert!(summary.completed);

    let text = logs.text();
    assert!(text.contains("finish writing"));
    // One summary line per cell of the 2 x 2 sweep.
    assert_eq!(text.matches("cell summary").count(), 4);
    assert!(text.contains("success_rate=Some(1.0)"));
}

#[test]
fn test_late_goal_delays_the_first_trial() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = small_config(dir.path().join("late.csv"));
    config.goal_pose.publish_at_tick = 3;

    let summary = Runner::new(config).unwrap().run().unwrap();
    assert!(summary.completed);
    assert_eq!(summary.trials, 8);
    assert_eq!(summary.ticks, 3 + 8);
}

#[test]
fn test_poses_before_the_grid_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = small_config(dir.path().join("dropped.csv"));
    config.grid.publish_at_tick = 2;
    config.max_ticks = Some(6);

    let mut runner = Runner::new(config).unwrap();
    let mut report = Vec::new();
    for _ in 0..6 {
        let outcome = runner.step(&mut report).unwrap();
        assert!(matches!(outcome, TickOutcome::NotReady(_)));
    }
    let readiness = runner.controller().readiness();
    assert!(readiness.grid_received());
    assert!(!readiness.current_pose_ready());
    assert!(!readiness.goal_pose_ready());
    assert!(runner.sink().lanes.is_empty());
    assert!(report.is_empty());
}

#[test]
fn test_tick_cap_stops_an_unfinished_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("capped.csv");
    let mut config = small_config(report.clone());
    config.max_ticks = Some(3);

    let summary = Runner::new(config).unwrap().run().unwrap();
    assert!(!summary.completed);
    assert_eq!(summary.ticks, 3);
    assert_eq!(summary.trials, 3);
    // The report is only written when the sweep completes.
    assert!(report_lines(&report).is_empty());
}

#[test]
fn test_step_publishes_target_and_lanes() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = Runner::new(small_config(dir.path().join("unused.csv"))).unwrap();
    let mut report = Vec::new();

    let outcome = runner.step(&mut report).unwrap();
    assert!(matches!(outcome, TickOutcome::Trial(s) if s.record.success));

    let target = runner.sink().targets.latest().expect("target published");
    assert_eq!(target.frame_id.as_str(), "costmap");
    // Goal (6, 2) in map is (16, 12) in the costmap; sweep cell (0, 0) shifts it by (-2, -2).
    assert_abs_diff_eq!(target.position().x, 14.0, epsilon = 1e-9);
    assert_abs_diff_eq!(target.position().y, 10.0, epsilon = 1e-9);

    let lanes = runner.sink().lanes.latest().expect("lanes published");
    let lane = &lanes.lanes[0];
    assert_eq!(lane.frame_id.as_str(), "map");
    assert!(lane.waypoints.len() > 2);
    assert!(lane.waypoints.iter().all(|w| (w.pose.position().z - 0.5).abs() < 1e-9));
    assert_abs_diff_eq!(lane.waypoints[0].pose.position().x, -5.0, epsilon = 1e-9);
}

#[test]
fn test_unwritable_report_path_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("missing_dir").join("report.csv");

    let result = Runner::new(small_config(report)).unwrap().run();
    assert!(matches!(result, Err(SimError::ReportOpen { .. })));
}

#[test]
fn test_update_rate_without_a_representable_period_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("slow.csv");
    let mut config = small_config(report.clone());
    config.navi.update_rate_hz = 1e-20;

    assert!(matches!(Runner::new(config), Err(SimError::Scenario(_))));
    assert!(!report.exists());
}

#[test]
fn test_bundled_scenario_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/sweep_demo.toml");
    let config = SimConfig::load(Some(path.as_path())).unwrap();

    assert_eq!(config.navi.block_number, 3);
    assert!(config.navi.area_search);
    assert_eq!(config.goal_pose.publish_at_tick, 1);
    assert_eq!(config.grid.obstacles.len(), 1);
    assert!(Runner::new(config).is_ok());
}
