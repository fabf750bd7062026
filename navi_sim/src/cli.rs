// navi_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

use crate::config::SimConfig;

/// Navi: replays a planning scenario and benchmarks the planner over a goal sweep.
///
/// Flags take precedence over `NAVI_*` environment variables, which take precedence over
/// the scenario file.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run. Built-in defaults are used without one.
    #[arg(short, long)]
    pub scenario: Option<PathBuf>,

    /// Where to write the CSV report.
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Perturb the goal over the block grid.
    #[arg(long, default_value_t = false)]
    pub area_search: bool,

    /// Stop after this many ticks.
    #[arg(long)]
    pub max_ticks: Option<u64>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long, default_value_t = false)]
    pub print_config: bool,
}

impl Cli {
    pub fn apply_overrides(&self, config: &mut SimConfig) {
        if let Some(report) = &self.report {
            config.report_path = report.clone();
        }
        if self.area_search {
            config.navi.area_search = true;
        }
        if let Some(max_ticks) = self.max_ticks {
            config.max_ticks = Some(max_ticks);
        }
    }
}
