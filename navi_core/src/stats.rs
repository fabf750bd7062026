// navi_core/src/stats.rs

use nalgebra::DMatrix;
use std::io::{self, Write};

use crate::sweep::{SweepConfig, SweepIndex};

/// Outcome of one planner invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialRecord {
    pub latency_ms: f64,
    pub success: bool,
}

/// Dense `(N * N) x ITER` table of trial outcomes.
///
/// Rows are cells (`ix + iy * N`), columns are replications.
#[derive(Debug, Clone)]
pub struct TrialTable {
    block_number: usize,
    latency_ms: DMatrix<f64>,
    success: DMatrix<bool>,
    recorded: DMatrix<bool>,
}

impl TrialTable {
    pub fn new(config: &SweepConfig) -> Self {
        let cells = config.block_number * config.block_number;
        Self {
            block_number: config.block_number,
            latency_ms: DMatrix::zeros(cells, config.iterations),
            success: DMatrix::from_element(cells, config.iterations, false),
            recorded: DMatrix::from_element(cells, config.iterations, false),
        }
    }

    pub fn cells(&self) -> usize {
        self.latency_ms.nrows()
    }

    pub fn iterations(&self) -> usize {
        self.latency_ms.ncols()
    }

    /// Stores `record` for trial `index`, replacing any earlier value.
    pub fn record(&mut self, index: &SweepIndex, record: TrialRecord) {
        let at = (index.cell(self.block_number), index.iter);
        self.latency_ms[at] = record.latency_ms;
        self.success[at] = record.success;
        self.recorded[at] = true;
    }

    pub fn get(&self, index: &SweepIndex) -> Option<TrialRecord> {
        if index.iter >= self.iterations() {
            return None;
        }
        let at = (self.row(index.ix, index.iy)?, index.iter);
        self.recorded[at].then(|| TrialRecord {
            latency_ms: self.latency_ms[at],
            success: self.success[at],
        })
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.recorded.iter().filter(|&&r| r).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_complete(&self) -> bool {
        self.len() == self.recorded.len()
    }

    /// Table row of cell `(ix, iy)`, or `None` outside the `N x N` block.
    fn row(&self, ix: usize, iy: usize) -> Option<usize> {
        (ix < self.block_number && iy < self.block_number).then(|| ix + iy * self.block_number)
    }

    /// Mean latency of the successful trials of cell `(ix, iy)`. `None` for a cell
    /// outside the sweep or without any success.
    pub fn mean_success_latency(&self, ix: usize, iy: usize) -> Option<f64> {
        let row = self.row(ix, iy)?;
        let (sum, n) = (0..self.iterations())
            .filter(|&c| self.recorded[(row, c)] && self.success[(row, c)])
            .fold((0.0, 0usize), |(sum, n), c| (sum + self.latency_ms[(row, c)], n + 1));
        (n > 0).then(|| sum / n as f64)
    }

    /// Fraction of recorded trials of cell `(ix, iy)` that found a path. `None` for a
    /// cell outside the sweep; `Some(0.0)` while nothing has been recorded.
    pub fn success_rate(&self, ix: usize, iy: usize) -> Option<f64> {
        let row = self.row(ix, iy)?;
        let recorded = (0..self.iterations())
            .filter(|&c| self.recorded[(row, c)])
            .count();
        if recorded == 0 {
            return Some(0.0);
        }
        let successes = (0..self.iterations())
            .filter(|&c| self.recorded[(row, c)] && self.success[(row, c)])
            .count();
        Some(successes as f64 / recorded as f64)
    }

    /// Fraction of all recorded trials that found a path.
    pub fn overall_success_rate(&self) -> f64 {
        let recorded = self.len();
        if recorded == 0 {
            return 0.0;
        }
        let successes = self
            .recorded
            .iter()
            .zip(self.success.iter())
            .filter(|&(&r, &s)| r && s)
            .count();
        successes as f64 / recorded as f64
    }
}

// =========================================================================
// == Report Writer ==
// =========================================================================

/// Writes the table as CSV: one line per replication, holding every cell's latency
/// (six decimals) followed by every cell's success flag (`0`/`1`). Returns the number
/// of lines written. The writer is flushed before returning.
pub fn write_report<W: Write + ?Sized>(table: &TrialTable, out: &mut W) -> io::Result<usize> {
    for iter in 0..table.iterations() {
        let latency_col = table.latency_ms.column(iter);
        let success_col = table.success.column(iter);
        let latencies = latency_col.iter().map(|latency| format!("{:.6}", latency));
        let flags = success_col
            .iter()
            .map(|&ok| if ok { "1" } else { "0" }.to_string());

        let line = latencies.chain(flags).collect::<Vec<_>>().join(",");
        writeln!(out, "{}", line)?;
    }
    out.flush()?;
    Ok(table.iterations())
}
