use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Plan,
    Fetch,
    Read,
    Normalize,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Plan => "plan",
            Stage::Fetch => "fetch",
            Stage::Read => "read",
            Stage::Normalize => "normalize",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    UpToDate,
    NoData,
    UnrecognizedSchema,
}

/// Terminal state of one symbol (or file) within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolOutcome {
    Written { rows: u64 },
    Skipped(SkipReason),
    Failed { stage: Stage, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub symbol: String,
    pub stage: Stage,
    pub reason: String,
}

/// Aggregated outcomes of one job run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub job: String,
    pub total: usize,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
    pub rows_written: u64,
    pub failures: Vec<Failure>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new(job: &str) -> Self {
        Self {
            job: job.to_string(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, symbol: &str, outcome: SymbolOutcome) {
        self.total += 1;
        match outcome {
            SymbolOutcome::Written { rows } => {
                self.written += 1;
                self.rows_written += rows;
            }
            SymbolOutcome::Skipped(_) => self.skipped += 1,
            SymbolOutcome::Failed { stage, reason } => {
                self.failed += 1;
                self.failures.push(Failure {
                    symbol: symbol.to_string(),
                    stage,
                    reason,
                });
            }
        }
    }

    pub fn log_summary(&self) {
        info!(
            job = self.job.as_str(),
            total = self.total,
            written = self.written,
            skipped = self.skipped,
            failed = self.failed,
            rows_written = self.rows_written,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "Run completed: {}/{} written",
            self.written,
            self.total
        );
        for failure in &self.failures {
            warn!(
                job = self.job.as_str(),
                symbol = failure.symbol.as_str(),
                stage = %failure.stage,
                "Failed: {}",
                failure.reason
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_tallies_each_outcome() {
        let mut summary = RunSummary::new("collect-etf");
        summary.record("QQQ", SymbolOutcome::Written { rows: 10 });
        summary.record("SPY", SymbolOutcome::Skipped(SkipReason::UpToDate));
        summary.record(
            "GLD",
            SymbolOutcome::Failed {
                stage: Stage::Fetch,
                reason: "timeout".into(),
            },
        );
        summary.record("TLT", SymbolOutcome::Written { rows: 5 });

        assert_eq!(summary.total, 4);
        assert_eq!(summary.written, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.rows_written, 15);
        assert_eq!(
            summary.failures,
            vec![Failure {
                symbol: "GLD".into(),
                stage: Stage::Fetch,
                reason: "timeout".into()
            }]
        );
    }
}
