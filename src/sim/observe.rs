//! Structured per-run records, delivered to an observer instead of printed.

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::IntegrationFailure;
use crate::math::ode::SolverStats;
use crate::model::{ModelKind, Parameters};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed {
        stats: SolverStats,
        max_conservation_error: f64,
        negative_excursions: usize,
    },
    Failed {
        t_reached: f64,
        reason: String,
    },
}

/// One record per single run or sweep entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub model: ModelKind,
    pub params: Parameters,
    /// Position in the sweep; `None` for a single run.
    pub sweep_index: Option<usize>,
    pub duration: Duration,
    #[serde(flatten)]
    pub outcome: RunOutcome,
}

impl RunRecord {
    pub fn failed(&self) -> bool {
        matches!(self.outcome, RunOutcome::Failed { .. })
    }

    pub(crate) fn failure(t_reached: f64, reason: &IntegrationFailure) -> RunOutcome {
        RunOutcome::Failed { t_reached, reason: reason.to_string() }
    }
}

pub trait RunObserver: Send + Sync {
    fn record(&self, record: &RunRecord);
}

impl<F> RunObserver for F
where
    F: Fn(&RunRecord) + Send + Sync,
{
    fn record(&self, record: &RunRecord) {
        self(record)
    }
}

/// Default observer: one `tracing` event per record.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl RunObserver for LogObserver {
    fn record(&self, r: &RunRecord) {
        let ms = r.duration.as_secs_f64() * 1000.0;
        match &r.outcome {
            RunOutcome::Completed { stats, max_conservation_error, negative_excursions } => {
                info!(
                    model = %r.model,
                    beta = r.params.beta,
                    gamma = r.params.gamma,
                    sweep_index = ?r.sweep_index,
                    duration_ms = ms,
                    steps = stats.accepted,
                    rejected = stats.rejected,
                    max_conservation_error,
                    "run completed"
                );
                if *negative_excursions > 0 {
                    warn!(
                        model = %r.model,
                        beta = r.params.beta,
                        negative_excursions,
                        "compartment values went negative"
                    );
                }
            }
            RunOutcome::Failed { t_reached, reason } => {
                warn!(
                    model = %r.model,
                    beta = r.params.beta,
                    gamma = r.params.gamma,
                    sweep_index = ?r.sweep_index,
                    duration_ms = ms,
                    t_reached,
                    reason = %reason,
                    "run failed"
                );
            }
        }
    }
}

/// Initialize logging with a default filter.
///
/// `RUST_LOG` overrides the default `info` filter; `RUST_LOG=episim=debug`
/// adds per-integration solver statistics.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();
}
