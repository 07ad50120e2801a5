//! CSV artifacts for trajectories and sweeps.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::ReportError;
use crate::sim::{FractionalTrajectory, SweepResults};

/// File name for one sweep entry: `graph<beta>.csv`, with `beta` written
/// as its shortest round-trip text (`graph0.0.csv`, `graph0.06.csv`).
pub fn sweep_artifact_name(beta: f64) -> String {
    format!("graph{:?}.csv", beta)
}

/// Write `t` plus one column per compartment (fraction of `N`).
pub fn write_trajectory_csv(path: impl AsRef<Path>, traj: &FractionalTrajectory) -> Result<(), ReportError> {
    if traj.time.is_empty() {
        return Err(ReportError::Empty("trajectory has no samples"));
    }
    let path = path.as_ref();
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["t".to_string()];
    header.extend(traj.series.iter().map(|s| s.compartment.label().to_lowercase()));
    wtr.write_record(&header)?;

    for (k, t) in traj.time.iter().enumerate() {
        let mut row = Vec::with_capacity(traj.series.len() + 1);
        row.push(format!("{:.6}", t));
        row.extend(traj.series.iter().map(|s| format!("{:.9}", s.values[k])));
        wtr.write_record(&row)?;
    }

    wtr.flush().map_err(|source| ReportError::Io { path: path.to_path_buf(), source })?;
    Ok(())
}

/// What happened to each sweep entry on disk.
#[derive(Debug, Default)]
pub struct SweepArtifacts {
    pub written: Vec<(f64, PathBuf)>,
    /// Entries whose integration failed; nothing to write.
    pub skipped: Vec<f64>,
    /// Entries whose file could not be written. Their trajectories are
    /// still in the [`SweepResults`].
    pub failed: Vec<(f64, ReportError)>,
}

pub fn write_sweep_artifacts(out_dir: impl AsRef<Path>, results: &SweepResults) -> Result<SweepArtifacts, ReportError> {
    let out_dir = out_dir.as_ref();
    std::fs::create_dir_all(out_dir).map_err(|source| ReportError::Io { path: out_dir.to_path_buf(), source })?;

    let mut out = SweepArtifacts::default();
    for entry in &results.entries {
        let traj = match &entry.outcome {
            Ok(traj) => traj,
            Err(e) => {
                warn!(beta = entry.beta, error = %e, "no artifact for failed sweep entry");
                out.skipped.push(entry.beta);
                continue;
            }
        };
        let path = out_dir.join(sweep_artifact_name(entry.beta));
        match write_trajectory_csv(&path, &traj.fractions()) {
            Ok(()) => {
                info!(beta = entry.beta, path = %path.display(), "wrote sweep artifact");
                out.written.push((entry.beta, path));
            }
            Err(e) => {
                warn!(beta = entry.beta, path = %path.display(), error = %e, "writing sweep artifact failed");
                out.failed.push((entry.beta, e));
            }
        }
    }
    Ok(out)
}
