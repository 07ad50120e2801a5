use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ReportError;
use crate::sim::Trajectory;

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ReportError + '_ {
    move |source| ReportError::Io { path: path.to_path_buf(), source }
}

/// Plain-text log of one run: `key=value` header, blank line, then
/// `t,<compartments>,total` rows with absolute counts.
pub fn write_run_log(out_dir: impl AsRef<Path>, run_id: &str, traj: &Trajectory) -> Result<PathBuf, ReportError> {
    if traj.is_empty() {
        return Err(ReportError::Empty("trajectory has no samples"));
    }

    let out_dir = out_dir.as_ref();
    std::fs::create_dir_all(out_dir).map_err(io_err(out_dir))?;
    let path = out_dir.join(format!("run_{}.txt", run_id));
    let mut f = std::fs::File::create(&path).map_err(io_err(&path))?;
    render_run_log(&mut f, run_id, traj).map_err(io_err(&path))?;
    Ok(path)
}

pub fn render_run_log(mut w: impl Write, run_id: &str, traj: &Trajectory) -> std::io::Result<()> {
    let p = &traj.params;
    writeln!(w, "run_id={}", run_id)?;
    writeln!(w, "model={}", traj.kind)?;
    writeln!(w, "population={:.6}", traj.population)?;
    writeln!(w, "beta={:.6}", p.beta)?;
    writeln!(w, "gamma={:.6}", p.gamma)?;
    writeln!(w, "xi={:.6}", p.xi)?;
    writeln!(w, "birth_rate={:.6}", p.birth_rate)?;
    writeln!(w, "death_rate={:.6}", p.death_rate)?;
    writeln!(w, "samples={}", traj.len())?;
    writeln!(w)?;

    let columns: Vec<&str> = traj.compartments().iter().map(|c| c.column()).collect();
    writeln!(w, "t,{},total", columns.join(","))?;

    for (t, y) in traj.time.iter().zip(&traj.states) {
        write!(w, "{:.6}", t)?;
        for v in y {
            write!(w, ",{:.6}", v)?;
        }
        writeln!(w, ",{:.6}", y.iter().sum::<f64>())?;
    }
    Ok(())
}
