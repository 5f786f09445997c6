//! File exports for a finished run.

use crate::model::{Report, Sample};
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;

/// Write the report as pretty-printed JSON.
pub fn export_json(path: &Path, report: &Report) -> Result<()> {
    let data = serde_json::to_vec_pretty(report).context("serialize report")?;
    std::fs::write(path, data).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write one CSV row per sample: `timestamp,duration_ms,status`.
pub fn export_csv(path: &Path, samples: &[Sample]) -> Result<()> {
    std::fs::write(path, samples_csv(samples)?)
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn samples_csv(samples: &[Sample]) -> Result<String> {
    let mut out = String::from("timestamp,duration_ms,status\n");
    for s in samples {
        let ts = s
            .timestamp
            .format(&time::format_description::well_known::Rfc3339)
            .context("format sample timestamp")?;
        writeln!(out, "{},{:.3},{}", ts, s.duration_ms, s.status)?;
    }
    Ok(out)
}
