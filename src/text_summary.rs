//! Text summary builder for CLI output.
//!
//! Formats a finished run as human-readable lines: the metric table, the
//! status code breakdown and the numbered error listing.

use crate::model::{Report, RunOutcome};

const RULE_WIDTH: usize = 50;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary for either outcome of a run.
pub(crate) fn build_text_summary(outcome: &RunOutcome) -> TextSummary {
    match outcome {
        RunOutcome::NoData { .. } => TextSummary {
            lines: vec!["No successful requests. Exiting...".to_string()],
        },
        RunOutcome::Completed(report) => build_report_summary(report),
    }
}

fn build_report_summary(report: &Report) -> TextSummary {
    let mut lines = Vec::new();
    let lat = &report.latency;

    let rows = [
        ("Total Requests", report.total_requests.to_string()),
        ("Failed Requests", report.failed_requests.to_string()),
        ("Average Latency (ms)", format_ms(lat.mean_ms)),
        ("Median Latency (ms)", format_ms(lat.median_ms)),
        ("Min Latency (ms)", format_ms(lat.min_ms)),
        ("Max Latency (ms)", format_ms(lat.max_ms)),
        ("95th Percentile (ms)", format_ms(lat.p95_ms)),
        ("99th Percentile (ms)", format_ms(lat.p99_ms)),
    ];

    lines.push(String::new());
    lines.push("Results:".to_string());
    lines.push("-".repeat(RULE_WIDTH));
    lines.extend(render_table(("Metric", "Value"), &rows));

    if !report.status_codes.is_empty() {
        lines.push(String::new());
        lines.push("Status codes:".to_string());
        for (status, count) in &report.status_codes {
            lines.push(format!("  {status}: {count}"));
        }
    }

    if !report.errors.is_empty() {
        lines.push(String::new());
        lines.push("Errors encountered:".to_string());
        for (i, message) in report.errors.iter().enumerate() {
            lines.push(format!("Error {}: {}", i + 1, message));
        }
    }

    TextSummary { lines }
}

/// Round to two decimals, dropping trailing zeros (`12.50` prints as `12.5`).
fn format_ms(ms: f64) -> String {
    let s = format!("{ms:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn render_table(header: (&str, &str), rows: &[(&str, String)]) -> Vec<String> {
    let key_w = rows
        .iter()
        .map(|(k, _)| k.len())
        .chain(std::iter::once(header.0.len()))
        .max()
        .unwrap_or(0);
    let val_w = rows
        .iter()
        .map(|(_, v)| v.len())
        .chain(std::iter::once(header.1.len()))
        .max()
        .unwrap_or(0);

    let border = format!("+-{}-+-{}-+", "-".repeat(key_w), "-".repeat(val_w));
    let mut out = vec![
        border.clone(),
        format!("| {:<key_w$} | {:<val_w$} |", header.0, header.1),
        border.clone(),
    ];
    for (k, v) in rows {
        out.push(format!("| {:<key_w$} | {:>val_w$} |", k, v));
    }
    out.push(border);
    out
}
