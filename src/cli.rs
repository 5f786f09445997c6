use crate::engine::BenchEngine;
use crate::model::{InfoEvent, PacingConfig, RunConfig, RunOutcome, TestEvent};
use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::{
    cursor::MoveToColumn,
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};
use reqwest::Url;
use std::io::{IsTerminal, Write};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
    /// Redrawn in place on stderr until the next regular line.
    Progress(String),
}

/// Write one progress update. On a terminal the current line is redrawn in
/// place and left open; otherwise the update is a plain line. Returns whether
/// a line is left open.
fn write_progress<W: Write>(w: &mut W, msg: &str, redraw: bool) -> std::io::Result<bool> {
    if redraw {
        queue!(
            w,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(msg)
        )?;
    } else {
        writeln!(w, "{}", msg)?;
    }
    w.flush()?;
    Ok(redraw)
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());
        let mut progress_open = false;
        let redraw = stderr.is_terminal();

        while let Some(line) = rx.blocking_recv() {
            if progress_open && !matches!(line, OutputLine::Progress(_)) {
                let _ = writeln!(err);
                progress_open = false;
            }
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
                OutputLine::Progress(msg) => {
                    progress_open = write_progress(&mut err, &msg, redraw).unwrap_or(false);
                }
            }
        }

        if progress_open {
            let _ = writeln!(err);
        }
        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PacingMode {
    /// Sleep a fixed delay after every request
    Fixed,
    /// Limit the request rate with a token bucket
    TokenBucket,
    /// Issue the next request immediately
    None,
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "latency-bench",
    version,
    about = "Measure HTTP request latency against a single URL"
)]
pub struct Cli {
    /// Target URL (http or https)
    pub url: String,

    /// Number of requests to issue
    #[arg(short = 'n', long, default_value_t = 300, value_parser = clap::value_parser!(u32).range(1..))]
    pub iterations: u32,

    /// Pacing policy between requests
    #[arg(long, value_enum, default_value_t = PacingMode::Fixed)]
    pub pacing: PacingMode,

    /// Delay after each request when pacing is `fixed`
    #[arg(long, default_value = "10ms")]
    pub delay: humantime::Duration,

    /// Requests per second when pacing is `token-bucket`
    #[arg(long, default_value_t = 10.0)]
    pub rate: f64,

    /// Token bucket capacity when pacing is `token-bucket`
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub burst: u32,

    /// Per-request timeout
    #[arg(long, default_value = "30s")]
    pub timeout: humantime::Duration,

    /// Print the report as JSON on stdout instead of a table
    #[arg(long)]
    pub json: bool,

    /// Export the report as JSON
    #[arg(long)]
    pub export_json: Option<std::path::PathBuf>,

    /// Export every sample as CSV
    #[arg(long)]
    pub export_csv: Option<std::path::PathBuf>,

    /// Do not draw the progress indicator
    #[arg(long, short)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,
}

/// Build a validated `RunConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> Result<RunConfig> {
    let url = Url::parse(&args.url).with_context(|| format!("invalid URL: {}", args.url))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!(
            "unsupported URL scheme '{}': only http and https are supported",
            url.scheme()
        );
    }
    if url.host_str().is_none() {
        bail!("URL has no host: {}", args.url);
    }

    let pacing = match args.pacing {
        PacingMode::None => PacingConfig::None,
        PacingMode::Fixed => PacingConfig::Fixed {
            delay: Duration::from(args.delay),
        },
        PacingMode::TokenBucket => {
            if !args.rate.is_finite() || args.rate <= 0.0 {
                bail!("--rate must be a positive number, got {}", args.rate);
            }
            PacingConfig::TokenBucket {
                rate_per_sec: args.rate,
                burst: args.burst,
            }
        }
    };

    Ok(RunConfig {
        url: url.to_string(),
        iterations: args.iterations,
        pacing,
        timeout: Duration::from(args.timeout),
        user_agent: format!("latency-bench/{}", env!("CARGO_PKG_VERSION")),
    })
}

fn progress_line(completed: u32, total: u32) -> String {
    let pct = if total == 0 {
        100
    } else {
        (f64::from(completed) / f64::from(total) * 100.0).round() as u32
    };
    format!("Progress: {pct}% ({completed}/{total})")
}

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args)?;
    let engine = BenchEngine::new(cfg.clone())?;

    let (out_tx, out_handle) = spawn_output_writer();
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<TestEvent>();
    let handle = tokio::spawn(async move { engine.run(evt_tx).await });

    // Keep stdout clean for the JSON document.
    let info_line = |msg: String| {
        if args.json {
            OutputLine::Stderr(msg)
        } else {
            OutputLine::Stdout(msg)
        }
    };

    while let Some(ev) = evt_rx.recv().await {
        match ev {
            TestEvent::Progress { completed, total } => {
                if !args.quiet {
                    let _ = out_tx.send(OutputLine::Progress(progress_line(completed, total)));
                }
            }
            TestEvent::Info(InfoEvent::Finished) => {
                let _ = out_tx.send(info_line(String::new()));
                let _ = out_tx.send(info_line(InfoEvent::Finished.to_message()));
            }
            TestEvent::Info(info) => {
                let _ = out_tx.send(info_line(info.to_message()));
            }
        }
    }

    let run = handle
        .await
        .context("benchmark task failed")?
        .context("benchmark failed")?;

    let samples = run.samples.clone();
    let outcome = run.into_outcome(&cfg);

    // The report is printed before any export so a failed write never hides it.
    if args.json {
        let doc = match &outcome {
            RunOutcome::Completed(report) => serde_json::to_string_pretty(report)?,
            RunOutcome::NoData {
                failed_requests,
                errors,
            } => serde_json::to_string_pretty(&serde_json::json!({
                "total_requests": 0,
                "failed_requests": failed_requests,
                "errors": errors,
            }))?,
        };
        let _ = out_tx.send(OutputLine::Stdout(doc));
    } else {
        let summary = crate::text_summary::build_text_summary(&outcome);
        for line in summary.lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }

    let exported = handle_exports(&args, &samples, &outcome, &out_tx);

    drop(out_tx);
    let _ = out_handle.await;
    exported
}

/// Handle CSV and JSON exports. The JSON report is skipped without data.
fn handle_exports(
    args: &Cli,
    samples: &[crate::model::Sample],
    outcome: &RunOutcome,
    out_tx: &mpsc::UnboundedSender<OutputLine>,
) -> Result<()> {
    if let Some(p) = args.export_csv.as_deref() {
        crate::storage::export_csv(p, samples)?;
        let _ = out_tx.send(OutputLine::Stderr(format!("Exported CSV: {}", p.display())));
    }
    let Some(p) = args.export_json.as_deref() else {
        return Ok(());
    };
    match outcome {
        RunOutcome::Completed(report) => {
            crate::storage::export_json(p, report)?;
            let _ = out_tx.send(OutputLine::Stderr(format!("Exported JSON: {}", p.display())));
        }
        RunOutcome::NoData { .. } => {
            warn!(path = %p.display(), "no successful requests, skipping JSON export");
        }
    }
    Ok(())
}
