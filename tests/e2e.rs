mod support;

use support::{closed_port_url, run_bench, spawn_http_server};

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn e2e_text_report() {
    let (url, _server) = spawn_http_server("200 OK");
    let output = run_bench([url.as_str(), "-n", "5", "--pacing", "none", "-q"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains(&format!("Starting benchmark for {url}")), "{out}");
    assert!(out.contains("Running 5 iterations..."), "{out}");
    assert!(out.contains("Benchmark complete!"), "{out}");
    assert!(out.contains("Results:"), "{out}");

    let row = |label: &str| {
        out.lines()
            .find(|l| l.contains(label))
            .unwrap_or_else(|| panic!("missing row {label} in {out}"))
            .to_string()
    };
    assert!(row("Total Requests").trim_end().ends_with("5 |"));
    assert!(row("Failed Requests").trim_end().ends_with("0 |"));
    row("99th Percentile (ms)");
    assert!(out.contains("  200: 5"), "{out}");
    assert!(!out.contains("Errors encountered:"), "{out}");
}

#[test]
fn e2e_error_status_counts_as_sample() {
    let (url, _server) = spawn_http_server("500 Internal Server Error");
    let output = run_bench([url.as_str(), "-n", "3", "--pacing", "none", "--json"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let v: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("json report");
    assert_eq!(v["total_requests"], 3);
    assert_eq!(v["failed_requests"], 0);
    assert_eq!(v["status_codes"]["500"], 3);
    assert!(v["latency"]["min_ms"].as_f64().unwrap() <= v["latency"]["max_ms"].as_f64().unwrap());
}

#[test]
fn e2e_no_successful_requests_exits_cleanly() {
    let url = closed_port_url();
    let output = run_bench([url.as_str(), "-n", "3", "--delay", "1ms", "--timeout", "2s"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("No successful requests. Exiting..."), "{out}");
    assert!(!out.contains("Results:"), "{out}");
}

#[test]
fn e2e_exports_written() {
    let (url, _server) = spawn_http_server("200 OK");
    let dir = tempfile::tempdir().expect("tempdir");
    let json = dir.path().join("report.json");
    let csv = dir.path().join("samples.csv");

    let output = run_bench([
        url.as_str(),
        "-n",
        "4",
        "--pacing",
        "token-bucket",
        "--rate",
        "100",
        "-q",
        "--export-json",
        json.to_str().unwrap(),
        "--export-csv",
        csv.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json).expect("read json")).unwrap();
    assert_eq!(report["total_requests"], 4);
    assert_eq!(report["config"]["pacing"]["kind"], "token_bucket");

    let rows = std::fs::read_to_string(&csv).expect("read csv");
    assert_eq!(rows.lines().count(), 5);
    assert!(rows.starts_with("timestamp,duration_ms,status\n"));
}

#[test]
fn e2e_missing_url_prints_usage() {
    let output = run_bench(Vec::<String>::new());
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Usage"), "{}", stderr(&output));
}

#[test]
fn e2e_invalid_url_fails_fast() {
    let output = run_bench(["ftp://example.com/file"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("unsupported URL scheme"), "{}", stderr(&output));
}

#[test]
fn e2e_failed_export_still_prints_report() {
    let (url, _server) = spawn_http_server("200 OK");
    let dir = tempfile::tempdir().expect("tempdir");
    let csv = dir.path().join("missing").join("samples.csv");

    let output = run_bench([
        url.as_str(),
        "-n",
        "2",
        "--pacing",
        "none",
        "-q",
        "--export-csv",
        csv.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Results:"), "{out}");
    assert!(out.contains("99th Percentile (ms)"), "{out}");
}

#[test]
fn e2e_redirected_progress_has_no_cursor_escapes() {
    let (url, _server) = spawn_http_server("200 OK");
    let output = run_bench([url.as_str(), "-n", "3", "--pacing", "none"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let err = stderr(&output);
    assert!(err.contains("Progress: 100% (3/3)\n"), "{err:?}");
    assert!(!err.contains('\x1b'), "{err:?}");
}
