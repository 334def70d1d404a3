//! Report output
//!
//! CSV tables and a JSON summary of a benchmark run.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::runner::{BenchResults, ModeOutcome};
use super::stats::LatencySummary;

/// Per-mode summary row
#[derive(Debug, Clone, Serialize)]
pub struct ModeSummary {
    pub mode: String,
    pub write: LatencySummary,
    pub restore: LatencySummary,
    pub bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restore_consistent: Option<bool>,
}

impl From<&ModeOutcome> for ModeSummary {
    fn from(outcome: &ModeOutcome) -> Self {
        Self {
            mode: outcome.mode.to_string(),
            write: outcome.write_latency(),
            restore: outcome.restore_latency(),
            bytes: outcome.size.bytes,
            restore_consistent: outcome.restore_consistent,
        }
    }
}

/// Format with at most five decimals, trailing zeros trimmed
pub fn format_double(value: f64) -> String {
    let formatted = format!("{value:.5}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" | "-" | "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

fn to_csv(header: &[&str], rows: impl IntoIterator<Item = Vec<String>>) -> String {
    let mut out = header.join(",");
    out.push('\n');
    for row in rows {
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Render the summary table
pub fn summary_csv(results: &BenchResults) -> String {
    to_csv(
        &[
            "mode",
            "write_p50",
            "write_p95",
            "write_p99",
            "restore_p50",
            "restore_p95",
            "restore_p99",
            "bytes",
        ],
        results.modes.iter().map(ModeSummary::from).map(|s| {
            vec![
                s.mode,
                format_double(s.write.p50),
                format_double(s.write.p95),
                format_double(s.write.p99),
                format_double(s.restore.p50),
                format_double(s.restore.p95),
                format_double(s.restore.p99),
                s.bytes.to_string(),
            ]
        }),
    )
}

/// Write all report files into `out_dir`, returning their paths
pub async fn write_reports(results: &BenchResults, out_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let writes = to_csv(
        &["mode", "session_index", "write_ms"],
        results.writes().map(|r| {
            vec![
                r.mode.to_string(),
                r.session_index.to_string(),
                format_double(r.write_ms),
            ]
        }),
    );

    let restores = to_csv(
        &["mode", "N", "restore_ms"],
        results
            .restores()
            .map(|r| vec![r.mode.to_string(), r.n.to_string(), format_double(r.restore_ms)]),
    );

    let sizes = to_csv(
        &["mode", "sessions", "bytes"],
        results
            .sizes()
            .map(|r| vec![r.mode.to_string(), r.sessions.to_string(), r.bytes.to_string()]),
    );

    let summaries: Vec<ModeSummary> = results.modes.iter().map(ModeSummary::from).collect();
    let summary_json = serde_json::to_string_pretty(&summaries)?;

    let files = [
        ("write_times.csv", writes),
        ("restore_times.csv", restores),
        ("sizes.csv", sizes),
        ("summary.csv", summary_csv(results)),
        ("summary.json", summary_json),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (name, contents) in files {
        let path = out_dir.join(name);
        tokio::fs::write(&path, contents).await?;
        tracing::debug!("Wrote {}", path.display());
        written.push(path);
    }

    Ok(written)
}
