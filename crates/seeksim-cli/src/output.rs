//! Report rendering for the command line.

use anyhow::Result;
use clap::ValueEnum;
use seeksim_engine::SimReport;
use serde::Serialize;
use std::io::Write;

/// Output format of `seeksim run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The full report as pretty-printed JSON.
    Json,
    /// One row per sampled completion.
    Csv,
}

#[derive(Serialize)]
struct SampleRow {
    index: usize,
    tick: u64,
    track: u32,
    latency: Option<u64>,
}

/// Writes `report` to `out` in the requested format.
pub fn write_report<W: Write>(report: &SimReport, format: OutputFormat, out: &mut W) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(&mut *out);
            for (index, sample) in report.head_trace.iter().enumerate() {
                wtr.serialize(SampleRow {
                    index,
                    tick: sample.tick,
                    track: sample.track,
                    latency: report.latencies.get(index).copied(),
                })?;
            }
            wtr.flush()?;
        }
    }
    Ok(())
}

/// Column header matching [`summary_line`].
pub fn summary_header() -> String {
    format!(
        "{:<16} {:>9} {:>12} {:>10} {:>6} {:>6} {:>6} {:>8}",
        "policy", "completed", "ticks", "mean", "p50", "p95", "max", "probes"
    )
}

/// One aligned line summarizing a run.
pub fn summary_line(report: &SimReport) -> String {
    format!(
        "{:<16} {:>9} {:>12} {:>10.2} {:>6} {:>6} {:>6} {:>8}",
        report.policy.name(),
        report.completed,
        report.total_ticks,
        report.summary.mean,
        report.summary.p50,
        report.summary.p95,
        report.summary.max,
        report.policy_stats.wrap_probes
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use seeksim_engine::{HeadSample, LatencySummary, PolicyKind, PolicyStats};

    fn report() -> SimReport {
        SimReport {
            policy: PolicyKind::CircularScan,
            max_requests_per_second: 20,
            seed: 2,
            completed: 3,
            total_ticks: 120,
            head_trace: vec![
                HeadSample { tick: 30, track: 2 },
                HeadSample { tick: 70, track: 5 },
            ],
            latencies: vec![29, 40],
            summary: LatencySummary::from_latencies(&[29, 40, 51]),
            policy_stats: PolicyStats {
                wrap_probes: 1,
                ..Default::default()
            },
            workloads: Vec::new(),
        }
    }

    #[test]
    fn test_csv_rows() {
        let mut buf = Vec::new();
        write_report(&report(), OutputFormat::Csv, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["index,tick,track,latency", "0,30,2,29", "1,70,5,40"]);
    }

    #[test]
    fn test_json_report() {
        let mut buf = Vec::new();
        write_report(&report(), OutputFormat::Json, &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["policy"], "cscan");
        assert_eq!(value["latencies"], serde_json::json!([29, 40]));
        assert_eq!(value["head_trace"][1]["track"], 5);
    }

    #[test]
    fn test_summary_line_columns() {
        let line = summary_line(&report());
        assert!(line.starts_with("cscan"));
        assert!(line.contains("40.00"));
        assert!(line.trim_end().ends_with('1'));
        assert_eq!(line.len(), summary_header().len());
    }
}
