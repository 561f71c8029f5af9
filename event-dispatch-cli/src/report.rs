//! Report generation
//!
//! Renders scenario results as an aligned text table or as JSON.

use crate::churn::ScenarioReport;
use crate::config::OutputFormat;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Everything produced by one CLI run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub library_version: String,
    pub scenarios: Vec<ScenarioReport>,
}

impl RunReport {
    pub fn new(scenarios: Vec<ScenarioReport>) -> Self {
        Self {
            generated_at: Utc::now(),
            library_version: event_dispatch::VERSION.to_string(),
            scenarios,
        }
    }

    pub fn all_consistent(&self) -> bool {
        self.scenarios.iter().all(ScenarioReport::is_consistent)
    }
}

pub fn render(report: &RunReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Txt => Ok(render_txt(report)),
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).context("Failed to serialize report")
        }
    }
}

fn render_txt(report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Event Dispatch Churn Report");
    let _ = writeln!(
        out,
        "Generated {} (library v{})",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.library_version
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<16} {:>7} {:>10} {:>12} {:>8} {:>9} {:>6} {:>8} {:>10}  {}",
        "SCENARIO", "ROUNDS", "SUBSCRIBED", "DELIVERED", "PEAK", "CAPACITY", "GROWS", "COMPACTS", "MS", "STATUS"
    );
    for s in &report.scenarios {
        let _ = writeln!(
            out,
            "{:<16} {:>7} {:>10} {:>12} {:>8} {:>9} {:>6} {:>8} {:>10.2}  {}",
            s.name,
            s.rounds,
            s.subscriptions,
            s.delivered,
            s.peak_live,
            s.final_stats.capacity,
            s.final_stats.grow_count,
            s.final_stats.compact_count,
            s.elapsed_ms,
            if s.is_consistent() { "ok" } else { "MISMATCH" }
        );
    }
    for s in &report.scenarios {
        let history: Vec<String> = s.capacity_history.iter().map(|c| c.to_string()).collect();
        let _ = writeln!(out, "\n{} capacity: {}", s.name, history.join(" -> "));
    }
    out
}

/// Write the rendered report to `path`, or stdout when absent
pub fn write_report(rendered: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
            log::info!("Report written to {:?}", path);
        }
        None => println!("{}", rendered),
    }
    Ok(())
}
