use std::fs::File;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use colored::*;
use log::info;
use serde::Serialize;

use crate::circuit::InstanceId;
use crate::cli::OutputFormat;
use crate::error::Skipped;
use crate::presentation::Overlay;
use crate::rules::{Coverage, DiagnosticVerdict};

/// Everything one finished session decided.
#[derive(Debug, Clone, Default)]
pub struct SessionReport {
    pub verdicts: Vec<DiagnosticVerdict>,
    /// Items of either view that were dimmed.
    pub dimmed: Vec<InstanceId>,
    pub skipped: Vec<Skipped>,
    pub elapsed: Duration,
}

#[derive(Serialize)]
struct SkippedRecord<'a> {
    instance: InstanceId,
    title: &'a str,
    reason: String,
}

#[derive(Serialize)]
struct ReportRecord<'a> {
    elapsed_ms: f64,
    verdicts: &'a [DiagnosticVerdict],
    dimmed: &'a [InstanceId],
    skipped: Vec<SkippedRecord<'a>>,
}

impl SessionReport {
    pub fn verdict(&self, instance: InstanceId) -> Option<&DiagnosticVerdict> {
        self.verdicts.iter().find(|v| v.instance == instance)
    }

    pub fn verdict_titled(&self, title: &str) -> Option<&DiagnosticVerdict> {
        self.verdicts.iter().find(|v| v.title == title)
    }

    /// Titles of the parts that burnt.
    pub fn smoking(&self) -> Vec<&str> {
        self.verdicts
            .iter()
            .filter(|v| v.has_smoke())
            .map(|v| v.title.as_str())
            .collect()
    }

    pub fn export<P: AsRef<Path>>(&self, path: P, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Csv => self.export_csv(path.as_ref()),
            OutputFormat::Json => self.export_json(path.as_ref()),
        }
    }

    fn export_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["instance", "title", "kind", "simulated", "smoke", "rotation", "display", "brightness"])?;

        for verdict in &self.verdicts {
            let rotation = verdict
                .overlays
                .iter()
                .find_map(|o| match o {
                    Overlay::RotateCw => Some("cw"),
                    Overlay::RotateCcw => Some("ccw"),
                    _ => None,
                })
                .unwrap_or("");
            writer.write_record([
                verdict.instance.0.to_string(),
                verdict.title.clone(),
                verdict.kind.map(|k| k.name()).unwrap_or("").to_string(),
                (verdict.coverage == Coverage::Simulated).to_string(),
                verdict.has_smoke().to_string(),
                rotation.to_string(),
                verdict.display().unwrap_or("").to_string(),
                verdict.brightness.map(|b| b.to_string()).unwrap_or_default(),
            ])?;
        }

        writer.flush()?;
        info!("Report exported to CSV: {}", path.display());
        Ok(())
    }

    fn export_json(&self, path: &Path) -> Result<()> {
        let record = ReportRecord {
            elapsed_ms: self.elapsed.as_secs_f64() * 1000.0,
            verdicts: &self.verdicts,
            dimmed: &self.dimmed,
            skipped: self
                .skipped
                .iter()
                .map(|s| SkippedRecord {
                    instance: s.instance,
                    title: &s.title,
                    reason: s.reason.to_string(),
                })
                .collect(),
        };
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, &record)?;
        info!("Report exported to JSON: {}", path.display());
        Ok(())
    }

    pub fn print_summary(&self) {
        println!("\n=== Diagnostics Summary ===");
        println!("Session time: {:.3}ms", self.elapsed.as_secs_f64() * 1000.0);

        let simulated: Vec<_> = self
            .verdicts
            .iter()
            .filter(|v| v.coverage == Coverage::Simulated)
            .collect();
        println!("Simulated parts: {}", simulated.len());

        for verdict in simulated {
            let kind = verdict.kind.map(|k| k.name()).unwrap_or("-");
            let mut line = format!("  {:<16} {:<14}", verdict.title, kind);
            if verdict.has_smoke() {
                line.push_str(&format!(" {}", "SMOKE".red().bold()));
            }
            for overlay in &verdict.overlays {
                match overlay {
                    Overlay::RotateCw => line.push_str(&format!(" {}", "rotating cw".cyan())),
                    Overlay::RotateCcw => line.push_str(&format!(" {}", "rotating ccw".cyan())),
                    Overlay::Display(text) => line.push_str(&format!(" [{}]", text.yellow())),
                    Overlay::Smoke => {}
                }
            }
            if let Some(brightness) = verdict.brightness {
                line.push_str(&format!(" brightness {:.0}%", brightness.max(0.0) * 100.0));
            }
            if verdict.overlays.is_empty() && verdict.brightness.is_none() {
                line.push_str(&format!(" {}", "ok".green()));
            }
            println!("{}", line);
        }

        if !self.dimmed.is_empty() {
            println!("\nNot simulated (dimmed): {}", self.dimmed.len());
        }

        if !self.skipped.is_empty() {
            println!("\nSkipped:");
            for skipped in &self.skipped {
                println!("  {}: {}", skipped.title, skipped.reason.to_string().bright_black());
            }
        }
    }
}
