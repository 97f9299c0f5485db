use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::circuit::ViewId;
use crate::rules::DEFAULT_BATTERY_SAFETY_MARGIN;

/// Case-insensitive markers looked for in the engine logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogHeuristics {
    /// Markers in stdout that mean the circuit did not load.
    pub load_stdout: Vec<String>,
    /// Markers in stderr that mean the circuit did not load.
    pub load_stderr: Vec<String>,
    /// Markers in stderr that mean the run failed.
    pub fatal_stderr: Vec<String>,
}

impl Default for LogHeuristics {
    fn default() -> Self {
        LogHeuristics {
            load_stdout: vec!["error".to_string()],
            load_stderr: vec!["warning".to_string()],
            fatal_stderr: vec!["there aren't any circuits loaded".to_string()],
        }
    }
}

fn contains_any(log: &str, markers: &[String]) -> bool {
    let log = log.to_lowercase();
    markers
        .iter()
        .any(|marker| !marker.is_empty() && log.contains(&marker.to_lowercase()))
}

impl LogHeuristics {
    pub fn load_failed(&self, stdout: &str, stderr: &str) -> bool {
        contains_any(stdout, &self.load_stdout) || contains_any(stderr, &self.load_stderr)
    }

    pub fn fatal(&self, stderr: &str) -> bool {
        contains_any(stderr, &self.fatal_stderr)
    }
}

/// Tunables of the simulation orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub enabled_at_startup: bool,
    pub debounce_ms: u64,
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub netlist_label: String,
    /// The view whose netlist is simulated.
    pub netlist_view: ViewId,
    pub battery_safety_margin: f64,
    pub heuristics: LogHeuristics,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            enabled_at_startup: false,
            debounce_ms: 200,
            timeout_ms: 3000,
            poll_interval_ms: 1,
            netlist_label: "Simulator Netlist".to_string(),
            netlist_view: ViewId::Schematic,
            battery_safety_margin: DEFAULT_BATTERY_SAFETY_MARGIN,
            heuristics: LogHeuristics::default(),
        }
    }
}

impl SimulatorConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Applies the persisted on/off switch.
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.enabled_at_startup = settings.simulator_enabled;
        self
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

/// User settings that survive restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub simulator_enabled: bool,
}

impl Settings {
    /// Reads settings from `path`. A missing file gives the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("no settings at {}, using defaults", path.display());
            return Ok(Settings::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading settings {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing settings {}", path.display()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).with_context(|| format!("writing settings {}", path.display()))
    }
}
