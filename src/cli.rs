use anyhow::{anyhow, Result};
use clap::ArgMatches;

#[derive(Debug, Clone)]
pub struct CliArgs {
    pub input_file: String,
    pub output_file: Option<String>,
    pub output_format: OutputFormat,
    pub config_file: Option<String>,
    pub settings_file: Option<String>,
    pub timeout_ms: Option<u64>,
    pub verbose_level: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl CliArgs {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let input_file = matches
            .get_one::<String>("input")
            .ok_or_else(|| anyhow!("Input file is required"))?
            .clone();

        let output_file = matches.get_one::<String>("output").cloned();
        let config_file = matches.get_one::<String>("config").cloned();
        let settings_file = matches.get_one::<String>("settings").cloned();
        let verbose_level = matches.get_count("verbose");

        let output_format = match matches.get_one::<String>("format").map(String::as_str) {
            Some("csv") | None => OutputFormat::Csv,
            Some("json") => OutputFormat::Json,
            Some(other) => return Err(anyhow!("Invalid output format '{}'", other)),
        };

        let timeout_ms = match matches.get_one::<String>("timeout") {
            Some(value) => Some(parse_millis(value)?),
            None => None,
        };

        Ok(CliArgs {
            input_file,
            output_file,
            output_format,
            config_file,
            settings_file,
            timeout_ms,
            verbose_level,
        })
    }
}

/// Parses a duration in milliseconds, e.g. "3000", "250ms" or "2s".
fn parse_millis(value: &str) -> Result<u64> {
    let value = value.trim().to_lowercase();
    let millis = if let Some(num) = value.strip_suffix("ms") {
        num.trim().parse::<f64>()?
    } else if let Some(num) = value.strip_suffix('s') {
        num.trim().parse::<f64>()? * 1000.0
    } else {
        value.parse::<f64>()?
    };

    if !millis.is_finite() || millis <= 0.0 {
        return Err(anyhow!("Timeout must be positive, got '{}'", value));
    }
    Ok(millis.round() as u64)
}
