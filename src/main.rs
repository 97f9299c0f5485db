use clap::{Arg, Command};
use colored::*;
use log::{error, info, warn};
use std::path::Path;

use livesim::cli::CliArgs;
use livesim::config::{Settings, SimulatorConfig};
use livesim::engine::ReplayEngine;
use livesim::presentation::RecordingSurface;
use livesim::scenario::Scenario;
use livesim::Simulator;

fn main() {
    let matches = create_cli().get_matches();

    let args = match CliArgs::from_matches(&matches) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", format!("Error: {:#}", e).red());
            std::process::exit(2);
        }
    };

    let default_level = match args.verbose_level {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if let Err(e) = run_application(args) {
        error!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

fn create_cli() -> Command {
    Command::new("livesim")
        .version(livesim::VERSION)
        .about("Live circuit diagnostics over recorded SPICE results")
        .arg(
            Arg::new("input")
                .help("Scenario file (.json) with the circuit and the solver output")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Output file for the diagnostics report"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .default_value("csv")
                .value_parser(["csv", "json"])
                .help("Output format"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("MS")
                .help("How long to wait for the engine"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Simulator configuration (.json)"),
        )
        .arg(
            Arg::new("settings")
                .short('s')
                .long("settings")
                .value_name("FILE")
                .help("Persisted settings (.json); its switch decides whether the simulator is enabled"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("Increase verbosity level"),
        )
}

fn run_application(args: CliArgs) -> anyhow::Result<()> {
    info!("{}", "Starting livesim".green().bold());
    info!("Scenario: {}", args.input_file.bright_blue());

    if !Path::new(&args.input_file).exists() {
        return Err(anyhow::anyhow!("Scenario file '{}' not found", args.input_file));
    }

    let mut config = match &args.config_file {
        Some(path) => SimulatorConfig::from_file(path)?,
        None => SimulatorConfig::default(),
    };
    if let Some(timeout_ms) = args.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    config = match &args.settings_file {
        Some(path) => config.with_settings(&Settings::load(path)?),
        None => config.with_settings(&Settings {
            simulator_enabled: true,
        }),
    };

    let scenario = Scenario::from_file(&args.input_file)?;
    config.netlist_view = scenario.view;
    let engine = ReplayEngine::new(scenario.engine.clone());

    let mut simulator = Simulator::new(engine, scenario, RecordingSurface::default(), config);
    let report = match simulator.start_simulation() {
        Ok(Some(report)) => report,
        Ok(None) => return Err(anyhow::anyhow!("Simulator is disabled in the settings")),
        Err(e) => {
            for message in simulator.surface().errors() {
                warn!("{}", message);
            }
            return Err(e.into());
        }
    };

    if let Some(output_file) = args.output_file {
        report.export(&output_file, args.output_format)?;
        info!("Report exported to: {}", output_file.bright_green());
    } else {
        report.print_summary();
    }

    info!("{}", "Diagnostics completed".green().bold());
    Ok(())
}
