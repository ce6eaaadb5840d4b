//! Grid monitor entry point: CLI wiring, forecast, and balancing runs.

use std::path::Path;
use std::process;

use grid_monitor::balance::{LoadBalancer, Scenario};
use grid_monitor::config::MonitorConfig;
use grid_monitor::forecast::{DemandForecaster, ForestParams};
use grid_monitor::io::{export_actions_csv, export_forecast_csv};
use grid_monitor::source::{GridDataSource, SyntheticFeed};
use grid_monitor::summary::{GridSummary, detect_faults};

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<String>,
    preset: Option<String>,
    horizon_override: Option<usize>,
    history_override: Option<usize>,
    scenario_override: Option<String>,
    regions_override: Option<Vec<String>>,
    seed_override: Option<u64>,
    forecast_out: Option<String>,
    actions_out: Option<String>,
    json: bool,
}

fn print_help() {
    eprintln!("grid-monitor — power grid demand forecasting and load-balancing demo");
    eprintln!();
    eprintln!("Usage: grid-monitor [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>       Load configuration from TOML file");
    eprintln!("  --preset <name>       Use a built-in preset (baseline)");
    eprintln!("  --horizon <days>      Override forecast horizon");
    eprintln!("  --history <days>      Override days of history to use");
    eprintln!("  --scenario <name>     Override balancing scenario");
    eprintln!("  --regions <a,b,c>     Limit balancing to these regions");
    eprintln!("  --seed <u64>          Seed the balancing RNG for reproducible runs");
    eprintln!("  --forecast-out <path> Export the forecast series to CSV");
    eprintln!("  --actions-out <path>  Export balancing actions to CSV");
    eprintln!("  --json                Print one JSON document instead of text");
    eprintln!("  --help                Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the baseline preset is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        preset: None,
        horizon_override: None,
        history_override: None,
        scenario_override: None,
        regions_override: None,
        seed_override: None,
        forecast_out: None,
        actions_out: None,
        json: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --config requires a path argument");
                    process::exit(1);
                }
                cli.config_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--horizon" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --horizon requires a day count");
                    process::exit(1);
                }
                if let Ok(d) = args[i].parse::<usize>() {
                    cli.horizon_override = Some(d);
                } else {
                    eprintln!("error: --horizon value \"{}\" is not a valid count", args[i]);
                    process::exit(1);
                }
            }
            "--history" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --history requires a day count");
                    process::exit(1);
                }
                if let Ok(d) = args[i].parse::<usize>() {
                    cli.history_override = Some(d);
                } else {
                    eprintln!("error: --history value \"{}\" is not a valid count", args[i]);
                    process::exit(1);
                }
            }
            "--scenario" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --scenario requires a name argument");
                    process::exit(1);
                }
                cli.scenario_override = Some(args[i].clone());
            }
            "--regions" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --regions requires a comma-separated list");
                    process::exit(1);
                }
                cli.regions_override = Some(
                    args[i]
                        .split(',')
                        .map(str::trim)
                        .filter(|r| !r.is_empty())
                        .map(str::to_string)
                        .collect(),
                );
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --seed requires a u64 argument");
                    process::exit(1);
                }
                if let Ok(s) = args[i].parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{}\" is not a valid u64", args[i]);
                    process::exit(1);
                }
            }
            "--forecast-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --forecast-out requires a path argument");
                    process::exit(1);
                }
                cli.forecast_out = Some(args[i].clone());
            }
            "--actions-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --actions-out requires a path argument");
                    process::exit(1);
                }
                cli.actions_out = Some(args[i].clone());
            }
            "--json" => {
                cli.json = true;
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();

    // Load config: --config takes priority, then --preset, then baseline.
    let mut config = if let Some(ref path) = cli.config_path {
        match MonitorConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match MonitorConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        MonitorConfig::baseline()
    };

    // CLI overrides beat both file and preset.
    if let Some(days) = cli.horizon_override {
        config.forecast.horizon_days = days;
    }
    if let Some(days) = cli.history_override {
        config.source.history_days = days;
    }
    if let Some(ref scenario) = cli.scenario_override {
        config.balancing.scenario = scenario.clone();
    }
    if let Some(ref regions) = cli.regions_override {
        config.balancing.regions = regions.clone();
    }
    if let Some(seed) = cli.seed_override {
        config.balancing.seed = Some(seed);
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let feed = SyntheticFeed::new(config.source.base_demand_mw);
    let history = feed.historical_series(config.source.history_days);
    let snapshot = feed.regional_snapshot();

    let summary = GridSummary::from_snapshot(&snapshot);
    let faults = detect_faults(&snapshot);

    let mut forecaster = DemandForecaster::with_params(ForestParams {
        trees: config.forecast.trees,
        max_depth: config.forecast.max_depth,
        seed: config.forecast.seed,
    });
    let training = forecaster.train(&history);
    let forecast = forecaster.forecast_demand(&history, config.forecast.horizon_days);

    let mut balancer = match config.balancing.seed {
        Some(seed) => LoadBalancer::from_seed(seed),
        None => LoadBalancer::new(),
    };
    let scenario = Scenario::from_name(&config.balancing.scenario);
    let balancing = balancer.simulate(&snapshot, scenario, &config.balancing.regions);

    if cli.json {
        let document = serde_json::json!({
            "summary": summary,
            "faults": faults,
            "training": training.as_ref().ok(),
            "forecast": forecast,
            "balancing": match &balancing {
                Ok(result) => serde_json::json!(result),
                Err(e) => serde_json::json!({ "error": e }),
            },
        });
        match serde_json::to_string_pretty(&document) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("error: failed to serialize output: {e}");
                process::exit(1);
            }
        }
    } else {
        println!("{summary}");
        println!();
        if faults.is_empty() {
            println!("No grid faults detected.");
        } else {
            println!("--- Grid Faults ---");
            for fault in &faults {
                println!("{fault}");
            }
        }
        println!();

        match &training {
            Ok(report) => println!("{report}"),
            Err(e) => eprintln!("warning: {e}; forecast uses the fallback series"),
        }
        println!();
        println!("--- Demand Forecast ---");
        for point in &forecast {
            println!(
                "{}  {:>12.2} MW  [{:.2}, {:.2}]",
                point.date, point.predicted_demand, point.lower_bound, point.upper_bound
            );
        }
        println!();

        match &balancing {
            Ok(result) => println!("{result}"),
            Err(e) => eprintln!("{e}"),
        }
    }

    if let Some(ref path) = cli.forecast_out {
        if let Err(e) = export_forecast_csv(&forecast, Path::new(path)) {
            eprintln!("error: failed to write forecast CSV: {e}");
            process::exit(1);
        }
        eprintln!("Forecast written to {path}");
    }
    if let Some(ref path) = cli.actions_out {
        let actions = balancing.as_ref().map(|r| r.actions.as_slice()).unwrap_or(&[]);
        if let Err(e) = export_actions_csv(actions, Path::new(path)) {
            eprintln!("error: failed to write actions CSV: {e}");
            process::exit(1);
        }
        eprintln!("Actions written to {path}");
    }

    if balancing.is_err() {
        process::exit(1);
    }
}
