// This is the entry point for the exchange simulator CLI
use clap::Parser;
use exchange_chain::{
    Command, LogObserver, Opt, ReportFormat, Settings, Simulation, GLOBAL_SETTINGS,
};
use log::{error, LevelFilter};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Info by default; RUST_LOG still takes precedence
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt.command).await {
        error!("Error: {e}");
        process::exit(1);
    }
}

// An explicit --config wins over the file named by EXCHANGE_CONFIG
fn resolve_settings(config: Option<PathBuf>) -> exchange_chain::Result<Settings> {
    match config {
        Some(path) => Settings::load(Some(path.as_path())),
        None => Ok(GLOBAL_SETTINGS.clone()),
    }
}

async fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Simulate {
            config,
            investors,
            miners,
            seconds,
            seed,
            format,
        } => {
            let mut settings = resolve_settings(config)?;
            if let Some(investors) = investors {
                settings.simulation.investors = investors;
            }
            if let Some(miners) = miners {
                settings.simulation.miners = miners;
            }
            if let Some(seconds) = seconds {
                settings.simulation.duration_secs = seconds;
            }
            if seed.is_some() {
                settings.simulation.seed = seed;
            }

            let simulation = Simulation::new(settings, Arc::new(LogObserver));
            let report = simulation.run().await?;
            match format {
                ReportFormat::Text => print!("{report}"),
                ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
        Command::ShowConfig { config } => {
            let settings = resolve_settings(config)?;
            print!("{}", settings.to_toml()?);
        }
    }
    Ok(())
}
