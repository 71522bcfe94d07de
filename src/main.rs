use clap::Parser;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use infraviz::config::Settings;
use infraviz::{config_loader, orchestrator};

/// Reachability topology builder for infrastructure-as-code plans
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the resource manifest (YAML or JSON)
    #[arg(short, long)]
    manifest: PathBuf,

    /// Output path for the topology element list
    #[arg(short, long, default_value = "topology.json")]
    output: PathBuf,

    /// Optional settings YAML file
    #[arg(short, long)]
    settings: Option<PathBuf>,
}

/// Default log filter when `RUST_LOG` is unset
fn log_filter(settings: &Settings) -> &str {
    settings.log_level.as_deref().unwrap_or("info")
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => config_loader::load_settings(path)?,
        None => Settings::default(),
    };

    // Logging starts once the settings are known
    env_logger::Builder::from_env(Env::default().default_filter_or(log_filter(&settings))).init();

    match &args.settings {
        Some(path) => info!("Settings file: {:?}", path),
        None => info!("No settings file given, using defaults"),
    }
    info!("Manifest: {:?}", args.manifest);
    info!("Output file: {:?}", args.output);

    let elements = orchestrator::convert_file(&args.manifest, &settings, &args.output)?;

    info!("Topology conversion completed successfully ({} elements)", elements);
    Ok(())
}
