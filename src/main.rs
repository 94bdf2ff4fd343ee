use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tripkml::convert::{ConvertOptions, convert_document, derive_base_name};
use tripkml::extract::ExtractOptions;
use tripkml::kml::RenderOptions;
use tripkml::{TripKmlConfig, TripKmlError};

/// Convert a saved itinerary web page into KML placemark files
#[derive(Parser, Debug)]
#[command(name = "tripkml", version, about)]
struct Cli {
    /// Saved HTML page of the trip
    input: PathBuf,

    /// Write one KML file per date plus one for undated places
    #[arg(long)]
    split: bool,

    /// Base name for the output files (default: input file name)
    #[arg(long, value_name = "NAME")]
    output: Option<String>,

    /// Directory for the generated files
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Prefix dated placemark names with [DD.MM]
    #[arg(long)]
    date_prefix: bool,

    /// Configuration file (default: <config dir>/tripkml/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(config: &TripKmlConfig, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cli: &Cli, config: &TripKmlConfig) -> Result<()> {
    info!("Reading {}", cli.input.display());
    let bytes = fs::read(&cli.input)
        .map_err(TripKmlError::from)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let html = String::from_utf8(bytes).map_err(|e| {
        TripKmlError::validation(format!(
            "{} is not UTF-8 encoded ({e}); save the page as UTF-8 and retry",
            cli.input.display()
        ))
    })?;

    let options = ConvertOptions {
        split: cli.split,
        base_name: derive_base_name(&cli.input, cli.output.as_deref()),
        render: RenderOptions {
            date_prefix: cli.date_prefix || config.output.date_prefix,
            indent: config.output.indent,
        },
        extract: ExtractOptions {
            coordinate_precision: config.extraction.coordinate_precision,
        },
    };

    let conversion = convert_document(&html, &options)?;

    let out_dir = cli
        .out_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.directory));
    fs::create_dir_all(&out_dir)
        .map_err(TripKmlError::from)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    for output in &conversion.outputs {
        let path = out_dir.join(&output.file_name);
        fs::write(&path, &output.contents)
            .map_err(TripKmlError::from)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Created: {} ({} placemarks)", path.display(), output.placemarks);
    }

    let report = &conversion.report;
    if report.warnings.is_empty() {
        info!("Done: {}", report.summary());
    } else {
        warn!("Done with warnings: {}", report.summary());
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match TripKmlConfig::load_from_path(cli.config.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::from(2);
        }
    };
    init_logging(&config, cli.verbose);

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            match e.downcast_ref::<TripKmlError>() {
                Some(err) => eprintln!("Error: {}", err.user_message()),
                None => eprintln!("Error: {e}"),
            }
            ExitCode::FAILURE
        }
    }
}
