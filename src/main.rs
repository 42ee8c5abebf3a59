//! Retail Insights - performance analytics for retail chains
//!
//! Loads a (store, month) retail table, prints a fixed sequence of
//! financial, category, regional, time-series, operational and statistical
//! reports, renders summary charts and closes with an executive summary.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (missing file, schema error, failed analysis step)

mod analysis;
mod charts;
mod cli;
mod config;
mod error;
mod loader;
mod models;
mod pipeline;
mod report;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    init_logging(&args);

    info!("Retail Insights v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args) {
        error!("Analysis failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Handle --init-config: generate a default configuration file.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to change the data file, thresholds and chart size.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete report sequence.
fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    let data_file = config.general.data_file.clone();
    println!("📥 Loading data: {}", data_file.display());
    let dataset = loader::load_dataset(&data_file).context("Data loading failed")?;
    println!("   {} records loaded", dataset.len());

    let report = pipeline::build_report(&dataset, &config, &data_file.display().to_string())?;

    report::print_analysis_sections(&report);

    if config.charts.enabled {
        println!("\n🎨 Rendering charts...");
        let written = charts::render_all(
            &report,
            &config.general.output_dir,
            &config.charts,
            !args.quiet,
        )
        .context("Visualizations failed")?;
        for path in &written {
            println!("   📄 {}", path.display());
        }
    } else {
        info!("Chart rendering disabled");
    }

    report::print_executive_summary(&report.summary);

    if let Some(ref export_path) = args.export {
        report::write_export(&report, export_path, args.format)?;
        println!("\n📝 Report saved to: {}", export_path.display());
    }

    println!(
        "\n✅ Analysis complete in {:.1}s",
        report.metadata.duration_seconds
    );
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
