use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fluorquant::models::config::{ConfigOverrides, DEFAULT_CONFIG_YAML};
use fluorquant::models::{AnalysisConfig, Wavelength};
use fluorquant::services::{run_batch, run_single, RunSummary};
use intensity_quant::ThresholdMethod;

#[derive(Parser)]
#[command(name = "fluorquant")]
#[command(about = "Background-tracking fluorescence quantification for microscopy time series")]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Quantify a project directory (batch) or a single stack directory
    Analyze {
        /// Project directory, or stack directory with --single
        path: PathBuf,

        /// YAML configuration file (falls back to $FLUORQUANT_CONFIG)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Treat PATH as a project of positions
        #[arg(long, conflicts_with = "single")]
        batch: bool,

        /// Treat PATH as one <position>/<wavelength> stack directory
        #[arg(long)]
        single: bool,

        /// First file of each image sequence to load (1-based)
        #[arg(long)]
        start_slice: Option<u32>,

        /// Maximum number of files loaded per stack
        #[arg(long)]
        max_slices: Option<u32>,

        /// MaxEntropy, Default, Huang or RenyiEntropy
        #[arg(short, long)]
        threshold_method: Option<ThresholdMethod>,

        /// Wavelength channel, WL0 - WL5
        #[arg(short, long)]
        wavelength: Option<Wavelength>,

        /// Foreground coverage (percent) at which the background freezes
        #[arg(short, long)]
        area_threshold: Option<f64>,

        /// Write per-slice background regions under intermediates/
        #[arg(long)]
        save_intermediates: bool,

        /// Stacks analyzed concurrently
        #[arg(short, long)]
        jobs: Option<usize>,
    },
    /// Write a commented default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "fluorquant.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Analyze {
            path,
            config,
            batch,
            single,
            start_slice,
            max_slices,
            threshold_method,
            wavelength,
            area_threshold,
            save_intermediates,
            jobs,
        }) => {
            let overrides = ConfigOverrides {
                start_slice,
                max_slices,
                threshold_method,
                wavelength,
                area_threshold_percent: area_threshold,
                batch: if batch {
                    Some(true)
                } else if single {
                    Some(false)
                } else {
                    None
                },
                save_intermediates: save_intermediates.then_some(true),
                jobs,
            };
            run_analyze_command(&path, config, &overrides).await
        }
        Some(Commands::Init { output, force }) => run_init_command(&output, force),
        None => {
            run_status_command();
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "fluorquant=info,intensity_quant=info",
        1 => "fluorquant=debug,intensity_quant=debug",
        _ => "fluorquant=trace,intensity_quant=trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run_analyze_command(
    path: &Path,
    config_path: Option<PathBuf>,
    overrides: &ConfigOverrides,
) -> anyhow::Result<()> {
    let config_path =
        config_path.or_else(|| std::env::var("FLUORQUANT_CONFIG").ok().map(PathBuf::from));
    let config = AnalysisConfig::load(config_path.as_deref())?.with_overrides(overrides)?;

    tracing::info!(
        path = %path.display(),
        batch = config.batch,
        threshold_method = %config.threshold_method,
        wavelength = %config.wavelength,
        area_threshold = config.area_threshold_percent,
        "Starting analysis"
    );

    let summary = if config.batch {
        run_batch(Arc::new(config), path).await?
    } else {
        run_single(&config, path)?
    };

    print_summary(&summary);
    if !summary.is_success() {
        anyhow::bail!(
            "{} of {} stacks failed",
            summary.failures.len(),
            summary.failures.len() + summary.stacks_completed
        );
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "Wrote {} rows for {} stacks to {}",
        summary.rows_written,
        summary.stacks_completed,
        summary.results_path.display()
    );
    if !summary.failures.is_empty() {
        println!("\nFailed stacks:");
        for (location, error) in &summary.failures {
            println!("  - {}/{}: {}", location.position, location.wavelength, error);
        }
    }
}

fn run_init_command(output: &Path, force: bool) -> anyhow::Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }
    std::fs::write(output, DEFAULT_CONFIG_YAML)?;
    println!("Wrote default configuration to {}", output.display());
    Ok(())
}

/// Display version and supported settings
fn run_status_command() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    println!("fluorquant v{VERSION}");
    println!("Background-tracking fluorescence quantification\n");

    println!(
        "  FLUORQUANT_CONFIG = {}",
        std::env::var("FLUORQUANT_CONFIG")
            .as_deref()
            .unwrap_or("(not set)")
    );

    let methods: Vec<&str> = ThresholdMethod::ALL.iter().map(|m| m.as_str()).collect();
    let channels: Vec<&str> = Wavelength::ALL.iter().map(|w| w.as_str()).collect();
    println!("\nThreshold methods: {}", methods.join(", "));
    println!("Wavelengths:       {}", channels.join(", "));

    println!("\nRun 'fluorquant init' to write a default configuration,");
    println!("then 'fluorquant analyze <project>' to quantify every position.");
}
