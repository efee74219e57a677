//! Rally CLI
//!
//! Shot table CSV → tempo tables, phase JSON, full match analysis

#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "rally_cli")]
#[command(about = "Rally tempo and tactical phase analysis", long_about = None, version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct CommonOpts {
    /// Analysis config (YAML, or JSON with a .json extension)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Shot category table JSON ({"shot_categories": {...}})
    #[arg(long)]
    categories: Option<PathBuf>,

    /// Video frame rate; overrides the config file
    #[arg(long)]
    fps: Option<f64>,

    /// Output path prefix (default: input path without extension)
    #[arg(long)]
    out_prefix: Option<PathBuf>,

    /// Keep rows whose Stroke does not look like a stroke label
    #[arg(long, default_value = "false")]
    no_stroke_filter: bool,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Classify response times; write events, rally summary, baselines and thresholds
    Tempo {
        /// Input shot table CSV
        input: PathBuf,

        #[command(flatten)]
        opts: CommonOpts,
    },

    /// Segment every rally into tactical phases
    Phases {
        /// Input shot table CSV
        input: PathBuf,

        #[command(flatten)]
        opts: CommonOpts,
    },

    /// Full match analysis for one or more matches
    Analyze {
        /// Input shot table CSVs
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        opts: CommonOpts,

        /// Output run metadata JSON file
        #[arg(long)]
        metadata: Option<PathBuf>,
    },
}

#[cfg(feature = "cli")]
fn run_options(opts: CommonOpts) -> Result<rally_cli::RunOptions> {
    let mut config = match &opts.config {
        Some(path) => rally_cli::load_config(path)?,
        None => rally_core::AnalysisConfig::default(),
    };
    if let Some(fps) = opts.fps {
        config = config.with_fps(fps);
    }
    let bucketer = match &opts.categories {
        Some(path) => rally_cli::Bucketer::Table(rally_cli::load_categories(path)?),
        None => rally_cli::Bucketer::default(),
    };
    Ok(rally_cli::RunOptions {
        config,
        bucketer,
        ingest: rally_cli::IngestOptions {
            filter_strokes: !opts.no_stroke_filter,
        },
        out_prefix: opts.out_prefix,
    })
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Tempo { input, opts } => {
            let options = run_options(opts)?;
            println!("Tempo analysis: {}", input.display());
            for out in rally_cli::run_tempo(&input, &options)? {
                print_output(&out);
            }
        }

        Commands::Phases { input, opts } => {
            let options = run_options(opts)?;
            println!("Phase segmentation: {}", input.display());
            let out = rally_cli::run_phases(&input, &options)?;
            print_output(&out);
        }

        Commands::Analyze {
            inputs,
            opts,
            metadata,
        } => {
            let options = run_options(opts)?;
            println!("Analyzing {} match(es)...", inputs.len());
            let meta = rally_cli::run_analyze(&inputs, &options)?;
            for m in &meta.matches {
                println!(
                    "   {} → {} shots, {} rallies, {} rows skipped",
                    m.input.display(),
                    m.shot_count,
                    m.rally_count,
                    m.rows_skipped
                );
                print_output(&m.output);
            }
            if let Some(path) = metadata {
                save_metadata(&path, &meta)?;
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn print_output(out: &rally_cli::OutputFile) {
    println!("   {}  sha256:{}", out.path.display(), out.checksum);
}

#[cfg(feature = "cli")]
fn save_metadata(path: &std::path::Path, meta: &rally_cli::RunMetadata) -> Result<()> {
    let checksum = rally_cli::output::write_json(path, meta)?;
    println!("\nMetadata saved to: {} (sha256:{})", path.display(), checksum);
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("rally_cli is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
