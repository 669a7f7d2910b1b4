//! Ferrodock — post-docking analysis pipeline.
//! Entry point for the `ferrodock` binary.

mod commands;
mod config;
mod manifest;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ferrodock_molecules::{parse_docking_filename, PostDockingPipeline};
use ferrodock_ranker::PluginRegistry;

#[derive(Parser)]
#[command(name = "ferrodock")]
#[command(about = "Post-processing of molecular docking results", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Debug logging unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and every enabled analysis plugin
    Run {
        /// Directory searched recursively for docking results
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory (defaults to output.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List docking complexes found under a directory
    Complexes {
        #[arg(short, long)]
        input: PathBuf,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
    /// List result directories of a research project
    ResearchDirs {
        /// Research base path (defaults to input.research_base_path)
        #[arg(short, long)]
        base: Option<PathBuf>,
    },
    /// Enrichment analysis on an existing best-poses CSV
    Enrich {
        /// CSV with complex_name, vina_affinity and optionally protein
        #[arg(short, long, value_name = "CSV")]
        poses: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Strong binder threshold in kcal/mol
        #[arg(short, long, allow_hyphen_values = true)]
        threshold: Option<f64>,
    },
    /// Parse a docking output filename stem
    ParseName { stem: String },
    /// List registered analysis plugins
    Plugins,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "ferrodock=debug,info" } else { "ferrodock=info,warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    info!("Ferrodock {}", env!("CARGO_PKG_VERSION"));
    let config = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { input, output } => {
            let pipeline = PostDockingPipeline::new(config);
            let manifest = commands::run_pipeline(&pipeline, input, output)?;
            println!("{}", manifest.display());
            Ok(())
        }
        Commands::Complexes { input, json } => {
            let complexes = commands::list_complexes(&config, &input)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&complexes)?);
                return Ok(());
            }
            for complex in &complexes {
                println!(
                    "{}\t{}\t{} file(s)\t{}",
                    complex.name,
                    complex.info.program,
                    complex.docking_results.len(),
                    complex.directory.display()
                );
            }
            Ok(())
        }
        Commands::ResearchDirs { base } => {
            for dir in commands::research_dirs(&config, base)? {
                println!("{}", dir.display());
            }
            Ok(())
        }
        Commands::Enrich { poses, output, threshold } => {
            let result = commands::enrich(&config, &poses, output, threshold)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Commands::ParseName { stem } => {
            let info = parse_docking_filename(&stem);
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(())
        }
        Commands::Plugins => {
            for plugin in PluginRegistry::with_builtin().list() {
                println!("{:<14} {} v{} - {}", plugin.key, plugin.name, plugin.version, plugin.description);
            }
            Ok(())
        }
    }
}
