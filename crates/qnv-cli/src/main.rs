//! QNV command-line interface.
//!
//! ```text
//! qnv run -c experiment.yaml      evolve and checkpoint a drive protocol
//! qnv sample -n 6                 sample a spin cluster
//! qnv inspect data/qnv.json       list checkpointed runs
//! qnv template -n 4               print a starter configuration
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use qnv_system::FieldDirection;

mod commands;
mod logging;

use commands::{inspect, run, sample, template, version};

/// QNV - driven dynamics of dipolar spin clusters
#[derive(Parser)]
#[command(name = "qnv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a drive protocol described by a YAML configuration
    Run {
        /// Configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Directory for the checkpoint container (overrides the config)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Seed of the noise draws (overrides the config)
        #[arg(long)]
        seed: Option<u64>,

        /// Checkpoint group (overrides the config)
        #[arg(short, long)]
        group: Option<String>,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Sample a spin cluster and print its geometry
    Sample {
        /// Number of spins
        #[arg(short = 'n', long)]
        sites: usize,

        /// Sampling seed
        #[arg(long, default_value = "1")]
        seed: u64,

        /// External field direction (x, y, z)
        #[arg(short, long, default_value = "z")]
        direction: FieldDirection,

        /// Minimum pairwise distance
        #[arg(long, default_value = "0.9")]
        min_dist: f64,

        /// Maximum distance to the nearest earlier spin
        #[arg(long, default_value = "1.1")]
        max_dist: f64,

        /// Output format (json, yaml)
        #[arg(short, long, default_value = "json")]
        format: String,
    },

    /// List the runs stored in a checkpoint container
    Inspect {
        /// Container file
        path: PathBuf,

        /// Only show this group, including its attributes
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Print a starter configuration
    Template {
        /// Number of spins
        #[arg(short = 'n', long, default_value = "4")]
        sites: usize,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    logging::init(cli.verbose, logging::LogFormat::from_env());

    let result = match cli.command {
        Commands::Run {
            config,
            data_dir,
            seed,
            group,
            quiet,
        } => run::execute(&config, data_dir, seed, group, quiet),

        Commands::Sample {
            sites,
            seed,
            direction,
            min_dist,
            max_dist,
            format,
        } => sample::execute(sites, seed, direction, min_dist, max_dist, &format),

        Commands::Inspect { path, group } => inspect::execute(&path, group.as_deref()),

        Commands::Template { sites } => template::execute(sites),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}
