//! placescrub CLI: anonymize location history into a shareable map layer.
//!
//! Usage:
//!   placescrub run <INPUT> <OUTPUT> [STORIES]   Run the full pipeline
//!   placescrub anonymize <INPUT> <OUTPUT>       Write an anonymized timeline tree
//!   placescrub match <TIMESTAMP> <TREE>         Locate a timestamp on a timeline tree
//!   placescrub filter <COLLECTION> <OUTPUT>     Keyword-filter a feature collection
//!   placescrub validate <INPUT>                 Summarize how much history an export holds

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use placescrub_common::config::AppConfig;

mod commands;
mod prompt;

#[derive(Parser)]
#[command(
    name = "placescrub",
    about = "Anonymize location history and map it together with stories",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Anonymize, match stories, and write the GeoJSON feature collection
    Run(commands::run::RunArgs),

    /// Only anonymize a timeline tree
    Anonymize {
        /// Directory holding the year folders of the export
        input: PathBuf,

        /// Output directory
        output: PathBuf,

        /// Fixed noise in E7 units instead of a random draw
        #[arg(long, value_parser = commands::parse_noise)]
        noise: Option<i64>,
    },

    /// Find the location a timestamp falls on
    Match {
        /// Timestamp (epoch seconds, RFC 3339, or EXIF style)
        timestamp: String,

        /// Directory holding the year folders of the export
        tree: PathBuf,

        /// Hours added to both ends of every interval
        #[arg(long, value_parser = commands::parse_buffer_hours)]
        buffer_hours: Option<f64>,

        /// Search every file and keep the closest match
        #[arg(long)]
        closest_across_tree: bool,
    },

    /// Keep only features whose name contains a keyword
    Filter {
        /// GeoJSON feature collection to read
        collection: PathBuf,

        /// File to write the filtered collection to
        output: PathBuf,

        /// Keywords (defaults from config when omitted)
        keywords: Vec<String>,
    },

    /// Report how many months and places an export covers
    Validate {
        /// Directory holding the year folders of the export
        input: PathBuf,

        /// Print the statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    placescrub_common::logging::init_logging(&logging);
    tracing::debug!(
        "Using config file {}",
        placescrub_common::config::config_file_path().display()
    );

    match cli.command {
        Commands::Run(args) => commands::run::run(args, &config),
        Commands::Anonymize {
            input,
            output,
            noise,
        } => commands::anonymize::run(input, output, noise, &config),
        Commands::Match {
            timestamp,
            tree,
            buffer_hours,
            closest_across_tree,
        } => commands::match_time::run(
            timestamp,
            tree,
            buffer_hours,
            closest_across_tree,
            &config,
        ),
        Commands::Filter {
            collection,
            output,
            keywords,
        } => commands::filter::run(collection, output, keywords, &config),
        Commands::Validate { input, json } => commands::validate::run(input, json, &config),
    }
}
