//! CLI parser and dispatch to command-specific modules.

mod check;
mod config_cmd;
mod extract;
mod scrape;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

pub use scrape::ScrapeArgs;

#[derive(Parser)]
#[command(name = "firharvest")]
#[command(about = "Published FIR retrieval and OCR span extraction")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true, env = "FIRHARVEST_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Search the portal and download the FIRs it lists
    Scrape(ScrapeArgs),

    /// Extract the text between two phrases from a scanned FIR PDF
    Extract {
        /// PDF file to OCR
        pdf: PathBuf,
        /// Phrase that starts the span (kept in the output)
        #[arg(long)]
        start: Option<String>,
        /// Phrase that ends the span (not included)
        #[arg(long)]
        end: Option<String>,
        /// Tesseract language models, e.g. mar+eng
        #[arg(short, long)]
        lang: Option<String>,
        /// Rendering resolution for page images
        #[arg(long)]
        dpi: Option<u32>,
    },

    /// Check if Chrome and the OCR tools are installed
    Check,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Show the config file in use and the one discovered
    Path,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Scrape(args) => scrape::cmd_scrape(config, &args).await,
        Commands::Extract {
            pdf,
            start,
            end,
            lang,
            dpi,
        } => extract::cmd_extract(&config, pdf, start, end, lang, dpi).await,
        Commands::Check => check::cmd_check(&config).await,
        Commands::Config { command } => match command {
            ConfigCommands::Show => config_cmd::cmd_config_show(&config),
            ConfigCommands::Path => config_cmd::cmd_config_path(&config).await,
        },
    }
}
