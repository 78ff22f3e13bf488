//! Portal scrape command.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use console::style;
use tokio::io::AsyncBufReadExt;

use crate::browser::ChromeSession;
use crate::config::{Config, SelectionMode};
use crate::portal::{RetryOrchestrator, RunOutcome};

/// Flags that override the `[search]`, `[scrape]` and `[browser]` config.
#[derive(Debug, Default, Args)]
pub struct ScrapeArgs {
    /// Registration date from, typed into the form as given (e.g. 01/02/2025)
    #[arg(long, env = "FIRHARVEST_DATE_FROM")]
    pub date_from: Option<String>,

    /// Registration date to, typed into the form as given
    #[arg(long, env = "FIRHARVEST_DATE_TO")]
    pub date_to: Option<String>,

    /// District label, exactly as shown in the dropdown
    #[arg(long, env = "FIRHARVEST_DISTRICT")]
    pub district: Option<String>,

    /// Police station label, exactly as shown in the dropdown
    #[arg(long, env = "FIRHARVEST_POLICE_STATION")]
    pub police_station: Option<String>,

    /// Results per page
    #[arg(long, env = "FIRHARVEST_PAGE_SIZE")]
    pub page_size: Option<u32>,

    /// Directory the browser saves PDFs into
    #[arg(short, long, env = "FIRHARVEST_DOWNLOAD_DIR")]
    pub download_dir: Option<PathBuf>,

    /// Full navigate/search/harvest cycles before giving up
    #[arg(short, long, env = "FIRHARVEST_MAX_ATTEMPTS")]
    pub max_attempts: Option<u32>,

    /// How district and police station are chosen
    #[arg(long, value_enum, env = "FIRHARVEST_SELECTION")]
    pub selection: Option<SelectionMode>,

    /// Portal search page URL
    #[arg(long, env = "FIRHARVEST_PORTAL_URL")]
    pub url: Option<String>,

    /// Run Chrome without a window
    #[arg(long, env = "FIRHARVEST_HEADLESS")]
    pub headless: bool,

    /// Close the browser as soon as the run ends
    #[arg(long, env = "FIRHARVEST_CLOSE_ON_EXIT")]
    pub close_on_exit: bool,
}

impl ScrapeArgs {
    /// Apply the given flags on top of `config`.
    pub fn apply(&self, config: &mut Config) {
        let search = &mut config.search;
        if let Some(ref v) = self.date_from {
            search.date_from = v.clone();
        }
        if let Some(ref v) = self.date_to {
            search.date_to = v.clone();
        }
        if let Some(ref v) = self.district {
            search.district = v.clone();
        }
        if let Some(ref v) = self.police_station {
            search.police_station = v.clone();
        }
        if let Some(v) = self.page_size {
            search.page_size = v;
        }

        let scrape = &mut config.scrape;
        if let Some(ref v) = self.download_dir {
            scrape.download_dir = v.clone();
        }
        if let Some(v) = self.max_attempts {
            scrape.max_attempts = v;
        }
        if let Some(v) = self.selection {
            scrape.selection = v;
        }
        if let Some(ref v) = self.url {
            scrape.portal_url = v.clone();
        }
        if self.close_on_exit {
            scrape.leave_open = false;
        }

        if self.headless {
            config.browser.headless = true;
        }
    }
}

/// Search the portal, print what was found and trigger downloads.
pub async fn cmd_scrape(mut config: Config, args: &ScrapeArgs) -> anyhow::Result<()> {
    args.apply(&mut config);

    let search = &config.search;
    match config.scrape.selection {
        SelectionMode::Fixed => println!(
            "{} Searching {} / {} ({} to {})",
            style("→").cyan(),
            search.district,
            search.police_station,
            search.date_from,
            search.date_to
        ),
        SelectionMode::Random => println!(
            "{} Searching a random district / police station ({} to {})",
            style("→").cyan(),
            search.date_from,
            search.date_to
        ),
    }
    println!(
        "  {} Downloads: {}",
        style("→").dim(),
        config.scrape.download_dir.display()
    );

    let session = ChromeSession::launch(&config.browser, &config.scrape.download_dir)
        .await
        .context("Failed to start browser")?;

    let mut orchestrator =
        RetryOrchestrator::new(session, config.search.clone(), config.scrape.clone());
    let outcome = orchestrator.run().await;
    print_outcome(&outcome);

    let session = orchestrator.into_browser();
    if config.scrape.leave_open && !config.browser.headless {
        println!(
            "\n{} Browser left open. Press Enter to close it...",
            style("!").yellow()
        );
        let mut line = String::new();
        let mut stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let _ = stdin.read_line(&mut line).await;
    }
    session.close().await;

    Ok(())
}

fn print_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Success { attempt, report } => {
            if !report.rows.is_empty() {
                println!();
                for row in &report.rows {
                    println!("{}", row);
                }
            }
            println!(
                "\n{} Search successful on attempt {}",
                style("✓").green(),
                attempt
            );
            println!(
                "  {} {} FIRs listed, {} download controls ({} clicked)",
                style("→").dim(),
                report.rows.len(),
                report.downloads_matched,
                report.downloads_activated
            );
            if report.tabs_opened > 0 {
                println!(
                    "  {} {} tabs opened, {} with PDF content",
                    style("→").dim(),
                    report.tabs_opened,
                    report.pdf_tabs
                );
            }
        }
        RunOutcome::Exhausted { attempts, failures } => {
            println!(
                "\n{} No results after {} attempts",
                style("✗").red(),
                attempts
            );
            for (i, failure) in failures.iter().enumerate() {
                println!("  {} Attempt {}: {}", style("→").dim(), i + 1, failure);
            }
        }
    }
}
