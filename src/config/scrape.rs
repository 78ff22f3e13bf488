//! Scrape run configuration: portal, attempt budget, selection mode, timings.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Published-FIR search page of the Maharashtra Police citizen portal.
pub const DEFAULT_PORTAL_URL: &str = "https://citizen.mahapolice.gov.in/Citizen/MH/PublishedFIRs.aspx";

/// Default attempt budget for the navigate/search/harvest cycle.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// How district and police station options are chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMode {
    /// Select the configured labels exactly.
    #[default]
    Fixed,
    /// Pick any available option (smoke runs).
    Random,
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed => write!(f, "fixed"),
            Self::Random => write!(f, "random"),
        }
    }
}

impl FromStr for SelectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "random" => Ok(Self::Random),
            _ => Err(format!(
                "Invalid selection mode '{}'. Valid options: fixed, random",
                s
            )),
        }
    }
}

/// Scrape run settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrapeConfig {
    /// Search page to load at the start of every attempt.
    #[serde(default = "default_portal_url")]
    pub portal_url: String,

    /// Where the browser saves downloaded documents.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Full navigate/search/harvest cycles before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default)]
    pub selection: SelectionMode,

    /// Local retries of the random dropdown primitive.
    #[serde(default = "default_dropdown_retries")]
    pub dropdown_retries: u32,

    /// Keep the browser open until Enter is pressed after the run.
    #[serde(default = "default_leave_open")]
    pub leave_open: bool,

    #[serde(default)]
    pub timings: Timings,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            portal_url: default_portal_url(),
            download_dir: default_download_dir(),
            max_attempts: default_max_attempts(),
            selection: SelectionMode::default(),
            dropdown_retries: default_dropdown_retries(),
            leave_open: default_leave_open(),
            timings: Timings::default(),
        }
    }
}

fn default_portal_url() -> String {
    DEFAULT_PORTAL_URL.to_string()
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_dropdown_retries() -> u32 {
    3
}

fn default_leave_open() -> bool {
    true
}

/// Fixed delays and wait bounds, in milliseconds.
///
/// The portal exposes no "options changed" or "results ready" signal, so the
/// workflow settles for fixed delays at the points where the page re-renders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Timings {
    /// After loading the search page.
    pub page_load_ms: u64,
    /// After typing the date range.
    pub dates_settle_ms: u64,
    /// After selecting the district, before touching the station control.
    pub district_settle_ms: u64,
    /// Inside police station selection, for the dependent list to repopulate.
    pub station_settle_ms: u64,
    /// After clicking search.
    pub search_settle_ms: u64,
    /// After setting the page size, before harvesting.
    pub results_settle_ms: u64,
    /// After clicking a download control, before diffing tabs.
    pub click_settle_ms: u64,
    /// After switching to a new tab, before inspecting it.
    pub tab_load_ms: u64,
    /// After reloading a degenerate dropdown.
    pub reload_cooldown_ms: u64,
    /// Between local retries of a stale dropdown.
    pub stale_backoff_ms: u64,
    /// After a failed attempt.
    pub attempt_cooldown_ms: u64,
    /// Bound for waiting on a control.
    pub element_timeout_ms: u64,
    /// Bound for probing whether the results table exists.
    pub exists_timeout_ms: u64,
    /// Poll interval of every bounded wait.
    pub poll_interval_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            page_load_ms: 2_000,
            dates_settle_ms: 2_000,
            district_settle_ms: 3_000,
            station_settle_ms: 2_000,
            search_settle_ms: 5_000,
            results_settle_ms: 5_000,
            click_settle_ms: 2_000,
            tab_load_ms: 2_000,
            reload_cooldown_ms: 3_000,
            stale_backoff_ms: 1_000,
            attempt_cooldown_ms: 2_000,
            element_timeout_ms: 10_000,
            exists_timeout_ms: 5_000,
            poll_interval_ms: 250,
        }
    }
}

impl Timings {
    /// No delays and single-probe waits.
    pub fn immediate() -> Self {
        Self {
            page_load_ms: 0,
            dates_settle_ms: 0,
            district_settle_ms: 0,
            station_settle_ms: 0,
            search_settle_ms: 0,
            results_settle_ms: 0,
            click_settle_ms: 0,
            tab_load_ms: 0,
            reload_cooldown_ms: 0,
            stale_backoff_ms: 0,
            attempt_cooldown_ms: 0,
            element_timeout_ms: 0,
            exists_timeout_ms: 0,
            poll_interval_ms: 0,
        }
    }

    pub fn page_load(&self) -> Duration {
        Duration::from_millis(self.page_load_ms)
    }

    pub fn dates_settle(&self) -> Duration {
        Duration::from_millis(self.dates_settle_ms)
    }

    pub fn district_settle(&self) -> Duration {
        Duration::from_millis(self.district_settle_ms)
    }

    pub fn station_settle(&self) -> Duration {
        Duration::from_millis(self.station_settle_ms)
    }

    pub fn search_settle(&self) -> Duration {
        Duration::from_millis(self.search_settle_ms)
    }

    pub fn results_settle(&self) -> Duration {
        Duration::from_millis(self.results_settle_ms)
    }

    pub fn click_settle(&self) -> Duration {
        Duration::from_millis(self.click_settle_ms)
    }

    pub fn tab_load(&self) -> Duration {
        Duration::from_millis(self.tab_load_ms)
    }

    pub fn reload_cooldown(&self) -> Duration {
        Duration::from_millis(self.reload_cooldown_ms)
    }

    pub fn stale_backoff(&self) -> Duration {
        Duration::from_millis(self.stale_backoff_ms)
    }

    pub fn attempt_cooldown(&self) -> Duration {
        Duration::from_millis(self.attempt_cooldown_ms)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    pub fn exists_timeout(&self) -> Duration {
        Duration::from_millis(self.exists_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
