//! Whole-sequence retries.
//!
//! The district and police-station lists depend on each other through
//! postbacks, so a failed step is never retried on its own. Every failure
//! starts over from a fresh page load and costs one attempt.

use thiserror::Error;
use tracing::{info, warn};

use super::harvester::ResultHarvester;
use super::ids;
use super::navigator::FormNavigator;
use super::types::{HarvestReport, SearchCriteria};
use crate::browser::{Browser, BrowserError};
use crate::config::{ScrapeConfig, SelectionMode};

/// Why one attempt did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptFailure {
    #[error("could not select district")]
    DistrictNotSelected,

    #[error("could not select police station")]
    PoliceStationNotSelected,

    #[error("no results or download buttons found")]
    NoResultsOrDownloads,

    #[error("{0}")]
    Error(String),
}

impl From<BrowserError> for AttemptFailure {
    fn from(e: BrowserError) -> Self {
        AttemptFailure::Error(e.to_string())
    }
}

/// Attempt counter for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptState {
    /// 1-based index of the attempt in progress; 0 before the first.
    pub attempt_index: u32,
    pub max_attempts: u32,
    pub succeeded: bool,
}

impl AttemptState {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempt_index: 0,
            max_attempts,
            succeeded: false,
        }
    }

    /// Start the next attempt, if any budget is left.
    pub fn advance(&mut self) -> bool {
        if self.succeeded || self.attempt_index >= self.max_attempts {
            return false;
        }
        self.attempt_index += 1;
        true
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success {
        attempt: u32,
        report: HarvestReport,
    },
    Exhausted {
        attempts: u32,
        failures: Vec<AttemptFailure>,
    },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success { .. })
    }
}

/// Runs navigate, fill, select, submit, page size and harvest until the
/// harvester finds something or the attempt budget is spent.
pub struct RetryOrchestrator<B: Browser> {
    browser: B,
    criteria: SearchCriteria,
    config: ScrapeConfig,
}

impl<B: Browser> RetryOrchestrator<B> {
    pub fn new(browser: B, criteria: SearchCriteria, config: ScrapeConfig) -> Self {
        Self {
            browser,
            criteria,
            config,
        }
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    /// Hand the session back, e.g. to keep it open for inspection.
    pub fn into_browser(self) -> B {
        self.browser
    }

    /// Run attempts until success or exhaustion. Never fails: errors inside
    /// an attempt are recorded as that attempt's failure.
    pub async fn run(&mut self) -> RunOutcome {
        let mut state = AttemptState::new(self.config.max_attempts);
        let mut failures = Vec::new();

        while state.advance() {
            info!(
                "==== Starting attempt {}/{} ====",
                state.attempt_index, state.max_attempts
            );

            match self.attempt().await {
                Ok(report) => {
                    state.succeeded = true;
                    info!(
                        "Search successful on attempt {}: {} rows, {} download controls",
                        state.attempt_index,
                        report.rows.len(),
                        report.downloads_matched
                    );
                    return RunOutcome::Success {
                        attempt: state.attempt_index,
                        report,
                    };
                }
                Err(AttemptFailure::Error(e)) => {
                    warn!("Error during attempt {}: {}", state.attempt_index, e);
                    failures.push(AttemptFailure::Error(e));
                    tokio::time::sleep(self.config.timings.attempt_cooldown()).await;
                }
                Err(failure) => {
                    warn!(
                        "Attempt {}/{} failed: {}, retrying from a fresh page",
                        state.attempt_index, state.max_attempts, failure
                    );
                    failures.push(failure);
                }
            }
        }

        warn!("All {} attempts failed", state.attempt_index);
        RunOutcome::Exhausted {
            attempts: state.attempt_index,
            failures,
        }
    }

    async fn attempt(&mut self) -> Result<HarvestReport, AttemptFailure> {
        let timings = &self.config.timings;

        self.browser.navigate(&self.config.portal_url).await?;
        tokio::time::sleep(timings.page_load()).await;

        let mut navigator = FormNavigator::new(&mut self.browser, timings);
        navigator.enter_date_range(&self.criteria).await?;
        tokio::time::sleep(timings.dates_settle()).await;

        match self.config.selection {
            SelectionMode::Fixed => {
                if !navigator.select_district(&self.criteria.district).await {
                    return Err(AttemptFailure::DistrictNotSelected);
                }
                tokio::time::sleep(timings.district_settle()).await;
                if !navigator
                    .select_police_station(&self.criteria.police_station)
                    .await
                {
                    return Err(AttemptFailure::PoliceStationNotSelected);
                }
            }
            SelectionMode::Random => {
                let retries = self.config.dropdown_retries;
                if navigator
                    .select_from_dropdown(ids::DISTRICT, true, retries)
                    .await
                    .is_none()
                {
                    return Err(AttemptFailure::DistrictNotSelected);
                }
                tokio::time::sleep(timings.district_settle()).await;
                tokio::time::sleep(timings.station_settle()).await;
                if navigator
                    .select_from_dropdown(ids::POLICE_STATION, true, retries)
                    .await
                    .is_none()
                {
                    return Err(AttemptFailure::PoliceStationNotSelected);
                }
            }
        }

        navigator.submit_search().await?;
        tokio::time::sleep(timings.search_settle()).await;

        navigator.set_page_size(self.criteria.page_size).await;
        info!("Waiting for results or download buttons");
        tokio::time::sleep(timings.results_settle()).await;

        let report = ResultHarvester::new(&mut self.browser, timings, &self.config.download_dir)
            .harvest()
            .await?;

        if report.found_anything() {
            Ok(report)
        } else {
            Err(AttemptFailure::NoResultsOrDownloads)
        }
    }
}
