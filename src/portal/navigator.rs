//! Search form interaction.
//!
//! Every method looks its control up again right before using it. The
//! district and police-station lists post back on change, so any handle
//! held across a selection is likely stale.

use rand::Rng;
use tracing::{debug, info, warn};

use super::ids;
use super::page_size_link_xpath;
use super::types::{DropdownState, SearchCriteria};
use crate::browser::wait::{wait_for_clickable, wait_for_element, WaitPolicy};
use crate::browser::{Browser, BrowserError, Locator};
use crate::config::Timings;

/// Which mechanism, if any, changed the results page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSizeOutcome {
    /// The page-size select took the value.
    Selector,
    /// The pager link was clicked.
    Link,
    /// Neither worked; the portal's default page size stays.
    Default,
}

pub struct FormNavigator<'a, B: Browser> {
    browser: &'a mut B,
    timings: &'a Timings,
}

impl<'a, B: Browser> FormNavigator<'a, B> {
    pub fn new(browser: &'a mut B, timings: &'a Timings) -> Self {
        Self { browser, timings }
    }

    fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::new(self.timings.element_timeout(), self.timings.poll_interval())
    }

    /// Type both registration dates as literal text.
    pub async fn enter_date_range(&mut self, criteria: &SearchCriteria) -> Result<(), BrowserError> {
        info!("Entering date range {} - {}", criteria.date_from, criteria.date_to);
        self.fill_text(ids::DATE_FROM, &criteria.date_from).await?;
        self.fill_text(ids::DATE_TO, &criteria.date_to).await?;
        Ok(())
    }

    async fn fill_text(&self, control_id: &str, text: &str) -> Result<(), BrowserError> {
        let field = wait_for_element(&*self.browser, &Locator::id(control_id), self.wait_policy()).await?;
        self.browser.clear(&field).await?;
        self.browser.type_text(&field, text).await
    }

    /// Select the district labelled `name`. `false` if it could not be selected.
    pub async fn select_district(&mut self, name: &str) -> bool {
        match self.select_label(ids::DISTRICT, name).await {
            Ok(()) => {
                info!("Selected district: {}", name);
                true
            }
            Err(e) => {
                warn!("Error selecting district {}: {}", name, e);
                false
            }
        }
    }

    /// Select the police station labelled `name` once the list has had time
    /// to repopulate. `false` if it could not be selected.
    pub async fn select_police_station(&mut self, name: &str) -> bool {
        tokio::time::sleep(self.timings.station_settle()).await;
        match self.select_label(ids::POLICE_STATION, name).await {
            Ok(()) => {
                info!("Selected police station: {}", name);
                true
            }
            Err(e) => {
                warn!("Error selecting police station {}: {}", name, e);
                false
            }
        }
    }

    async fn select_label(&self, control_id: &str, label: &str) -> Result<(), BrowserError> {
        let control =
            wait_for_clickable(&*self.browser, &Locator::id(control_id), self.wait_policy()).await?;
        self.browser.select_by_label(&control, label).await
    }

    /// Click the search button. Whether results appeared is the harvester's
    /// business.
    pub async fn submit_search(&mut self) -> Result<(), BrowserError> {
        info!("Clicking search button");
        let button = wait_for_clickable(
            &*self.browser,
            &Locator::id(ids::SEARCH_BUTTON),
            self.wait_policy(),
        )
        .await?;
        self.browser.click(&button).await
    }

    /// Best effort: the page-size select first, then the pager link.
    pub async fn set_page_size(&mut self, size: u32) -> PageSizeOutcome {
        info!("Setting records per page to {}", size);

        match self.select_page_size(size).await {
            Ok(()) => {
                info!("Set page size to {} with the selector", size);
                return PageSizeOutcome::Selector;
            }
            Err(e) => warn!("Could not set records per page: {}", e),
        }

        match self.click_page_size_link(size).await {
            Ok(()) => {
                info!("Clicked on '{}' records link", size);
                PageSizeOutcome::Link
            }
            Err(e) => {
                warn!("Could not find records per page selector: {}", e);
                PageSizeOutcome::Default
            }
        }
    }

    async fn select_page_size(&self, size: u32) -> Result<(), BrowserError> {
        let control = self.browser.find_element(&Locator::id(ids::PAGE_SIZE)).await?;
        self.browser.select_by_value(&control, &size.to_string()).await
    }

    async fn click_page_size_link(&self, size: u32) -> Result<(), BrowserError> {
        let link = self
            .browser
            .find_element(&Locator::xpath(page_size_link_xpath(size)))
            .await?;
        self.browser.click(&link).await
    }

    /// Pick a random option of `control_id` and select it.
    ///
    /// An option set with nothing real to pick triggers a page reload and
    /// another try; nothing is selected from it. Stale handles and other
    /// errors back off and try again. Returns the selected label, or `None`
    /// once `max_retries` tries are used up.
    pub async fn select_from_dropdown(
        &mut self,
        control_id: &str,
        skip_first: bool,
        max_retries: u32,
    ) -> Option<String> {
        for attempt in 1..=max_retries {
            match self.pick_random_option(control_id, skip_first).await {
                Ok(label) => {
                    info!("Selected '{}' from {}", label, control_id);
                    return Some(label);
                }
                Err(BrowserError::DegenerateOptionSet(_)) => {
                    warn!("Dropdown {} has no valid options. Reloading page...", control_id);
                    if let Err(e) = self.browser.reload().await {
                        warn!("Reload failed: {}", e);
                    }
                    tokio::time::sleep(self.timings.reload_cooldown()).await;
                }
                Err(e) if e.is_stale() => {
                    warn!(
                        "Stale element in {}, retrying... (attempt {}/{})",
                        control_id, attempt, max_retries
                    );
                    tokio::time::sleep(self.timings.stale_backoff()).await;
                }
                Err(e) => {
                    warn!("Error selecting from {}: {}", control_id, e);
                    tokio::time::sleep(self.timings.stale_backoff()).await;
                }
            }
        }
        None
    }

    async fn pick_random_option(&self, control_id: &str, skip_first: bool) -> Result<String, BrowserError> {
        let locator = Locator::id(control_id);
        let control = wait_for_clickable(&*self.browser, &locator, self.wait_policy()).await?;
        let state = DropdownState::new(control_id, self.browser.select_options(&control).await?);
        debug!("{} has {} options", state.control_id, state.options.len());

        let eligible = state.eligible(skip_first);
        if state.is_degenerate() || eligible.is_empty() {
            return Err(BrowserError::DegenerateOptionSet(state.control_id));
        }
        let label = eligible[rand::rng().random_range(0..eligible.len())].label.clone();

        let control = wait_for_clickable(&*self.browser, &locator, self.wait_policy()).await?;
        self.browser.select_by_label(&control, &label).await?;
        Ok(label)
    }
}
